//! Editor data model for Tabula.
//!
//! - [`Workspace`]: owns the files and the column/tab layout
//! - [`FileTab`] / [`Column`]: open files and the blocks parsed from them
//! - [`FileStore`]: where files are loaded from and saved to
//! - [`ChatSession`]: the conversation that selected blocks feed into

pub mod file;
pub mod session;
pub mod store;
pub mod tab;
pub mod workspace;

pub use file::{File, FileState};
pub use session::{BlockInvocation, ChatSession, SessionSettings};
pub use store::{DirStore, FileStore, MemoryStore};
pub use tab::{Column, FileTab};
pub use workspace::Workspace;
