//! Template engine for Tabula.
//!
//! Files are split into blocks (a header line plus a body), block bodies name
//! their inputs with `{{placeholder}}` tokens, and placeholders are bound to
//! other workspace files by file stem:
//! - [`parse_blocks`] turns file content into blocks
//! - [`resolve`] binds placeholder names to file contents
//! - [`fill_placeholders`] and [`render_reference_context`] produce message text

pub mod parser;
pub mod render;
pub mod resolver;
pub mod types;

pub use parser::{extract_parameters, parse_blocks};
pub use render::{fill_placeholders, render_reference_context, REFERENCE_SEPARATOR};
pub use resolver::{file_stem, resolve};
pub use types::{Block, Resolution};
