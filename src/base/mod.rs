//! Foundation types shared by the tree and diagnostics layers.
//!
//! - [`Point`] - zero-based row/column positions
//! - [`LineIndex`] - byte offset to [`Point`] conversion
//! - [`TextRange`], [`TextSize`] - byte ranges, re-exported from `text-size`
//!
//! This module has no dependencies on other modules of the crate.

mod position;

pub use position::{LineIndex, Point};
pub use text_size::{TextRange, TextSize};
