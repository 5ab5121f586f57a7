//! Line Assembly module
//!
//! Turns the scattered boxes of a page into ordered text rows. All geometric
//! thresholds derive from [`LayoutParams`]: the vertical clustering band is
//! half a line pitch, and horizontal gaps and indentation are measured in
//! character heights (two spaces per character).

mod assembler;
mod types;

pub use assembler::LineAssembler;
pub use types::{
    LayoutError, LayoutParams, LayoutProfile, PageRows, Result, Row, COMPACT_CHAR_HEIGHT,
    DEFAULT_CHAR_HEIGHT, DEFAULT_DPI, DEFAULT_LINE_HEIGHT_MULTIPLIER, SPACES_PER_CHAR,
};
