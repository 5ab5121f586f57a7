//! Markdown Rendering module
//!
//! Turns assembled rows into Markdown:
//!
//! - Heading detection by table of contents, question patterns, relative
//!   row height bands, an absolute height threshold and centered short lines
//! - Body rows emitted one line each, indentation kept
//! - Merging of per-page Markdown files into one book

mod heading;
pub mod merge;
mod renderer;
mod types;

// Re-export public API
pub use heading::{HeadingClassifier, TableOfContents, TocEntry};
pub use merge::{MarkdownMerger, MergeOptions, MergeSortOrder};
pub use renderer::MarkdownRenderer;
pub use types::{
    default_size_bands, HeadingOptions, HeadingOptionsBuilder, MarkdownError, RenderOptions,
    Result, SizeBand,
};
