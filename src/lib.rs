//! # ocr-markdown
//!
//! Rebuilds reading-order text lines from the JSON output of OCR engines and
//! renders them as Markdown.
//!
//! ## Pipeline
//!
//! 1. [`normalize`] - cloud OCR, PDF text layer and local OCR JSON become
//!    pages of axis-aligned text boxes
//! 2. [`filter`] - named box predicates drop noise, headers and sidebars
//! 3. [`layout`] - boxes cluster into rows; gaps become spaces and indentation
//! 4. [`filter`] - named row predicates drop page numbers and running heads
//! 5. [`markdown`] - rows render as headings or body lines
//!
//! ## Example
//!
//! ```rust
//! use ocr_markdown::{ConverterOptions, OcrConverter};
//!
//! let json = r#"[
//!     {"box": [[100, 100], [400, 100], [400, 150], [100, 150]], "txt": "Hello", "score": 0.99},
//!     {"box": [[500, 105], [800, 105], [800, 150], [500, 150]], "txt": "World", "score": 0.97}
//! ]"#;
//!
//! let options = ConverterOptions::builder().no_log_file().build();
//! let mut converter = OcrConverter::with_options(options).unwrap();
//! let conversion = converter.convert_str(json).unwrap();
//! assert_eq!(conversion.markdown, "Hello    World");
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod converter;
pub mod filter;
pub mod layout;
pub mod markdown;
pub mod normalize;
pub mod progress;

// Re-exports for convenience
pub use batch::{
    collect_json_files, convert_file, convert_path, output_path_for, BatchOptions, BatchReport,
    ProgressCallback, SilentProgress,
};
pub use cli::{exit_codes, Cli, Commands, ConvertArgs, FormatArg, MergeArgs};
pub use config::{CliOverrides, Config, ConfigError};
pub use converter::{
    Conversion, ConvertError, ConverterOptions, ConverterOptionsBuilder, OcrConverter,
};
pub use filter::{
    BoxFilter, FilterError, FilterLog, FilterRecord, FilterSpec, FilterStage, Filterable,
    NamedFilter, RowFilter,
};
pub use layout::{LayoutError, LayoutParams, LayoutProfile, LineAssembler, PageRows, Row};
pub use markdown::{
    HeadingClassifier, HeadingOptions, MarkdownError, MarkdownMerger, MarkdownRenderer,
    MergeOptions, MergeSortOrder, RenderOptions, TableOfContents,
};
pub use normalize::{
    BoundingBox, NormalizeContext, NormalizedDocument, Normalizer, OcrFormat, PageBoxes,
    PageInfo, SchemaError, TextBox,
};
pub use progress::{OutputMode, ProgressTracker};
