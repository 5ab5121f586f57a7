//! Filter Pipeline module
//!
//! Named predicates applied to boxes (before line assembly) and to rows
//! (after it). A predicate returns `true` to keep an item; the first one that
//! returns `false` drops it and writes a record to the [`FilterLog`].
//!
//! # Example
//!
//! ```rust
//! use ocr_markdown::filter::{builtin, BoxFilter, FilterLog, FilterStage};
//! use ocr_markdown::normalize::{BoundingBox, PageInfo, TextBox};
//!
//! let mut stage = FilterStage::new();
//! stage.register([
//!     builtin::min_width(15),
//!     BoxFilter::new("not_noise", |b: &TextBox, _: &PageInfo| b.text != "~"),
//! ]);
//!
//! let mut log = FilterLog::new(None);
//! let boxes = vec![TextBox::new("x", BoundingBox::new(0, 0, 10, 40))];
//! let kept = stage.apply(boxes, &PageInfo::new(1, 1000, 1000), &mut log).unwrap();
//! assert!(kept.is_empty());
//! assert_eq!(log.records().len(), 1);
//! ```

pub mod builtin;
mod log;
mod stage;
mod types;

pub use builtin::FilterSpec;
pub use log::{FilterLog, DEFAULT_LOG_FILE};
pub use stage::FilterStage;
pub use types::{
    BoxFilter, FilterError, FilterRecord, Filterable, ItemKind, NamedFilter, Result, RowFilter,
    RECORD_TEXT_LIMIT,
};
