//! Common types for the filter module

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::layout::Row;
use crate::normalize::{BoundingBox, PageInfo, TextBox};

/// Longest text kept in an audit record, in characters
pub const RECORD_TEXT_LIMIT: usize = 50;

// ============================================================
// Error Types
// ============================================================

/// Filter pipeline error types
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Filter '{name}' failed: {message}")]
    Predicate { name: String, message: String },

    #[error("Failed to write filter log {path:?}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, FilterError>;

// ============================================================
// Filterable Items
// ============================================================

/// Which pipeline stage an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Box,
    Row,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Box => "BOX",
            ItemKind::Row => "ROW",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniform view of boxes and rows for predicates and audit records
pub trait Filterable {
    const KIND: ItemKind;

    fn text(&self) -> &str;

    fn bounds(&self) -> BoundingBox;

    fn fragment_count(&self) -> usize {
        1
    }

    fn confidence(&self) -> f64 {
        1.0
    }
}

impl Filterable for TextBox {
    const KIND: ItemKind = ItemKind::Box;

    fn text(&self) -> &str {
        &self.text
    }

    fn bounds(&self) -> BoundingBox {
        self.bbox
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl Filterable for Row {
    const KIND: ItemKind = ItemKind::Row;

    fn text(&self) -> &str {
        &self.text
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Lowest confidence among the fragments
    fn confidence(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.confidence)
            .reduce(f64::min)
            .unwrap_or(1.0)
    }
}

// ============================================================
// Named Predicates
// ============================================================

type Predicate<T> =
    Box<dyn Fn(&T, &PageInfo) -> std::result::Result<bool, String> + Send + Sync>;

/// A predicate with a stable name for the audit log. `true` keeps the item.
pub struct NamedFilter<T> {
    name: String,
    predicate: Predicate<T>,
}

impl<T> NamedFilter<T> {
    /// Wrap an infallible predicate
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T, &PageInfo) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(move |item, page| Ok(predicate(item, page))),
        }
    }

    /// Wrap a predicate that can fail; an error aborts the conversion
    pub fn fallible<F, E>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T, &PageInfo) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            name: name.into(),
            predicate: Box::new(move |item, page| {
                predicate(item, page).map_err(|e| e.to_string())
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate
    pub fn check(&self, item: &T, page: &PageInfo) -> Result<bool> {
        (self.predicate)(item, page).map_err(|message| FilterError::Predicate {
            name: self.name.clone(),
            message,
        })
    }
}

impl<T> fmt::Debug for NamedFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub type BoxFilter = NamedFilter<TextBox>;
pub type RowFilter = NamedFilter<Row>;

// ============================================================
// Audit Records
// ============================================================

/// One rejection event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRecord {
    pub kind: ItemKind,
    /// Name of the rejecting filter
    pub filter: String,
    /// Item text, truncated to [`RECORD_TEXT_LIMIT`] characters
    pub text: String,
    pub page_number: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FilterRecord {
    pub fn new<T: Filterable>(filter: &str, item: &T, page: &PageInfo) -> Self {
        let bounds = item.bounds();
        Self {
            kind: T::KIND,
            filter: filter.to_string(),
            text: item.text().chars().take(RECORD_TEXT_LIMIT).collect(),
            page_number: page.page_number,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

impl fmt::Display for FilterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[FILTER_LOG] {}被过滤 - 过滤器: {}, 文本: '{}', 坐标: ({}, {}), 尺寸: {}x{}",
            self.kind, self.filter, self.text, self.x, self.y, self.width, self.height
        )
    }
}

// ============================================================
// Tests
// ============================================================
