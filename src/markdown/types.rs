//! Common types for the markdown module

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Markdown rendering and merging error types
#[derive(Debug, Error)]
pub enum MarkdownError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid heading option: {0}")]
    InvalidOption(String),

    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MarkdownError>;

// ============================================================
// Heading Options
// ============================================================

/// Rows at least `ratio` times the reference height get heading `level`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBand {
    pub ratio: f64,
    pub level: u8,
}

impl SizeBand {
    pub fn new(ratio: f64, level: u8) -> Self {
        Self { ratio, level }
    }
}

/// Default size bands: 2.5x => `#`, 2.0x => `##`, 1.5x => `###`, 1.25x => `####`
pub fn default_size_bands() -> Vec<SizeBand> {
    vec![
        SizeBand::new(2.5, 1),
        SizeBand::new(2.0, 2),
        SizeBand::new(1.5, 3),
        SizeBand::new(1.25, 4),
    ]
}

/// Calibration of the heading classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingOptions {
    /// Height ratio bands against the page's median row height
    pub size_bands: Vec<SizeBand>,

    /// Absolute row height (pixels) above which a row is a heading
    pub min_heading_height: Option<f64>,

    /// Treat short centered rows as headings
    pub detect_centered: bool,

    /// Allowed offset of the row center from the page center, as a fraction of page width
    pub center_tolerance: f64,

    pub max_centered_fragments: usize,

    pub max_centered_chars: usize,

    /// Widest centered row, as a fraction of page width
    pub max_centered_width_ratio: f64,

    pub centered_level: u8,

    /// Trailing characters that mark a row as body prose
    pub body_punctuation: String,

    /// Patterns for numbered question lines
    pub question_patterns: Vec<String>,

    pub question_level: u8,

    /// Minimum normalized similarity for a table-of-contents match (1.0 = exact)
    pub toc_similarity: f64,
}

impl Default for HeadingOptions {
    fn default() -> Self {
        Self {
            size_bands: default_size_bands(),
            min_heading_height: None,
            detect_centered: true,
            center_tolerance: 0.05,
            max_centered_fragments: 2,
            max_centered_chars: 20,
            max_centered_width_ratio: 0.6,
            centered_level: 3,
            body_punctuation: "。，、；：！？,.;:!?".to_string(),
            question_patterns: vec!["^[一二三四五六七八九十]+、".to_string()],
            question_level: 4,
            toc_similarity: 1.0,
        }
    }
}

impl HeadingOptions {
    /// Create a builder
    pub fn builder() -> HeadingOptionsBuilder {
        HeadingOptionsBuilder::default()
    }
}

/// Builder for HeadingOptions
#[derive(Debug, Default)]
pub struct HeadingOptionsBuilder {
    options: HeadingOptions,
}

impl HeadingOptionsBuilder {
    #[must_use]
    pub fn size_bands(mut self, bands: Vec<SizeBand>) -> Self {
        self.options.size_bands = bands;
        self
    }

    #[must_use]
    pub fn min_heading_height(mut self, height: f64) -> Self {
        self.options.min_heading_height = Some(height);
        self
    }

    #[must_use]
    pub fn detect_centered(mut self, detect: bool) -> Self {
        self.options.detect_centered = detect;
        self
    }

    #[must_use]
    pub fn center_tolerance(mut self, tolerance: f64) -> Self {
        self.options.center_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn centered_level(mut self, level: u8) -> Self {
        self.options.centered_level = level;
        self
    }

    /// Add a question-line pattern
    #[must_use]
    pub fn question_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options.question_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn question_level(mut self, level: u8) -> Self {
        self.options.question_level = level;
        self
    }

    #[must_use]
    pub fn toc_similarity(mut self, similarity: f64) -> Self {
        self.options.toc_similarity = similarity;
        self
    }

    #[must_use]
    pub fn build(self) -> HeadingOptions {
        self.options
    }
}

// ============================================================
// Render Options
// ============================================================

/// Options for Markdown rendering
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Emit blank lines for vertical gaps between rows
    pub preserve_blank_lines: bool,

    /// Line inserted between pages
    pub page_break_marker: Option<String>,

    /// Drop the leading indentation of body rows
    pub trim_body_indent: bool,
}

// ============================================================
// Tests
// ============================================================
