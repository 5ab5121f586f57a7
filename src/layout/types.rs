//! Common types for the layout module

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::{BoundingBox, PageInfo, TextBox};

// ============================================================
// Constants
// ============================================================

/// Default rendering resolution
pub const DEFAULT_DPI: u32 = 300;

/// Body character height for scanned pages at 300 DPI
pub const DEFAULT_CHAR_HEIGHT: f64 = 50.0;

/// Body character height for the compact calibration profile
pub const COMPACT_CHAR_HEIGHT: f64 = 28.0;

/// Default line pitch as a multiple of the character height
pub const DEFAULT_LINE_HEIGHT_MULTIPLIER: f64 = 1.5;

/// Two spaces approximate one body character
pub const SPACES_PER_CHAR: f64 = 2.0;

// ============================================================
// Error Types
// ============================================================

/// Layout configuration error types
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("{name} must be greater than 0, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Unknown layout profile: {0}")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

// ============================================================
// Layout Parameters
// ============================================================

/// Calibration profile for the character height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutProfile {
    /// Scanned book pages (char height 50 px)
    #[default]
    Scan,
    /// Smaller body text (char height 28 px)
    Compact,
}

impl LayoutProfile {
    pub fn char_height(&self) -> f64 {
        match self {
            LayoutProfile::Scan => DEFAULT_CHAR_HEIGHT,
            LayoutProfile::Compact => COMPACT_CHAR_HEIGHT,
        }
    }
}

impl fmt::Display for LayoutProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutProfile::Scan => f.write_str("scan"),
            LayoutProfile::Compact => f.write_str("compact"),
        }
    }
}

impl FromStr for LayoutProfile {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scan" => Ok(LayoutProfile::Scan),
            "compact" => Ok(LayoutProfile::Compact),
            other => Err(LayoutError::UnknownProfile(other.to_string())),
        }
    }
}

/// Geometry settings that scale every layout threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Resolution of the pixel space
    pub dpi: u32,
    /// Body character height in pixels
    pub char_height: f64,
    /// Line pitch as a multiple of `char_height`
    pub line_height_multiplier: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::from_profile(LayoutProfile::Scan)
    }
}

impl LayoutParams {
    /// Create validated parameters
    pub fn new(dpi: u32, char_height: f64, line_height_multiplier: f64) -> Result<Self> {
        let params = Self {
            dpi,
            char_height,
            line_height_multiplier,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_profile(profile: LayoutProfile) -> Self {
        Self {
            dpi: DEFAULT_DPI,
            char_height: profile.char_height(),
            line_height_multiplier: DEFAULT_LINE_HEIGHT_MULTIPLIER,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(LayoutError::InvalidParameter {
                name: "dpi",
                value: 0.0,
            });
        }
        for (name, value) in [
            ("char_height", self.char_height),
            ("line_height_multiplier", self.line_height_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Override individual values; nothing changes if any given value is invalid
    pub fn update(
        &mut self,
        dpi: Option<u32>,
        char_height: Option<f64>,
        line_height_multiplier: Option<f64>,
    ) -> Result<()> {
        let updated = Self {
            dpi: dpi.unwrap_or(self.dpi),
            char_height: char_height.unwrap_or(self.char_height),
            line_height_multiplier: line_height_multiplier.unwrap_or(self.line_height_multiplier),
        };
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Distance between consecutive baselines
    pub fn line_spacing(&self) -> f64 {
        (self.char_height * self.line_height_multiplier).max(1.0)
    }

    /// Maximum distance of a box's vertical center from its row's center
    pub fn row_threshold(&self) -> f64 {
        self.char_height * self.line_height_multiplier / 2.0
    }

    /// Scale from PDF points to pixels
    pub fn dpi_scale(&self) -> f64 {
        self.dpi as f64 / 72.0
    }

    /// Number of spaces standing in for a horizontal gap
    pub fn spaces_for_gap(&self, gap_px: f64) -> usize {
        if gap_px <= 0.0 {
            return 0;
        }
        ((gap_px / self.char_height) * SPACES_PER_CHAR).round() as usize
    }
}

// ============================================================
// Rows
// ============================================================

/// An assembled text line
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Member boxes, left to right
    pub fragments: Vec<TextBox>,
    /// Fragment texts joined with inferred spacing
    pub text: String,
    /// Union of the fragment boxes
    pub bounds: BoundingBox,
    /// Leading spaces for the row's offset from the text area's left edge
    pub indent: usize,
    /// Mean vertical center of the fragments
    pub center_y: f64,
}

impl Row {
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Length of `text` in characters
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }

    /// The row as a text line, indentation included
    pub fn line(&self) -> String {
        format!("{}{}", " ".repeat(self.indent), self.text)
    }

    /// Blank lines that fit in the vertical gap above this row
    pub fn blank_lines_after(&self, previous: &Row, line_spacing: f64) -> usize {
        if line_spacing <= 0.0 {
            return 0;
        }
        let gap = self.bounds.y as f64 - previous.bounds.bottom() as f64;
        if gap <= 0.0 {
            0
        } else {
            (gap / line_spacing).floor() as usize
        }
    }
}

/// Surviving rows of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRows {
    pub info: PageInfo,
    pub rows: Vec<Row>,
    /// Line spacing in effect when the rows were assembled
    pub line_spacing: f64,
}

impl PageRows {
    pub fn new(info: PageInfo, rows: Vec<Row>, line_spacing: f64) -> Self {
        Self {
            info,
            rows,
            line_spacing,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================
// Tests
// ============================================================
