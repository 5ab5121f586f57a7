//! Configuration file support
//!
//! Settings are read from TOML, by default at
//! `<config dir>/ocr-markdown/config.toml`, and command-line values are
//! applied on top with [`Config::merge_with_cli`].
//!
//! ```toml
//! [layout]
//! profile = "compact"
//! dpi = 300
//!
//! [log]
//! file = "filter_log.txt"
//!
//! [markdown.heading]
//! min_heading_height = 70.0
//!
//! [markdown.render]
//! page_break_marker = "---"
//!
//! [[filters.row]]
//! kind = "page_number"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::converter::ConverterOptions;
use crate::filter::{builtin, BoxFilter, FilterError, FilterSpec, RowFilter, DEFAULT_LOG_FILE};
use crate::layout::{LayoutParams, LayoutProfile};
use crate::markdown::{HeadingOptions, RenderOptions, TableOfContents};
use crate::normalize::{OcrFormat, SchemaError};

/// Application directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "ocr-markdown";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

// ============================================================
// Error Types
// ============================================================

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid filter in config: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid format in config: {0}")]
    Format(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// Config Sections
// ============================================================

/// `[layout]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub profile: Option<LayoutProfile>,
    pub dpi: Option<u32>,
    pub char_height: Option<f64>,
    pub line_height_multiplier: Option<f64>,
    /// Input format name (`youdao`, `pymupdf`, `rapidocr`)
    pub format: Option<String>,
    pub page_width: Option<u32>,
    pub page_height: Option<u32>,
}

/// `[log]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    /// Write the audit log file at all
    pub enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            enabled: true,
        }
    }
}

/// `[markdown]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub heading: HeadingOptions,
    pub render: RenderOptions,
    /// Table of contents file used for heading levels
    pub toc_file: Option<PathBuf>,
    pub toc_start_level: Option<u8>,
}

/// `[[filters.box]]` and `[[filters.row]]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    #[serde(rename = "box")]
    pub boxes: Vec<FilterSpec>,
    #[serde(rename = "row")]
    pub rows: Vec<FilterSpec>,
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub log: LogConfig,
    pub markdown: MarkdownConfig,
    pub filters: FiltersConfig,
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub profile: Option<LayoutProfile>,
    pub dpi: Option<u32>,
    pub char_height: Option<f64>,
    pub line_height_multiplier: Option<f64>,
    pub format: Option<OcrFormat>,
    pub page_size: Option<(u32, u32)>,
    pub log_file: Option<PathBuf>,
    pub no_log_file: bool,
    pub toc_file: Option<PathBuf>,
    pub toc_start_level: Option<u8>,
    pub page_break_marker: Option<String>,
    pub preserve_blank_lines: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================
// Loading
// ============================================================

impl Config {
    /// `<config dir>/ocr-markdown/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the default config file; a missing file gives the defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load an explicit config file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Combine file values with command-line values (command line wins)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Result<ConverterOptions> {
        let layout_cfg = &self.layout;

        let mut layout =
            LayoutParams::from_profile(layout_cfg.profile.unwrap_or_default());
        layout.dpi = layout_cfg.dpi.unwrap_or(layout.dpi);
        layout.char_height = layout_cfg.char_height.unwrap_or(layout.char_height);
        layout.line_height_multiplier = layout_cfg
            .line_height_multiplier
            .unwrap_or(layout.line_height_multiplier);

        if let Some(profile) = cli.profile {
            layout.char_height = profile.char_height();
        }
        layout.dpi = cli.dpi.unwrap_or(layout.dpi);
        layout.char_height = cli.char_height.unwrap_or(layout.char_height);
        layout.line_height_multiplier = cli
            .line_height_multiplier
            .unwrap_or(layout.line_height_multiplier);

        let format = match (cli.format, layout_cfg.format.as_deref()) {
            (Some(format), _) => Some(format),
            (None, Some(name)) if name != "auto" => Some(name.parse::<OcrFormat>()?),
            _ => None,
        };

        let page_size = cli.page_size.or(match (layout_cfg.page_width, layout_cfg.page_height) {
            (Some(width), Some(height)) => Some((width, height)),
            _ => None,
        });

        let log_file = if cli.no_log_file {
            None
        } else if let Some(path) = &cli.log_file {
            Some(path.clone())
        } else if self.log.enabled {
            Some(
                self.log
                    .file
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            )
        } else {
            None
        };

        let mut render = self.markdown.render.clone();
        if let Some(marker) = &cli.page_break_marker {
            render.page_break_marker = Some(marker.clone());
        }
        if let Some(preserve) = cli.preserve_blank_lines {
            render.preserve_blank_lines = preserve;
        }

        Ok(ConverterOptions {
            layout,
            format,
            page_size,
            log_file,
            heading: self.markdown.heading.clone(),
            render,
        })
    }

    /// Read the table of contents named on the command line or in the file
    pub fn load_toc(&self, cli: &CliOverrides) -> Result<Option<TableOfContents>> {
        let Some(path) = cli.toc_file.as_ref().or(self.markdown.toc_file.as_ref()) else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let start_level = cli
            .toc_start_level
            .or(self.markdown.toc_start_level)
            .unwrap_or(1);
        Ok(Some(TableOfContents::parse(&contents, start_level)))
    }

    /// Box filters declared in `[[filters.box]]`
    pub fn box_filters(&self) -> Result<Vec<BoxFilter>> {
        Ok(builtin::build_all(&self.filters.boxes)?)
    }

    /// Row filters declared in `[[filters.row]]`
    pub fn row_filters(&self) -> Result<Vec<RowFilter>> {
        Ok(builtin::build_all(&self.filters.rows)?)
    }
}

// ============================================================
// Tests
// ============================================================
