//! OCR to Markdown converter
//!
//! Main entry point: normalize, filter boxes, assemble rows, filter rows,
//! render Markdown. Each converter owns its layout parameters, its filter
//! lists and its audit log, so several converters with different profiles
//! can coexist.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::filter::{BoxFilter, FilterError, FilterLog, FilterRecord, FilterStage, RowFilter};
use crate::layout::{LayoutError, LayoutParams, LayoutProfile, LineAssembler, PageRows, Row};
use crate::markdown::{
    HeadingOptions, MarkdownError, MarkdownRenderer, RenderOptions, TableOfContents,
};
use crate::normalize::{NormalizeContext, Normalizer, OcrFormat, PageBoxes, SchemaError, TextBox};

// ============================================================
// Error Types
// ============================================================

/// Conversion error types
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

// ============================================================
// Options
// ============================================================

/// Options for a converter instance
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterOptions {
    /// Geometry settings
    pub layout: LayoutParams,

    /// Declared input format (auto-detect when `None`)
    pub format: Option<OcrFormat>,

    /// Page size for schemas that do not embed one
    pub page_size: Option<(u32, u32)>,

    /// Audit log file (`None` logs to the console only)
    pub log_file: Option<PathBuf>,

    /// Heading detection calibration
    pub heading: HeadingOptions,

    /// Markdown output options
    pub render: RenderOptions,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            format: None,
            page_size: None,
            log_file: Some(PathBuf::from(crate::filter::DEFAULT_LOG_FILE)),
            heading: HeadingOptions::default(),
            render: RenderOptions::default(),
        }
    }
}

impl ConverterOptions {
    /// Create a builder
    pub fn builder() -> ConverterOptionsBuilder {
        ConverterOptionsBuilder::default()
    }
}

/// Builder for ConverterOptions
#[derive(Debug, Default)]
pub struct ConverterOptionsBuilder {
    options: ConverterOptions,
}

impl ConverterOptionsBuilder {
    /// Set all layout parameters
    #[must_use]
    pub fn layout(mut self, layout: LayoutParams) -> Self {
        self.options.layout = layout;
        self
    }

    /// Apply a calibration profile (keeps the current DPI)
    #[must_use]
    pub fn profile(mut self, profile: LayoutProfile) -> Self {
        self.options.layout.char_height = profile.char_height();
        self
    }

    #[must_use]
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.layout.dpi = dpi;
        self
    }

    #[must_use]
    pub fn char_height(mut self, char_height: f64) -> Self {
        self.options.layout.char_height = char_height;
        self
    }

    #[must_use]
    pub fn line_height_multiplier(mut self, multiplier: f64) -> Self {
        self.options.layout.line_height_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn format(mut self, format: OcrFormat) -> Self {
        self.options.format = Some(format);
        self
    }

    #[must_use]
    pub fn page_size(mut self, width: u32, height: u32) -> Self {
        self.options.page_size = Some((width, height));
        self
    }

    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.log_file = Some(path.into());
        self
    }

    /// Keep audit records in memory and on the console only
    #[must_use]
    pub fn no_log_file(mut self) -> Self {
        self.options.log_file = None;
        self
    }

    #[must_use]
    pub fn heading(mut self, heading: HeadingOptions) -> Self {
        self.options.heading = heading;
        self
    }

    #[must_use]
    pub fn render(mut self, render: RenderOptions) -> Self {
        self.options.render = render;
        self
    }

    #[must_use]
    pub fn build(self) -> ConverterOptions {
        self.options
    }
}

// ============================================================
// Types
// ============================================================

/// Result of converting one document
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Rendered Markdown
    pub markdown: String,

    /// Input format (`None` for pre-normalized pages)
    pub format: Option<OcrFormat>,

    /// Surviving rows per page
    pub pages: Vec<PageRows>,

    /// Every filter rejection of this conversion
    pub rejections: Vec<FilterRecord>,
}

impl Conversion {
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|p| p.rows.len()).sum()
    }
}

// ============================================================
// OCR Converter
// ============================================================

/// Runs the whole OCR JSON to Markdown pipeline
#[derive(Debug)]
pub struct OcrConverter {
    format: Option<OcrFormat>,
    page_size: Option<(u32, u32)>,
    assembler: LineAssembler,
    renderer: MarkdownRenderer,
    box_filters: FilterStage<TextBox>,
    row_filters: FilterStage<Row>,
    log: FilterLog,
}

impl Default for OcrConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrConverter {
    /// Create a converter with default options
    pub fn new() -> Self {
        Self {
            format: None,
            page_size: None,
            assembler: LineAssembler::default(),
            renderer: MarkdownRenderer::default(),
            box_filters: FilterStage::new(),
            row_filters: FilterStage::new(),
            log: FilterLog::with_default_path(),
        }
    }

    /// Create a converter with specified options
    pub fn with_options(options: ConverterOptions) -> Result<Self> {
        Ok(Self {
            format: options.format,
            page_size: options.page_size,
            assembler: LineAssembler::new(options.layout)?,
            renderer: MarkdownRenderer::with_options(options.heading, options.render)?,
            box_filters: FilterStage::new(),
            row_filters: FilterStage::new(),
            log: FilterLog::new(options.log_file),
        })
    }

    pub fn layout(&self) -> &LayoutParams {
        self.assembler.params()
    }

    /// Change layout parameters for subsequent conversions.
    ///
    /// Only the given values change; on error nothing changes.
    pub fn set_layout_params(
        &mut self,
        dpi: Option<u32>,
        char_height: Option<f64>,
        line_height_multiplier: Option<f64>,
    ) -> Result<()> {
        let mut params = *self.assembler.params();
        params.update(dpi, char_height, line_height_multiplier)?;
        self.assembler = LineAssembler::new(params)?;
        Ok(())
    }

    pub fn set_log_file(&mut self, path: impl Into<PathBuf>) {
        self.log.set_path(Some(path.into()));
    }

    pub fn disable_log_file(&mut self) {
        self.log.set_path(None);
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log.path()
    }

    pub fn set_format(&mut self, format: Option<OcrFormat>) {
        self.format = format;
    }

    pub fn set_page_size(&mut self, page_size: Option<(u32, u32)>) {
        self.page_size = page_size;
    }

    pub fn set_toc(&mut self, toc: Option<TableOfContents>) {
        self.renderer.set_toc(toc);
    }

    /// Append box filters (applied before line assembly)
    pub fn box_filter(&mut self, filters: impl IntoIterator<Item = BoxFilter>) -> &mut Self {
        self.box_filters.register(filters);
        self
    }

    /// Append row filters (applied after line assembly)
    pub fn row_box_filter(&mut self, filters: impl IntoIterator<Item = RowFilter>) -> &mut Self {
        self.row_filters.register(filters);
        self
    }

    pub fn clear_box_filters(&mut self) {
        self.box_filters.clear();
    }

    pub fn clear_row_filters(&mut self) {
        self.row_filters.clear();
    }

    pub fn box_filter_names(&self) -> Vec<&str> {
        self.box_filters.names()
    }

    pub fn row_filter_names(&self) -> Vec<&str> {
        self.row_filters.names()
    }

    /// Convert an OCR JSON string
    pub fn convert_str(&mut self, json: &str) -> Result<Conversion> {
        let value: Value = serde_json::from_str(json).map_err(SchemaError::from)?;
        self.convert_value(&value)
    }

    /// Convert a parsed OCR JSON document
    pub fn convert_value(&mut self, value: &Value) -> Result<Conversion> {
        let normalizer = Normalizer::new(NormalizeContext {
            dpi: self.layout().dpi,
            page_size: self.page_size,
        });
        let document = normalizer.normalize(value, self.format)?;
        let mut conversion = self.convert_pages(document.pages)?;
        conversion.format = Some(document.format);
        Ok(conversion)
    }

    /// Run filtering, assembly and rendering on normalized pages
    pub fn convert_pages(&mut self, pages: Vec<PageBoxes>) -> Result<Conversion> {
        self.log.clear_records();

        let mut page_rows = Vec::with_capacity(pages.len());
        for page in pages {
            page_rows.push(self.process_page(page)?);
        }

        let markdown = self.renderer.render_pages(&page_rows);
        let conversion = Conversion {
            markdown,
            format: None,
            pages: page_rows,
            rejections: self.log.take_records(),
        };

        info!(
            pages = conversion.pages.len(),
            rows = conversion.row_count(),
            rejected = conversion.rejections.len(),
            "converted OCR document"
        );
        Ok(conversion)
    }

    /// Filter boxes, assemble rows and filter rows of one page
    pub fn process_page(&mut self, page: PageBoxes) -> Result<PageRows> {
        let PageBoxes { info, boxes } = page;
        let boxes = self.box_filters.apply(boxes, &info, &mut self.log)?;
        let rows = self.assembler.assemble(boxes);
        let rows = self.row_filters.apply(rows, &info, &mut self.log)?;
        Ok(PageRows::new(info, rows, self.assembler.params().line_spacing()))
    }
}

// ============================================================
// Tests
// ============================================================
