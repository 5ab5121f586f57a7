//! Schema Normalization module
//!
//! Converts the raw JSON of several OCR engines into one box model:
//!
//! - **Cloud OCR** ([`youdao`]) - region / line nested format
//! - **PDF text layer** ([`pymupdf`]) - page / block / line / span format in points
//! - **Local OCR** ([`rapidocr`]) - quadrilateral boxes
//!
//! The schema is chosen from the top-level JSON shape, or declared by the
//! caller. Malformed entries are dropped silently; a document that matches
//! no schema fails with [`SchemaError`].

pub mod pymupdf;
pub mod rapidocr;
mod types;
pub mod youdao;

use serde_json::Value;
use tracing::debug;

pub use pymupdf::PyMuPdfAdapter;
pub use rapidocr::RapidOcrAdapter;
pub use types::{
    page_extent, BoundingBox, NormalizeContext, NormalizedDocument, OcrFormat, PageBoxes,
    PageInfo, Point, Quad, Result, SchemaAdapter, SchemaError, TextBox, TextDirection,
};
pub use youdao::YoudaoAdapter;

impl OcrFormat {
    /// The adapter implementing this format
    pub fn adapter(&self) -> &'static dyn SchemaAdapter {
        match self {
            OcrFormat::Youdao => &YoudaoAdapter,
            OcrFormat::PyMuPdf => &PyMuPdfAdapter,
            OcrFormat::RapidOcr => &RapidOcrAdapter,
        }
    }
}

/// Normalizer front-end: detects (or checks) the schema and runs its adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    ctx: NormalizeContext,
}

impl Normalizer {
    pub fn new(ctx: NormalizeContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &NormalizeContext {
        &self.ctx
    }

    /// Normalize a parsed JSON document
    pub fn normalize(
        &self,
        value: &Value,
        declared: Option<OcrFormat>,
    ) -> Result<NormalizedDocument> {
        let format = match declared {
            Some(format) => {
                format.check(value)?;
                format
            }
            None => OcrFormat::detect(value)?,
        };

        let pages = format.adapter().normalize(value, &self.ctx)?;
        let document = NormalizedDocument { format, pages };
        debug!(
            format = %format,
            pages = document.pages.len(),
            boxes = document.box_count(),
            "normalized OCR document"
        );
        Ok(document)
    }

    /// Parse and normalize a JSON string
    pub fn normalize_str(
        &self,
        json: &str,
        declared: Option<OcrFormat>,
    ) -> Result<NormalizedDocument> {
        let value: Value = serde_json::from_str(json)?;
        self.normalize(&value, declared)
    }
}
