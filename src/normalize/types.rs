//! Common types for the normalize module

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

// ============================================================
// Error Types
// ============================================================

/// Schema normalization error types
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unrecognized OCR schema: {0}")]
    UnrecognizedSchema(String),

    #[error("Document does not match declared format {expected}: {reason}")]
    FormatMismatch { expected: OcrFormat, reason: String },

    #[error("Unknown OCR format: {0}")]
    UnknownFormat(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

// ============================================================
// Geometry
// ============================================================

/// A corner point in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Four corner points as reported by quad-based engines
pub type Quad = [Point; 4];

/// Axis-aligned bounding box in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    /// X coordinate (left)
    pub x: u32,
    /// Y coordinate (top)
    pub y: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from fractional corner coordinates.
    ///
    /// Negative coordinates are clamped to zero. Returns `None` when the
    /// resulting rectangle has no area.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Option<Self> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let left = x0.min(x1).max(0.0).floor() as u32;
        let top = y0.min(y1).max(0.0).floor() as u32;
        let right = x0.max(x1).max(0.0).floor() as u32;
        let bottom = y0.max(y1).max(0.0).floor() as u32;

        let bbox = Self::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top));
        (bbox.width > 0 && bbox.height > 0).then_some(bbox)
    }

    /// Enclosing rectangle of a quad
    pub fn from_quad(quad: &Quad) -> Option<Self> {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in quad {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Self::from_corners(min_x, min_y, max_x, max_y)
    }

    /// Get the right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Get the bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Get the center X coordinate
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    /// Get the center Y coordinate
    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.height as f64 / 2.0
    }

    /// Get the area
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Width divided by height (0 for a degenerate box)
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Check if this box overlaps with another
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Merge with another bounding box
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        BoundingBox {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Text direction of a recognized fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    /// Horizontal (left-to-right)
    #[default]
    Horizontal,
    /// Vertical (top-to-bottom)
    Vertical,
}

impl TextDirection {
    /// Guess direction from box shape when the engine does not report it
    pub fn from_shape(bbox: &BoundingBox, char_count: usize) -> Self {
        if char_count >= 2 && bbox.height > bbox.width.saturating_mul(2) {
            TextDirection::Vertical
        } else {
            TextDirection::Horizontal
        }
    }
}

// ============================================================
// Core Data Structures
// ============================================================

/// A single recognized text fragment
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Recognized text (trimmed, never empty)
    pub text: String,

    /// Axis-aligned position in pixels
    pub bbox: BoundingBox,

    /// Native corner points, when the engine reports a quad
    pub quad: Option<Quad>,

    /// Source-engine line index
    pub line: Option<usize>,

    /// Source-engine region (block) index
    pub region: Option<usize>,

    /// Text direction
    pub direction: TextDirection,

    /// Recognition confidence (1.0 when unknown)
    pub confidence: f64,
}

impl TextBox {
    /// Create a new text box
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
            quad: None,
            line: None,
            region: None,
            direction: TextDirection::Horizontal,
            confidence: 1.0,
        }
    }

    #[must_use]
    pub fn with_quad(mut self, quad: Quad) -> Self {
        self.quad = Some(quad);
        self
    }

    #[must_use]
    pub fn with_source(mut self, line: Option<usize>, region: Option<usize>) -> Self {
        self.line = line;
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn x(&self) -> u32 {
        self.bbox.x
    }

    pub fn y(&self) -> u32 {
        self.bbox.y
    }

    pub fn width(&self) -> u32 {
        self.bbox.width
    }

    pub fn height(&self) -> u32 {
        self.bbox.height
    }
}

/// Per-page metadata handed to filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    /// Page number (1-based)
    pub page_number: usize,
    /// Page width in pixels
    pub page_width: u32,
    /// Page height in pixels
    pub page_height: u32,
}

impl PageInfo {
    pub fn new(page_number: usize, page_width: u32, page_height: u32) -> Self {
        Self {
            page_number,
            page_width,
            page_height,
        }
    }
}

/// Normalized boxes of one page, in detection order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageBoxes {
    pub info: PageInfo,
    pub boxes: Vec<TextBox>,
}

impl PageBoxes {
    pub fn new(info: PageInfo, boxes: Vec<TextBox>) -> Self {
        Self { info, boxes }
    }
}

/// Output of a normalization pass
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub format: OcrFormat,
    pub pages: Vec<PageBoxes>,
}

impl NormalizedDocument {
    pub fn box_count(&self) -> usize {
        self.pages.iter().map(|p| p.boxes.len()).sum()
    }
}

/// Settings shared by all schema adapters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeContext {
    /// Target resolution for text-layer coordinates
    pub dpi: u32,
    /// Page size supplied by the caller, for schemas that do not embed one
    pub page_size: Option<(u32, u32)>,
}

impl Default for NormalizeContext {
    fn default() -> Self {
        Self {
            dpi: 300,
            page_size: None,
        }
    }
}

impl NormalizeContext {
    /// Finish a page: pick the supplied size, else the extent of its boxes
    pub fn page(&self, page_number: usize, boxes: Vec<TextBox>) -> PageBoxes {
        let (width, height) = self.page_size.unwrap_or_else(|| page_extent(&boxes));
        PageBoxes::new(PageInfo::new(page_number, width, height), boxes)
    }
}

/// Largest right/bottom edge over a set of boxes
pub fn page_extent(boxes: &[TextBox]) -> (u32, u32) {
    boxes.iter().fold((0, 0), |(w, h), b| {
        (w.max(b.bbox.right()), h.max(b.bbox.bottom()))
    })
}

// ============================================================
// Formats
// ============================================================

/// Supported OCR engine output schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrFormat {
    /// Cloud OCR: `{"Result": {"regions": [{"lines": [...]}]}}`
    Youdao,
    /// PDF text layer: `[{"width", "height", "blocks": [...]}]`
    PyMuPdf,
    /// Local OCR: `[{"box": [[x, y]; 4], "txt", "score"}]`
    RapidOcr,
}

impl OcrFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OcrFormat::Youdao => "youdao",
            OcrFormat::PyMuPdf => "pymupdf",
            OcrFormat::RapidOcr => "rapidocr",
        }
    }

    /// Detect the schema from the top-level JSON shape
    pub fn detect(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) if map.contains_key("Result") => Ok(OcrFormat::Youdao),
            Value::Object(_) => Err(SchemaError::UnrecognizedSchema(
                "object without a `Result` key".to_string(),
            )),
            Value::Array(items) => match items.first() {
                Some(Value::Object(first))
                    if ["width", "height", "blocks"]
                        .iter()
                        .all(|key| first.contains_key(*key)) =>
                {
                    Ok(OcrFormat::PyMuPdf)
                }
                _ => Ok(OcrFormat::RapidOcr),
            },
            other => Err(SchemaError::UnrecognizedSchema(format!(
                "top-level JSON {}",
                json_kind(other)
            ))),
        }
    }

    /// Verify that a document has the top-level shape of this format
    pub fn check(&self, value: &Value) -> Result<()> {
        let empty_array = matches!(value, Value::Array(items) if items.is_empty());
        if empty_array && *self != OcrFormat::Youdao {
            return Ok(());
        }
        let detected = Self::detect(value).map_err(|e| SchemaError::FormatMismatch {
            expected: *self,
            reason: e.to_string(),
        })?;
        if detected == *self {
            Ok(())
        } else {
            Err(SchemaError::FormatMismatch {
                expected: *self,
                reason: format!("document looks like {}", detected),
            })
        }
    }
}

impl fmt::Display for OcrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OcrFormat {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "youdao" => Ok(OcrFormat::Youdao),
            "pymupdf" => Ok(OcrFormat::PyMuPdf),
            "rapidocr" => Ok(OcrFormat::RapidOcr),
            other => Err(SchemaError::UnknownFormat(other.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One normalization function per schema, identical output contract
pub trait SchemaAdapter {
    fn format(&self) -> OcrFormat;

    fn normalize(&self, value: &Value, ctx: &NormalizeContext) -> Result<Vec<PageBoxes>>;
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(10, 20, 100, 50);
        assert_eq!(bbox.right(), 110);
        assert_eq!(bbox.bottom(), 70);
        assert_eq!(bbox.center_x(), 60.0);
        assert_eq!(bbox.center_y(), 45.0);
        assert_eq!(bbox.area(), 5000);
        assert_eq!(bbox.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_bounding_box_merge() {
        let b1 = BoundingBox::new(10, 20, 30, 40);
        let b2 = BoundingBox::new(50, 60, 70, 80);
        let merged = b1.merge(&b2);

        assert_eq!(merged.x, 10);
        assert_eq!(merged.y, 20);
        assert_eq!(merged.right(), 120);
        assert_eq!(merged.bottom(), 140);
    }

    #[test]
    fn test_from_corners_clamps_and_rejects_empty() {
        let bbox = BoundingBox::from_corners(-5.0, 10.4, 20.9, 30.0).unwrap();
        assert_eq!(bbox, BoundingBox::new(0, 10, 20, 20));

        assert!(BoundingBox::from_corners(10.0, 10.0, 10.0, 50.0).is_none());
        assert!(BoundingBox::from_corners(f64::NAN, 0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn test_from_quad() {
        let quad = [
            Point::new(12.0, 8.0),
            Point::new(112.0, 10.0),
            Point::new(110.0, 48.0),
            Point::new(10.0, 46.0),
        ];
        let bbox = BoundingBox::from_quad(&quad).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 8, 102, 40));
    }

    #[test]
    fn test_direction_from_shape() {
        let tall = BoundingBox::new(0, 0, 40, 200);
        assert_eq!(TextDirection::from_shape(&tall, 4), TextDirection::Vertical);
        assert_eq!(TextDirection::from_shape(&tall, 1), TextDirection::Horizontal);
        let wide = BoundingBox::new(0, 0, 200, 40);
        assert_eq!(TextDirection::from_shape(&wide, 4), TextDirection::Horizontal);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            OcrFormat::detect(&json!({"Result": {"regions": []}})).unwrap(),
            OcrFormat::Youdao
        );
        assert_eq!(
            OcrFormat::detect(&json!([{"width": 595, "height": 842, "blocks": []}])).unwrap(),
            OcrFormat::PyMuPdf
        );
        assert_eq!(
            OcrFormat::detect(&json!([{"box": [], "txt": "a"}])).unwrap(),
            OcrFormat::RapidOcr
        );
        assert!(matches!(
            OcrFormat::detect(&json!({"pages": []})),
            Err(SchemaError::UnrecognizedSchema(_))
        ));
        assert!(matches!(
            OcrFormat::detect(&json!("text")),
            Err(SchemaError::UnrecognizedSchema(_))
        ));
    }

    #[test]
    fn test_check_declared_format() {
        let youdao = json!({"Result": {"regions": []}});
        assert!(OcrFormat::Youdao.check(&youdao).is_ok());
        assert!(matches!(
            OcrFormat::RapidOcr.check(&youdao),
            Err(SchemaError::FormatMismatch { .. })
        ));
        assert!(OcrFormat::PyMuPdf.check(&json!([])).is_ok());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("RapidOCR".parse::<OcrFormat>().unwrap(), OcrFormat::RapidOcr);
        assert_eq!("pymupdf".parse::<OcrFormat>().unwrap(), OcrFormat::PyMuPdf);
        assert!("tesseract".parse::<OcrFormat>().is_err());
    }

    #[test]
    fn test_context_page_size() {
        let boxes = vec![
            TextBox::new("a", BoundingBox::new(10, 10, 100, 40)),
            TextBox::new("b", BoundingBox::new(300, 900, 50, 40)),
        ];
        let derived = NormalizeContext::default().page(1, boxes.clone());
        assert_eq!(derived.info, PageInfo::new(1, 350, 940));

        let ctx = NormalizeContext {
            dpi: 300,
            page_size: Some((2480, 3508)),
        };
        assert_eq!(ctx.page(2, boxes).info, PageInfo::new(2, 2480, 3508));
    }
}
