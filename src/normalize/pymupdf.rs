//! PDF text-layer adapter
//!
//! Input is the page list exported from a PDF text layer: every page has a
//! `width`/`height` in points and `blocks`; text blocks (`type == 0`) hold
//! `lines`, and each line holds `spans`. All spans of a line become one box.
//!
//! Coordinates are in points (1/72 inch) and are scaled by `dpi / 72` so they
//! share the pixel space of the OCR sources.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::types::{
    page_extent, BoundingBox, NormalizeContext, OcrFormat, PageBoxes, PageInfo, Result,
    SchemaAdapter, SchemaError, TextBox, TextDirection,
};

const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    blocks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Block {
    #[serde(default, rename = "type")]
    kind: Option<i64>,
    #[serde(default)]
    lines: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Line {
    #[serde(default)]
    spans: Vec<Value>,
    #[serde(default)]
    dir: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct Span {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    bbox: Option<Vec<f64>>,
    #[serde(default)]
    chars: Vec<Char>,
    #[serde(default)]
    origin: Option<[f64; 2]>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    ascender: Option<f64>,
    #[serde(default)]
    descender: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Char {
    #[serde(default)]
    c: Option<String>,
    #[serde(default)]
    bbox: Option<Vec<f64>>,
}

/// Rectangle in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [x0, y0, x1, y1] => Some(Self { x0, y0, x1, y1 }),
            _ => None,
        }
    }

    fn union(self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn scaled(self, scale: f64) -> Option<BoundingBox> {
        BoundingBox::from_corners(
            self.x0 * scale,
            self.y0 * scale,
            self.x1 * scale,
            self.y1 * scale,
        )
    }
}

impl Span {
    fn text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.chars.iter().filter_map(|c| c.c.as_deref()).collect(),
        }
    }

    /// Span rectangle: explicit bbox, else union of char boxes, else font metrics
    fn rect(&self, text: &str) -> Option<Rect> {
        if let Some(rect) = self.bbox.as_deref().and_then(Rect::from_slice) {
            return Some(rect);
        }

        let from_chars = self
            .chars
            .iter()
            .filter_map(|c| c.bbox.as_deref().and_then(Rect::from_slice))
            .reduce(Rect::union);
        if from_chars.is_some() {
            return from_chars;
        }

        let [ox, oy] = self.origin?;
        let size = self.size.filter(|s| *s > 0.0)?;
        let ascender = self.ascender.unwrap_or(1.0);
        let descender = self.descender.unwrap_or(0.0);
        // Full-width glyphs advance one em, others roughly half.
        let advance: f64 = text
            .chars()
            .map(|ch| if ch.is_ascii() { 0.5 } else { 1.0 })
            .sum();
        Some(Rect {
            x0: ox,
            y0: oy - size * ascender,
            x1: ox + size * advance,
            y1: oy - size * descender,
        })
    }
}

/// Adapter for PDF text-layer exports
#[derive(Debug, Clone, Copy, Default)]
pub struct PyMuPdfAdapter;

impl SchemaAdapter for PyMuPdfAdapter {
    fn format(&self) -> OcrFormat {
        OcrFormat::PyMuPdf
    }

    fn normalize(&self, value: &Value, ctx: &NormalizeContext) -> Result<Vec<PageBoxes>> {
        let Value::Array(raw_pages) = value else {
            return Err(SchemaError::UnrecognizedSchema(
                "text-layer document must be a page list".to_string(),
            ));
        };
        let scale = ctx.dpi as f64 / POINTS_PER_INCH;

        let mut pages = Vec::new();
        for raw_page in raw_pages {
            let Ok(page) = Page::deserialize(raw_page) else {
                continue;
            };
            let page_number = pages.len() + 1;
            let boxes = page_boxes(&page, scale);

            let embedded = (
                (page.width.max(0.0) * scale) as u32,
                (page.height.max(0.0) * scale) as u32,
            );
            let (page_width, page_height) = if embedded.0 > 0 && embedded.1 > 0 {
                embedded
            } else {
                warn!(page = page_number, "text-layer page has no size, using content extent");
                ctx.page_size.unwrap_or_else(|| page_extent(&boxes))
            };

            pages.push(PageBoxes::new(
                PageInfo::new(page_number, page_width, page_height),
                boxes,
            ));
        }

        Ok(pages)
    }
}

fn page_boxes(page: &Page, scale: f64) -> Vec<TextBox> {
    let mut boxes = Vec::new();

    for (block_index, raw_block) in page.blocks.iter().enumerate() {
        let Ok(block) = Block::deserialize(raw_block) else {
            continue;
        };
        if block.kind != Some(0) {
            continue;
        }

        for (line_index, raw_line) in block.lines.iter().enumerate() {
            let Ok(line) = Line::deserialize(raw_line) else {
                continue;
            };

            let mut text = String::new();
            let mut rect: Option<Rect> = None;
            for raw_span in &line.spans {
                let Ok(span) = Span::deserialize(raw_span) else {
                    continue;
                };
                let span_text = span.text();
                let span_text = span_text.trim();
                if span_text.is_empty() {
                    continue;
                }
                let Some(span_rect) = span.rect(span_text) else {
                    continue;
                };
                text.push_str(span_text);
                rect = Some(match rect {
                    Some(r) => r.union(span_rect),
                    None => span_rect,
                });
            }

            let Some(bbox) = rect.and_then(|r| r.scaled(scale)) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            let direction = match line.dir {
                Some([dx, dy]) if dy.abs() > dx.abs() => TextDirection::Vertical,
                _ => TextDirection::Horizontal,
            };
            boxes.push(
                TextBox::new(text, bbox)
                    .with_source(Some(line_index), Some(block_index))
                    .with_direction(direction),
            );
        }
    }

    boxes
}
