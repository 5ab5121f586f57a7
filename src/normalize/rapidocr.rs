//! Local OCR adapter (quadrilateral boxes)
//!
//! Accepts both the object form `{"box": [[x, y]; 4], "txt": "...", "score": 0.9}`
//! and the raw tuple form `[[[x, y]; 4], "...", 0.9]`.

use serde::Deserialize;
use serde_json::Value;

use super::types::{
    BoundingBox, NormalizeContext, OcrFormat, PageBoxes, Point, Quad, Result, SchemaAdapter,
    SchemaError, TextBox, TextDirection,
};

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(rename = "box")]
    quad: Vec<[f64; 2]>,
    txt: String,
    #[serde(default)]
    score: Option<f64>,
}

fn parse_entry(raw: &Value) -> Option<Entry> {
    match raw {
        Value::Object(_) => Entry::deserialize(raw).ok(),
        Value::Array(parts) => {
            let quad = Vec::<[f64; 2]>::deserialize(parts.first()?).ok()?;
            let txt = parts.get(1)?.as_str()?.to_string();
            let score = parts.get(2).and_then(Value::as_f64);
            Some(Entry { quad, txt, score })
        }
        _ => None,
    }
}

fn to_quad(points: &[[f64; 2]]) -> Option<Quad> {
    match *points {
        [a, b, c, d] => Some([a, b, c, d].map(|[x, y]| Point::new(x, y))),
        _ => None,
    }
}

/// Adapter for the local quad-box engine output
#[derive(Debug, Clone, Copy, Default)]
pub struct RapidOcrAdapter;

impl SchemaAdapter for RapidOcrAdapter {
    fn format(&self) -> OcrFormat {
        OcrFormat::RapidOcr
    }

    fn normalize(&self, value: &Value, ctx: &NormalizeContext) -> Result<Vec<PageBoxes>> {
        let Value::Array(items) = value else {
            return Err(SchemaError::UnrecognizedSchema(
                "local OCR document must be an array".to_string(),
            ));
        };

        let mut boxes = Vec::new();
        for (index, raw) in items.iter().enumerate() {
            let Some(entry) = parse_entry(raw) else {
                continue;
            };
            let text = entry.txt.trim();
            if text.is_empty() {
                continue;
            }
            let Some(quad) = to_quad(&entry.quad) else {
                continue;
            };
            let Some(bbox) = BoundingBox::from_quad(&quad) else {
                continue;
            };

            let direction = TextDirection::from_shape(&bbox, text.chars().count());
            boxes.push(
                TextBox::new(text, bbox)
                    .with_quad(quad)
                    .with_source(Some(index), None)
                    .with_direction(direction)
                    .with_confidence(entry.score.unwrap_or(1.0)),
            );
        }

        Ok(vec![ctx.page(1, boxes)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_entries() {
        let doc = json!([
            {"box": [[10, 20], [210, 20], [210, 70], [10, 70]], "txt": "第一行", "score": 0.98},
            {"box": [[10, 100], [110, 100], [110, 150]], "txt": "three points"},
            {"box": [[10, 200], [110, 200], [110, 250], [10, 250]], "txt": "  "},
            {"txt": "no box"}
        ]);

        let pages = RapidOcrAdapter
            .normalize(&doc, &NormalizeContext::default())
            .unwrap();
        let boxes = &pages[0].boxes;
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].text, "第一行");
        assert_eq!(boxes[0].bbox, BoundingBox::new(10, 20, 200, 50));
        assert_eq!(boxes[0].confidence, 0.98);
        assert_eq!(boxes[0].line, Some(0));
        assert!(boxes[0].quad.is_some());
    }

    #[test]
    fn test_tuple_entries() {
        let doc = json!([
            [[[5.5, 5.0], [105.0, 5.0], [105.0, 45.0], [5.5, 45.0]], "tuple", 0.5],
            [[[0, 0], [10, 0], [10, 10], [0, 10]], "no score"]
        ]);
        let pages = RapidOcrAdapter
            .normalize(&doc, &NormalizeContext::default())
            .unwrap();
        let boxes = &pages[0].boxes;
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].bbox, BoundingBox::new(5, 5, 100, 40));
        assert_eq!(boxes[1].confidence, 1.0);
    }

    #[test]
    fn test_empty_document() {
        let pages = RapidOcrAdapter
            .normalize(&json!([]), &NormalizeContext::default())
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].boxes.is_empty());
        assert_eq!(pages[0].info.page_width, 0);
    }
}
