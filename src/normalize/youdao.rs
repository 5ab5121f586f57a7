//! Cloud OCR adapter (region / line nested format)
//!
//! ```json
//! {"Result": {"regions": [{"boundingBox": "x,y,w,h", "dir": "h",
//!   "lines": [{"boundingBox": "x1,y1,x2,y2,x3,y3,x4,y4", "text": "..."}]}]}}
//! ```
//!
//! Each line becomes one box. `boundingBox` strings carry either an
//! `x,y,width,height` rectangle or the eight coordinates of a quad.

use serde::Deserialize;
use serde_json::Value;

use super::types::{
    BoundingBox, NormalizeContext, OcrFormat, PageBoxes, Point, Quad, Result, SchemaAdapter,
    SchemaError, TextBox, TextDirection,
};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "Result")]
    result: OcrResult,
}

#[derive(Debug, Default, Deserialize)]
struct OcrResult {
    #[serde(default)]
    regions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Region {
    #[serde(default, rename = "boundingBox")]
    bounding_box: Option<String>,
    #[serde(default)]
    dir: Option<String>,
    #[serde(default)]
    lines: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Line {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "boundingBox")]
    bounding_box: Option<String>,
}

/// Adapter for the cloud provider's nested region format
#[derive(Debug, Clone, Copy, Default)]
pub struct YoudaoAdapter;

impl SchemaAdapter for YoudaoAdapter {
    fn format(&self) -> OcrFormat {
        OcrFormat::Youdao
    }

    fn normalize(&self, value: &Value, ctx: &NormalizeContext) -> Result<Vec<PageBoxes>> {
        let document = Document::deserialize(value).map_err(|e| {
            SchemaError::UnrecognizedSchema(format!("malformed `Result` object: {}", e))
        })?;

        let mut boxes = Vec::new();
        for (region_index, raw_region) in document.result.regions.iter().enumerate() {
            let Ok(region) = Region::deserialize(raw_region) else {
                continue;
            };
            let direction = match region.dir.as_deref() {
                Some("v") => TextDirection::Vertical,
                _ => TextDirection::Horizontal,
            };

            for (line_index, raw_line) in region.lines.iter().enumerate() {
                let Ok(line) = Line::deserialize(raw_line) else {
                    continue;
                };
                let text = line.text.as_deref().unwrap_or("").trim();
                if text.is_empty() {
                    continue;
                }
                let geometry = line
                    .bounding_box
                    .as_deref()
                    .or(region.bounding_box.as_deref())
                    .and_then(parse_bounding_box);
                let Some((bbox, quad)) = geometry else {
                    continue;
                };

                let mut text_box = TextBox::new(text, bbox)
                    .with_source(Some(line_index), Some(region_index))
                    .with_direction(direction);
                if let Some(quad) = quad {
                    text_box = text_box.with_quad(quad);
                }
                boxes.push(text_box);
            }
        }

        Ok(vec![ctx.page(1, boxes)])
    }
}

/// Parse `"x,y,w,h"` or `"x1,y1,x2,y2,x3,y3,x4,y4"`
pub fn parse_bounding_box(raw: &str) -> Option<(BoundingBox, Option<Quad>)> {
    let values: Vec<f64> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match values.as_slice() {
        &[x, y, w, h] => BoundingBox::from_corners(x, y, x + w, y + h).map(|bbox| (bbox, None)),
        &[x1, y1, x2, y2, x3, y3, x4, y4] => {
            let quad = [
                Point::new(x1, y1),
                Point::new(x2, y2),
                Point::new(x3, y3),
                Point::new(x4, y4),
            ];
            BoundingBox::from_quad(&quad).map(|bbox| (bbox, Some(quad)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rectangle() {
        let (bbox, quad) = parse_bounding_box("100, 50, 400, 80").unwrap();
        assert_eq!(bbox, BoundingBox::new(100, 50, 400, 80));
        assert!(quad.is_none());
    }

    #[test]
    fn test_parse_quad() {
        let (bbox, quad) = parse_bounding_box("10,20,110,20,110,60,10,60").unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 100, 40));
        assert_eq!(quad.unwrap()[2], Point::new(110.0, 60.0));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_bounding_box("1,2,3").is_none());
        assert!(parse_bounding_box("a,b,c,d").is_none());
        assert!(parse_bounding_box("10,10,0,20").is_none());
    }

    #[test]
    fn test_normalize_lines() {
        let doc = json!({
            "Result": {
                "regions": [
                    {
                        "boundingBox": "0,0,1000,200",
                        "dir": "h",
                        "lines": [
                            {"boundingBox": "100,50,400,80", "text": " 第一课 "},
                            {"boundingBox": "100,150,300,40", "text": "   "},
                            {"boundingBox": "100,250,0,40", "text": "zero width"},
                            {"text": "uses region box"}
                        ]
                    },
                    {
                        "dir": "v",
                        "lines": [{"boundingBox": "900,100,50,400", "text": "竖排"}]
                    },
                    "not a region"
                ]
            }
        });

        let pages = YoudaoAdapter
            .normalize(&doc, &NormalizeContext::default())
            .unwrap();
        assert_eq!(pages.len(), 1);
        let boxes = &pages[0].boxes;
        assert_eq!(boxes.len(), 3);

        assert_eq!(boxes[0].text, "第一课");
        assert_eq!(boxes[0].bbox, BoundingBox::new(100, 50, 400, 80));
        assert_eq!(boxes[0].line, Some(0));
        assert_eq!(boxes[0].region, Some(0));

        assert_eq!(boxes[1].text, "uses region box");
        assert_eq!(boxes[1].bbox, BoundingBox::new(0, 0, 1000, 200));

        assert_eq!(boxes[2].direction, TextDirection::Vertical);
        assert_eq!(boxes[2].region, Some(1));

        assert_eq!(pages[0].info.page_width, 1000);
        assert_eq!(pages[0].info.page_height, 500);
    }

    #[test]
    fn test_malformed_result() {
        let doc = json!({"Result": "error"});
        assert!(matches!(
            YoudaoAdapter.normalize(&doc, &NormalizeContext::default()),
            Err(SchemaError::UnrecognizedSchema(_))
        ));
    }
}
