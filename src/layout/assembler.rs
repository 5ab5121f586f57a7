//! Line assembly
//!
//! Clusters the boxes of one page into rows by vertical center, orders each
//! row left to right and infers the spacing the OCR engine did not report.
//! Vertical boxes are columns of their own and follow the horizontal rows,
//! rightmost column first.

use std::cmp::Ordering;

use tracing::debug;

use super::types::{LayoutParams, Result, Row};
use crate::normalize::{BoundingBox, TextBox, TextDirection};

/// Groups page boxes into reading-order rows
#[derive(Debug, Clone, Copy, Default)]
pub struct LineAssembler {
    params: LayoutParams,
}

impl LineAssembler {
    pub fn new(params: LayoutParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Assemble rows from the surviving boxes of one page.
    ///
    /// Every box ends up in exactly one row. Horizontal rows come out top to
    /// bottom, ties broken by the leftmost `x`. Each vertical box then becomes
    /// a single-fragment row, ordered right to left.
    pub fn assemble(&self, boxes: Vec<TextBox>) -> Vec<Row> {
        if boxes.is_empty() {
            return Vec::new();
        }

        let box_count = boxes.len();
        let (mut columns, boxes): (Vec<TextBox>, Vec<TextBox>) = boxes
            .into_iter()
            .partition(|b| b.direction == TextDirection::Vertical);
        let text_left = boxes.iter().map(|b| b.x()).min().unwrap_or(0);

        let mut rows: Vec<Row> = self
            .cluster(boxes)
            .into_iter()
            .map(|group| self.build_row(group, text_left))
            .collect();

        rows.sort_by(|a, b| {
            a.center_y
                .total_cmp(&b.center_y)
                .then_with(|| a.bounds.x.cmp(&b.bounds.x))
        });

        columns.sort_by(|a, b| b.x().cmp(&a.x()).then_with(|| a.y().cmp(&b.y())));
        let column_count = columns.len();
        rows.extend(columns.into_iter().map(|column| {
            let left = column.x();
            self.build_row(vec![column], left)
        }));

        debug!(
            boxes = box_count,
            rows = rows.len(),
            columns = column_count,
            threshold = self.params.row_threshold(),
            "assembled rows"
        );
        rows
    }

    /// Sweep boxes sorted by vertical center into bands around a running mean
    fn cluster(&self, mut boxes: Vec<TextBox>) -> Vec<Vec<TextBox>> {
        let threshold = self.params.row_threshold();
        boxes.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));

        let mut groups: Vec<Vec<TextBox>> = Vec::new();
        let mut current: Vec<TextBox> = Vec::new();
        let mut center_sum = 0.0;

        for text_box in boxes {
            let center = text_box.bbox.center_y();
            if !current.is_empty() {
                let mean = center_sum / current.len() as f64;
                if (center - mean).abs() > threshold {
                    groups.push(std::mem::take(&mut current));
                    center_sum = 0.0;
                }
            }
            center_sum += center;
            current.push(text_box);
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups
    }

    fn build_row(&self, mut fragments: Vec<TextBox>, text_left: u32) -> Row {
        fragments.sort_by(|a, b| match a.x().cmp(&b.x()) {
            Ordering::Equal => a.y().cmp(&b.y()),
            other => other,
        });

        let mut text = String::new();
        let mut bounds: Option<BoundingBox> = None;
        let mut previous_right: Option<u32> = None;

        for fragment in &fragments {
            if let Some(right) = previous_right {
                let gap = fragment.x() as f64 - right as f64;
                text.push_str(&" ".repeat(self.params.spaces_for_gap(gap)));
            }
            text.push_str(&fragment.text);
            previous_right = Some(previous_right.map_or(fragment.bbox.right(), |r| {
                r.max(fragment.bbox.right())
            }));
            bounds = Some(match bounds {
                Some(b) => b.merge(&fragment.bbox),
                None => fragment.bbox,
            });
        }

        let bounds = bounds.unwrap_or_default();
        let center_y =
            fragments.iter().map(|f| f.bbox.center_y()).sum::<f64>() / fragments.len().max(1) as f64;
        let indent = self
            .params
            .spaces_for_gap(bounds.x.saturating_sub(text_left) as f64);

        Row {
            fragments,
            text,
            bounds,
            indent,
            center_y,
        }
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(text: &str, x: u32, y: u32, width: u32, height: u32) -> TextBox {
        TextBox::new(text, BoundingBox::new(x, y, width, height))
    }

    fn assembler() -> LineAssembler {
        LineAssembler::new(LayoutParams::default()).unwrap()
    }

    #[test]
    fn test_empty_page() {
        assert!(assembler().assemble(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_box() {
        let rows = assembler().assemble(vec![make_box("alone", 300, 300, 200, 50)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fragment_count(), 1);
        assert_eq!(rows[0].text, "alone");
        assert_eq!(rows[0].indent, 0);
        assert_eq!(rows[0].bounds, BoundingBox::new(300, 300, 200, 50));
    }

    #[test]
    fn test_close_boxes_merge_into_one_row() {
        let rows = assembler().assemble(vec![
            make_box("world", 400, 504, 200, 50),
            make_box("hello", 100, 500, 200, 50),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fragments[0].text, "hello");
        assert_eq!(rows[0].fragments[1].text, "world");
        // 100 px gap = 2 chars = 4 spaces
        assert_eq!(rows[0].text, "hello    world");
        assert_eq!(rows[0].bounds, BoundingBox::new(100, 500, 500, 54));
    }

    #[test]
    fn test_distant_boxes_form_separate_rows() {
        let rows = assembler().assemble(vec![
            make_box("second", 100, 600, 200, 50),
            make_box("first", 100, 500, 200, 50),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "first");
        assert_eq!(rows[1].text, "second");
    }

    #[test]
    fn test_adjacent_fragments_get_no_space() {
        let rows = assembler().assemble(vec![
            make_box("第一", 100, 100, 100, 50),
            make_box("课", 205, 100, 50, 50),
        ]);
        assert_eq!(rows[0].text, "第一课");
    }

    #[test]
    fn test_overlapping_fragments_get_no_space() {
        let rows = assembler().assemble(vec![
            make_box("ab", 100, 100, 100, 50),
            make_box("cd", 150, 100, 100, 50),
        ]);
        assert_eq!(rows[0].text, "abcd");
    }

    #[test]
    fn test_indent_relative_to_text_left() {
        let rows = assembler().assemble(vec![
            make_box("flush", 200, 100, 300, 50),
            make_box("indented", 300, 200, 300, 50),
        ]);
        assert_eq!(rows[0].indent, 0);
        assert_eq!(rows[1].indent, 4);
        assert_eq!(rows[1].line(), "    indented");
        assert_eq!(rows[1].text, "indented");
    }

    #[test]
    fn test_running_mean_keeps_drifting_line_together() {
        // Each box is within the threshold of the running mean.
        let rows = assembler().assemble(vec![
            make_box("a", 100, 500, 50, 50),
            make_box("b", 200, 530, 50, 50),
            make_box("c", 300, 550, 50, 50),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text.replace(' ', ""), "abc");
    }

    #[test]
    fn test_every_box_assigned_once() {
        let boxes: Vec<TextBox> = (0..20)
            .map(|i| make_box(&format!("b{}", i), (i % 4) * 250, (i / 4) * 90 + (i % 3), 200, 50))
            .collect();
        let rows = assembler().assemble(boxes);
        let total: usize = rows.iter().map(Row::fragment_count).sum();
        assert_eq!(total, 20);
        assert_eq!(rows.len(), 5);

        for pair in rows.windows(2) {
            assert!(pair[0].center_y <= pair[1].center_y);
        }
        for row in &rows {
            for pair in row.fragments.windows(2) {
                assert!(pair[0].x() <= pair[1].x());
            }
        }
    }

    #[test]
    fn test_vertical_boxes_become_own_rows() {
        let vertical = |text: &str, x: u32, y: u32| {
            make_box(text, x, y, 50, 400).with_direction(TextDirection::Vertical)
        };
        let rows = assembler().assemble(vec![
            vertical("左列文字", 1200, 500),
            make_box("heading line", 100, 500, 600, 50),
            vertical("右列文字", 1800, 480),
            make_box("body line", 100, 700, 600, 50),
        ]);

        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["heading line", "body line", "右列文字", "左列文字"]);
        assert!(rows.iter().all(|r| r.fragment_count() == 1));
        assert_eq!(rows[2].indent, 0);
        assert_eq!(rows[0].bounds.width, 600);
    }

    #[test]
    fn test_compact_profile_splits_tighter() {
        let params = LayoutParams::new(300, 28.0, 1.5).unwrap();
        let rows = LineAssembler::new(params).unwrap().assemble(vec![
            make_box("a", 100, 500, 50, 28),
            make_box("b", 200, 525, 50, 28),
        ]);
        // threshold 21 px, centers 25 px apart
        assert_eq!(rows.len(), 2);
    }
}
