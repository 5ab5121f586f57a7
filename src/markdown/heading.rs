//! Heading classification
//!
//! A row becomes a heading by the first rule that matches, in this order:
//!
//! 1. its text is an entry of the table of contents
//! 2. it matches a question-line pattern such as `一、`
//! 3. its height, relative to the page's median row height, falls in a size band
//! 4. it is taller than the absolute `min_heading_height`
//! 5. it is a short, centered line without trailing body punctuation

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{HeadingOptions, MarkdownError, Result, SizeBand};
use crate::layout::{PageRows, Row};
use crate::normalize::PageInfo;

/// Dot leaders and the page number that follows them in a table of contents
static TOC_LEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[…\.]{2,}\s*\d*|…\s*\d*").expect("valid leader regex"));

static TOC_PAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+$").expect("valid page regex"));

const MAX_HEADING_LEVEL: u8 = 6;

// ============================================================
// Table of Contents
// ============================================================

/// One table-of-contents line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub name: String,
    pub page: Option<u32>,
}

/// Heading names with levels, parsed from an indented listing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    /// Parse an indented listing.
    ///
    /// The distinct leading-space counts, sorted ascending, become levels
    /// `start_level`, `start_level + 1`, ... Dot leaders and trailing page
    /// numbers are removed from the names.
    ///
    /// ```text
    /// 第一单元 …………………… 1
    ///     1 课文名称 …………… 3
    /// 第二单元 …………………… 10
    /// ```
    pub fn parse(contents: &str, start_level: u8) -> Self {
        let mut raw: Vec<(usize, String, Option<u32>)> = Vec::new();

        for line in contents.lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            let page = TOC_PAGE_REGEX
                .find(line)
                .and_then(|m| m.as_str().parse().ok());
            let name = TOC_LEADER_REGEX.replace_all(line, "").trim().to_string();
            if name.is_empty() {
                continue;
            }
            raw.push((indent, name, page));
        }

        let mut indents: Vec<usize> = raw.iter().map(|(indent, _, _)| *indent).collect();
        indents.sort_unstable();
        indents.dedup();

        let entries = raw
            .into_iter()
            .map(|(indent, name, page)| {
                let depth = indents.iter().position(|i| *i == indent).unwrap_or(0);
                let level = (start_level as usize + depth).clamp(1, MAX_HEADING_LEVEL as usize);
                TocEntry {
                    level: level as u8,
                    name,
                    page,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Level of the entry matching `text` (spaces ignored).
    ///
    /// With `similarity < 1.0` the closest entry whose normalized Levenshtein
    /// similarity reaches the threshold also matches.
    pub fn level_of(&self, text: &str, similarity: f64) -> Option<u8> {
        let wanted = text.replace(' ', "");
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<(f64, u8)> = None;
        for entry in &self.entries {
            let name = entry.name.replace(' ', "");
            if name == wanted {
                return Some(entry.level);
            }
            if similarity < 1.0 {
                let score = strsim::normalized_levenshtein(&name, &wanted);
                if score >= similarity && best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, entry.level));
                }
            }
        }
        best.map(|(_, level)| level)
    }
}

// ============================================================
// Heading Classifier
// ============================================================

/// Decides which rows are headings and at which level
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    options: HeadingOptions,
    /// Bands sorted by descending ratio
    bands: Vec<SizeBand>,
    question_patterns: Vec<Regex>,
    toc: Option<TableOfContents>,
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        let options = HeadingOptions::default();
        Self {
            bands: sorted_bands(&options.size_bands),
            question_patterns: options
                .question_patterns
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect(),
            options,
            toc: None,
        }
    }
}

fn sorted_bands(bands: &[SizeBand]) -> Vec<SizeBand> {
    let mut bands = bands.to_vec();
    bands.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    bands
}

fn check_level(name: &str, level: u8) -> Result<()> {
    if (1..=MAX_HEADING_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(MarkdownError::InvalidOption(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_HEADING_LEVEL, level
        )))
    }
}

impl HeadingClassifier {
    /// Create a classifier, compiling patterns and validating levels
    pub fn new(options: HeadingOptions) -> Result<Self> {
        for band in &options.size_bands {
            check_level("size band level", band.level)?;
            if !(band.ratio.is_finite() && band.ratio > 0.0) {
                return Err(MarkdownError::InvalidOption(format!(
                    "size band ratio must be positive, got {}",
                    band.ratio
                )));
            }
        }
        check_level("centered_level", options.centered_level)?;
        check_level("question_level", options.question_level)?;

        let question_patterns = options
            .question_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| MarkdownError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bands: sorted_bands(&options.size_bands),
            question_patterns,
            options,
            toc: None,
        })
    }

    pub fn options(&self) -> &HeadingOptions {
        &self.options
    }

    pub fn toc(&self) -> Option<&TableOfContents> {
        self.toc.as_ref()
    }

    pub fn set_toc(&mut self, toc: Option<TableOfContents>) {
        self.toc = toc.filter(|t| !t.is_empty());
    }

    /// Median row height of a page (0 for an empty page)
    ///
    /// Even counts take the lower middle value so that a page holding one
    /// title and one body line measures the title against the body.
    pub fn typical_row_height(rows: &[Row]) -> f64 {
        let mut heights: Vec<u32> = rows.iter().map(|r| r.bounds.height).collect();
        if heights.is_empty() {
            return 0.0;
        }
        heights.sort_unstable();
        heights[(heights.len() - 1) / 2] as f64
    }

    /// Level of the first band whose ratio is reached
    pub fn level_for_ratio(&self, ratio: f64) -> Option<u8> {
        self.bands
            .iter()
            .find(|band| ratio >= band.ratio)
            .map(|band| band.level)
    }

    /// Heading level of a row, or `None` for body text
    pub fn classify(&self, row: &Row, page: &PageInfo, typical_height: f64) -> Option<u8> {
        self.classify_in_span(row, page, typical_height, None)
    }

    fn classify_in_span(
        &self,
        row: &Row,
        page: &PageInfo,
        typical_height: f64,
        content: Option<(f64, f64)>,
    ) -> Option<u8> {
        let text = row.text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(level) = self
            .toc
            .as_ref()
            .and_then(|toc| toc.level_of(text, self.options.toc_similarity))
        {
            return Some(level);
        }

        if self.question_patterns.iter().any(|re| re.is_match(text)) {
            return Some(self.options.question_level);
        }

        let height = row.bounds.height as f64;
        if typical_height > 0.0 {
            if let Some(level) = self.level_for_ratio(height / typical_height) {
                return Some(level);
            }
        }

        if let Some(threshold) = self.options.min_heading_height.filter(|t| *t > 0.0) {
            if height > threshold {
                let deepest = self.bands.last().map_or(1, |band| band.level);
                return Some(self.level_for_ratio(height / threshold).unwrap_or(deepest));
            }
        }

        if self.options.detect_centered {
            let page_span = (0.0, page.page_width as f64);
            let centered = self.is_centered_title(row, text, page_span)
                || content.is_some_and(|span| self.is_centered_title(row, text, span));
            if centered {
                return Some(self.options.centered_level);
            }
        }

        None
    }

    /// Classify every row of a page against the page's median row height
    ///
    /// Short lines also count as centered when they sit in the middle of
    /// the page's text block, which matters when the page width was taken
    /// from the content extent and so ignores the left margin.
    pub fn classify_page(&self, page: &PageRows) -> Vec<Option<u8>> {
        let typical = Self::typical_row_height(&page.rows);
        let content = content_span(&page.rows);
        page.rows
            .iter()
            .map(|row| self.classify_in_span(row, &page.info, typical, content))
            .collect()
    }

    /// Whether a row is a short title centered within `(left, right)`
    fn is_centered_title(&self, row: &Row, text: &str, (left, right): (f64, f64)) -> bool {
        let span_width = right - left;
        if span_width <= 0.0 {
            return false;
        }
        let opts = &self.options;

        let short = row.fragments.len() <= opts.max_centered_fragments
            && text.chars().count() <= opts.max_centered_chars
            && row.bounds.width as f64 <= opts.max_centered_width_ratio * span_width;
        let centered = (row.bounds.center_x() - (left + right) / 2.0).abs()
            <= opts.center_tolerance * span_width;
        let prose_ending = text
            .chars()
            .last()
            .is_some_and(|c| opts.body_punctuation.contains(c));
        let has_letters = text.chars().any(char::is_alphabetic);

        short && centered && !prose_ending && has_letters
    }
}

/// Horizontal extent of the text on a page, if there are at least two rows
fn content_span(rows: &[Row]) -> Option<(f64, f64)> {
    if rows.len() < 2 {
        return None;
    }
    let left = rows.iter().map(|r| r.bounds.x).min()?;
    let right = rows.iter().map(|r| r.bounds.right()).max()?;
    Some((left as f64, right as f64))
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{BoundingBox, TextBox};

    fn make_row(text: &str, x: u32, y: u32, width: u32, height: u32) -> Row {
        let bbox = BoundingBox::new(x, y, width, height);
        Row {
            fragments: vec![TextBox::new(text, bbox)],
            text: text.to_string(),
            bounds: bbox,
            indent: 0,
            center_y: bbox.center_y(),
        }
    }

    const PAGE: PageInfo = PageInfo {
        page_number: 1,
        page_width: 2000,
        page_height: 3000,
    };

    #[test]
    fn test_parse_toc() {
        let toc = TableOfContents::parse(
            "第一单元 ……………………………………  1\n    1 课文名称 ……………………………………  3\n\n    2    另一课……………………………………8\n第二单元 ……………………………………  10\n",
            1,
        );
        let entries = toc.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].name, "第一单元");
        assert_eq!(entries[0].level, 1);
        assert_eq!(entries[0].page, Some(1));
        assert_eq!(entries[1].name, "1 课文名称");
        assert_eq!(entries[1].level, 2);
        assert_eq!(entries[2].page, Some(8));
        assert_eq!(entries[3].level, 1);
    }

    #[test]
    fn test_toc_start_level() {
        let toc = TableOfContents::parse("    语文园地五\n        学会运用\n", 2);
        assert_eq!(toc.level_of("语文园地五", 1.0), Some(2));
        assert_eq!(toc.level_of("学会 运用", 1.0), Some(3));
        assert_eq!(toc.level_of("不在目录", 1.0), None);
    }

    #[test]
    fn test_toc_fuzzy_match() {
        let toc = TableOfContents::parse("口语交际：请你帮个忙\n", 1);
        assert_eq!(toc.level_of("口语交际:请你帮个忙", 1.0), None);
        assert_eq!(toc.level_of("口语交际:请你帮个忙", 0.8), Some(1));
    }

    #[test]
    fn test_level_for_ratio() {
        let classifier = HeadingClassifier::default();
        assert_eq!(classifier.level_for_ratio(2.5), Some(1));
        assert_eq!(classifier.level_for_ratio(2.0), Some(2));
        assert_eq!(classifier.level_for_ratio(1.5), Some(3));
        assert_eq!(classifier.level_for_ratio(1.25), Some(4));
        assert_eq!(classifier.level_for_ratio(1.0), None);
    }

    #[test]
    fn test_typical_row_height() {
        let rows = vec![
            make_row("a", 0, 0, 10, 40),
            make_row("b", 0, 0, 10, 50),
            make_row("c", 0, 0, 10, 120),
        ];
        assert_eq!(HeadingClassifier::typical_row_height(&rows), 50.0);
        assert_eq!(HeadingClassifier::typical_row_height(&[]), 0.0);

        let even = vec![
            make_row("a", 0, 0, 10, 130),
            make_row("b", 0, 0, 10, 40),
            make_row("c", 0, 0, 10, 120),
            make_row("d", 0, 0, 10, 50),
        ];
        assert_eq!(HeadingClassifier::typical_row_height(&even), 50.0);
    }

    #[test]
    fn test_two_row_page_title_is_heading() {
        let classifier = HeadingClassifier::default();
        let page = PageRows::new(
            PAGE,
            vec![
                make_row("第一章", 200, 100, 400, 150),
                make_row("正文内容在这里继续写下去。", 200, 400, 1500, 50),
            ],
            75.0,
        );
        assert_eq!(HeadingClassifier::typical_row_height(&page.rows), 50.0);
        assert_eq!(classifier.classify_page(&page), vec![Some(1), None]);
    }

    #[test]
    fn test_size_band_heading() {
        let classifier = HeadingClassifier::default();
        let title = make_row("Chapter One", 100, 100, 900, 125);
        assert_eq!(classifier.classify(&title, &PAGE, 50.0), Some(1));

        let body = make_row("Body text line", 100, 300, 900, 50);
        assert_eq!(classifier.classify(&body, &PAGE, 50.0), None);
    }

    #[test]
    fn test_absolute_threshold() {
        let options = HeadingOptions::builder().min_heading_height(60.0).build();
        let classifier = HeadingClassifier::new(options).unwrap();
        let row = make_row("Title", 100, 50, 400, 80);
        // Sole row on the page: median equals its own height.
        assert_eq!(classifier.classify(&row, &PAGE, 80.0), Some(4));

        let big = make_row("Title", 100, 50, 400, 100);
        assert_eq!(classifier.classify(&big, &PAGE, 100.0), Some(3));
    }

    #[test]
    fn test_question_line() {
        let classifier = HeadingClassifier::default();
        let row = make_row("三、阅读短文，回答问题。", 100, 100, 1500, 50);
        assert_eq!(classifier.classify(&row, &PAGE, 50.0), Some(4));
    }

    #[test]
    fn test_centered_title() {
        let classifier = HeadingClassifier::default();
        let centered = make_row("第一课", 900, 100, 200, 50);
        assert_eq!(classifier.classify(&centered, &PAGE, 50.0), Some(3));

        let prose = make_row("好。", 950, 100, 100, 50);
        assert_eq!(classifier.classify(&prose, &PAGE, 50.0), None);

        let number = make_row("12", 980, 100, 40, 50);
        assert_eq!(classifier.classify(&number, &PAGE, 50.0), None);

        let left = make_row("第一课", 100, 100, 200, 50);
        assert_eq!(classifier.classify(&left, &PAGE, 50.0), None);

        let unknown_width = PageInfo::new(1, 0, 0);
        assert_eq!(classifier.classify(&centered, &unknown_width, 50.0), None);
    }

    #[test]
    fn test_centered_within_text_block() {
        // Width taken from the rightmost edge, so the left margin is missing.
        let derived = PageInfo::new(1, 1000, 1500);
        let classifier = HeadingClassifier::default();
        let title = make_row("第一课", 500, 100, 200, 50);
        let page = PageRows::new(
            derived,
            vec![
                title.clone(),
                make_row("body line of text here.", 200, 300, 800, 50),
                make_row("第二课", 200, 500, 200, 50),
                make_row("another body line here.", 200, 700, 800, 50),
            ],
            75.0,
        );

        assert_eq!(classifier.classify(&title, &derived, 50.0), None);
        assert_eq!(
            classifier.classify_page(&page),
            vec![Some(3), None, None, None]
        );
    }

    #[test]
    fn test_single_row_needs_page_center() {
        let classifier = HeadingClassifier::default();
        let page = PageRows::new(
            PageInfo::new(1, 1000, 1500),
            vec![make_row("第一课", 500, 100, 200, 50)],
            75.0,
        );
        assert_eq!(classifier.classify_page(&page), vec![None]);
    }

    #[test]
    fn test_default_uses_default_options() {
        let default = HeadingClassifier::default();
        let built = HeadingClassifier::new(HeadingOptions::default()).unwrap();
        assert_eq!(default.options(), built.options());
        assert_eq!(
            default.question_patterns.len(),
            default.options().question_patterns.len()
        );

        let row = make_row("一、看拼音写词语", 100, 100, 1500, 50);
        assert_eq!(default.classify(&row, &PAGE, 50.0), Some(4));
        assert_eq!(built.classify(&row, &PAGE, 50.0), Some(4));
    }

    #[test]
    fn test_toc_takes_precedence() {
        let mut classifier = HeadingClassifier::default();
        classifier.set_toc(Some(TableOfContents::parse("一、字词练习\n", 2)));
        let row = make_row("一、字词练习", 100, 100, 600, 50);
        assert_eq!(classifier.classify(&row, &PAGE, 50.0), Some(2));
    }

    #[test]
    fn test_invalid_options() {
        let bad_level = HeadingOptions::builder().centered_level(0).build();
        assert!(matches!(
            HeadingClassifier::new(bad_level),
            Err(MarkdownError::InvalidOption(_))
        ));

        let bad_pattern = HeadingOptions::builder().question_pattern("([").build();
        assert!(matches!(
            HeadingClassifier::new(bad_pattern),
            Err(MarkdownError::InvalidPattern { .. })
        ));
    }
}
