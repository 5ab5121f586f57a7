//! Built-in predicates
//!
//! Every constructor works for boxes and rows alike. Position predicates use
//! the item's top-left corner and keep everything when the page dimension
//! they depend on is unknown (0). Keyword matching lower-cases the text and
//! removes spaces on both sides.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{FilterError, Filterable, NamedFilter, Result};
use crate::normalize::PageInfo;

// ============================================================
// Constants
// ============================================================

pub const DEFAULT_MIN_WIDTH: u32 = 15;
pub const DEFAULT_MIN_HEIGHT: u32 = 10;
pub const DEFAULT_MAX_HEIGHT: u32 = 100;

/// Top band (fraction of page height) treated as page header
pub const DEFAULT_HEADER_RATIO: f64 = 0.2;

/// Items starting below this fraction of page height are footer
pub const DEFAULT_FOOTER_RATIO: f64 = 0.9;

/// Sidebar width as a fraction of page width
pub const DEFAULT_SIDEBAR_RATIO: f64 = 0.2;

fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(' ', "")
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .iter()
        .map(|k| normalize_text(k))
        .filter(|k| !k.is_empty())
        .collect()
}

fn in_header(y: u32, page: &PageInfo, ratio: f64) -> bool {
    page.page_height > 0 && y as f64 <= ratio * page.page_height as f64
}

fn in_footer(y: u32, page: &PageInfo, ratio: f64) -> bool {
    page.page_height > 0 && y as f64 >= ratio * page.page_height as f64
}

fn contains_all(text: &str, keywords: &[String]) -> bool {
    !keywords.is_empty() && keywords.iter().all(|k| text.contains(k.as_str()))
}

// ============================================================
// Size
// ============================================================

/// Drop items narrower than `min` pixels
pub fn min_width<T: Filterable>(min: u32) -> NamedFilter<T> {
    NamedFilter::new("min_width", move |item: &T, _: &PageInfo| {
        item.bounds().width >= min
    })
}

/// Keep items whose height lies in `min..=max`
pub fn height_range<T: Filterable>(min: u32, max: u32) -> NamedFilter<T> {
    NamedFilter::new("height_range", move |item: &T, _: &PageInfo| {
        (min..=max).contains(&item.bounds().height)
    })
}

/// Keep items whose width / height lies in `min..=max`
pub fn aspect_ratio<T: Filterable>(min: f64, max: f64) -> NamedFilter<T> {
    NamedFilter::new("aspect_ratio", move |item: &T, _: &PageInfo| {
        let ratio = item.bounds().aspect_ratio();
        ratio >= min && ratio <= max
    })
}

// ============================================================
// Position
// ============================================================

/// Drop items starting in the top `ratio` of the page
pub fn header_band<T: Filterable>(ratio: f64) -> NamedFilter<T> {
    NamedFilter::new("header_band", move |item: &T, page: &PageInfo| {
        !in_header(item.bounds().y, page, ratio)
    })
}

/// Drop items starting at or below `ratio` of the page height
pub fn footer_band<T: Filterable>(ratio: f64) -> NamedFilter<T> {
    NamedFilter::new("footer_band", move |item: &T, page: &PageInfo| {
        !in_footer(item.bounds().y, page, ratio)
    })
}

/// Drop items starting in the left `ratio` of the page
pub fn left_sidebar<T: Filterable>(ratio: f64) -> NamedFilter<T> {
    NamedFilter::new("left_sidebar", move |item: &T, page: &PageInfo| {
        page.page_width == 0 || item.bounds().x as f64 >= ratio * page.page_width as f64
    })
}

/// Drop items starting in the right `ratio` of the page
pub fn right_sidebar<T: Filterable>(ratio: f64) -> NamedFilter<T> {
    NamedFilter::new("right_sidebar", move |item: &T, page: &PageInfo| {
        page.page_width == 0
            || item.bounds().x as f64 <= (1.0 - ratio) * page.page_width as f64
    })
}

// ============================================================
// Content
// ============================================================

/// Drop header items containing every keyword
pub fn header_keywords<T: Filterable>(ratio: f64, keywords: Vec<String>) -> NamedFilter<T> {
    let keywords = normalize_keywords(keywords);
    NamedFilter::new("header_keywords", move |item: &T, page: &PageInfo| {
        !(in_header(item.bounds().y, page, ratio)
            && contains_all(&normalize_text(item.text()), &keywords))
    })
}

/// Drop footer items containing every keyword
pub fn footer_keywords<T: Filterable>(ratio: f64, keywords: Vec<String>) -> NamedFilter<T> {
    let keywords = normalize_keywords(keywords);
    NamedFilter::new("footer_keywords", move |item: &T, page: &PageInfo| {
        !(in_footer(item.bounds().y, page, ratio)
            && contains_all(&normalize_text(item.text()), &keywords))
    })
}

/// Drop all-digit items in the footer band
pub fn page_number<T: Filterable>(ratio: f64) -> NamedFilter<T> {
    NamedFilter::new("page_number", move |item: &T, page: &PageInfo| {
        let digits = item.text().replace(' ', "");
        !(in_footer(item.bounds().y, page, ratio)
            && !digits.is_empty()
            && digits.chars().all(|c| c.is_numeric()))
    })
}

/// Drop items containing any keyword
pub fn any_keyword<T: Filterable>(keywords: Vec<String>) -> NamedFilter<T> {
    let keywords = normalize_keywords(keywords);
    NamedFilter::new("any_keyword", move |item: &T, _: &PageInfo| {
        let text = normalize_text(item.text());
        !keywords.iter().any(|k| text.contains(k.as_str()))
    })
}

/// Drop items containing every keyword
pub fn all_keywords<T: Filterable>(keywords: Vec<String>) -> NamedFilter<T> {
    let keywords = normalize_keywords(keywords);
    NamedFilter::new("all_keywords", move |item: &T, _: &PageInfo| {
        !contains_all(&normalize_text(item.text()), &keywords)
    })
}

/// Drop items whose text matches a regular expression
pub fn pattern<T: Filterable>(pattern: &str) -> Result<NamedFilter<T>> {
    let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(NamedFilter::new("pattern", move |item: &T, _: &PageInfo| {
        !regex.is_match(item.text())
    }))
}

/// Drop items recognized with a confidence below `min`
pub fn min_confidence<T: Filterable>(min: f64) -> NamedFilter<T> {
    NamedFilter::new("min_confidence", move |item: &T, _: &PageInfo| {
        item.confidence() >= min
    })
}

// ============================================================
// Declarative Specs
// ============================================================

fn default_header_ratio() -> f64 {
    DEFAULT_HEADER_RATIO
}

fn default_footer_ratio() -> f64 {
    DEFAULT_FOOTER_RATIO
}

fn default_sidebar_ratio() -> f64 {
    DEFAULT_SIDEBAR_RATIO
}

fn default_min_width() -> u32 {
    DEFAULT_MIN_WIDTH
}

fn default_min_height() -> u32 {
    DEFAULT_MIN_HEIGHT
}

fn default_max_height() -> u32 {
    DEFAULT_MAX_HEIGHT
}

/// A built-in filter described in configuration
///
/// ```toml
/// [[filters.row]]
/// kind = "page_number"
///
/// [[filters.row]]
/// kind = "header_keywords"
/// keywords = ["语文", "六年级上册"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    MinWidth {
        #[serde(default = "default_min_width")]
        min: u32,
    },
    HeightRange {
        #[serde(default = "default_min_height")]
        min: u32,
        #[serde(default = "default_max_height")]
        max: u32,
    },
    AspectRatio {
        min: f64,
        max: f64,
    },
    HeaderBand {
        #[serde(default = "default_header_ratio")]
        ratio: f64,
    },
    FooterBand {
        #[serde(default = "default_footer_ratio")]
        ratio: f64,
    },
    LeftSidebar {
        #[serde(default = "default_sidebar_ratio")]
        ratio: f64,
    },
    RightSidebar {
        #[serde(default = "default_sidebar_ratio")]
        ratio: f64,
    },
    HeaderKeywords {
        #[serde(default = "default_header_ratio")]
        ratio: f64,
        keywords: Vec<String>,
    },
    FooterKeywords {
        #[serde(default = "default_footer_ratio")]
        ratio: f64,
        keywords: Vec<String>,
    },
    PageNumber {
        #[serde(default = "default_footer_ratio")]
        ratio: f64,
    },
    AnyKeyword {
        keywords: Vec<String>,
    },
    AllKeywords {
        keywords: Vec<String>,
    },
    Pattern {
        pattern: String,
    },
    MinConfidence {
        min: f64,
    },
}

impl FilterSpec {
    /// Build the predicate this entry describes
    pub fn build<T: Filterable>(&self) -> Result<NamedFilter<T>> {
        let filter = match self {
            FilterSpec::MinWidth { min } => min_width(*min),
            FilterSpec::HeightRange { min, max } => height_range(*min, *max),
            FilterSpec::AspectRatio { min, max } => aspect_ratio(*min, *max),
            FilterSpec::HeaderBand { ratio } => header_band(*ratio),
            FilterSpec::FooterBand { ratio } => footer_band(*ratio),
            FilterSpec::LeftSidebar { ratio } => left_sidebar(*ratio),
            FilterSpec::RightSidebar { ratio } => right_sidebar(*ratio),
            FilterSpec::HeaderKeywords { ratio, keywords } => {
                header_keywords(*ratio, keywords.clone())
            }
            FilterSpec::FooterKeywords { ratio, keywords } => {
                footer_keywords(*ratio, keywords.clone())
            }
            FilterSpec::PageNumber { ratio } => page_number(*ratio),
            FilterSpec::AnyKeyword { keywords } => any_keyword(keywords.clone()),
            FilterSpec::AllKeywords { keywords } => all_keywords(keywords.clone()),
            FilterSpec::Pattern { pattern: p } => pattern(p)?,
            FilterSpec::MinConfidence { min } => min_confidence(*min),
        };
        Ok(filter)
    }
}

/// Build a list of specs, failing on the first invalid one
pub fn build_all<T: Filterable>(specs: &[FilterSpec]) -> Result<Vec<NamedFilter<T>>> {
    specs.iter().map(FilterSpec::build::<T>).collect()
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{BoundingBox, TextBox};

    const PAGE: PageInfo = PageInfo {
        page_number: 1,
        page_width: 2000,
        page_height: 3000,
    };

    fn make_box(text: &str, x: u32, y: u32, width: u32, height: u32) -> TextBox {
        TextBox::new(text, BoundingBox::new(x, y, width, height))
    }

    fn keeps(filter: &NamedFilter<TextBox>, item: &TextBox, page: &PageInfo) -> bool {
        filter.check(item, page).unwrap()
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_size_filters() {
        let width = min_width(DEFAULT_MIN_WIDTH);
        assert!(!keeps(&width, &make_box("a", 0, 0, 14, 40), &PAGE));
        assert!(keeps(&width, &make_box("a", 0, 0, 15, 40), &PAGE));

        let height = height_range(DEFAULT_MIN_HEIGHT, DEFAULT_MAX_HEIGHT);
        assert!(!keeps(&height, &make_box("a", 0, 0, 50, 9), &PAGE));
        assert!(keeps(&height, &make_box("a", 0, 0, 50, 100), &PAGE));
        assert!(!keeps(&height, &make_box("a", 0, 0, 50, 101), &PAGE));

        let aspect = aspect_ratio(0.5, 20.0);
        assert!(!keeps(&aspect, &make_box("|", 0, 0, 5, 100), &PAGE));
        assert!(keeps(&aspect, &make_box("word", 0, 0, 200, 50), &PAGE));
    }

    #[test]
    fn test_band_filters() {
        let header = header_band(0.1);
        assert!(!keeps(&header, &make_box("h", 100, 200, 50, 50), &PAGE));
        assert!(keeps(&header, &make_box("h", 100, 400, 50, 50), &PAGE));

        let footer = footer_band(DEFAULT_FOOTER_RATIO);
        assert!(!keeps(&footer, &make_box("f", 100, 2700, 50, 50), &PAGE));
        assert!(keeps(&footer, &make_box("f", 100, 2699, 50, 50), &PAGE));
    }

    #[test]
    fn test_sidebar_filters() {
        let left = left_sidebar(DEFAULT_SIDEBAR_RATIO);
        let right = right_sidebar(DEFAULT_SIDEBAR_RATIO);
        let side = make_box("s", 100, 1000, 50, 50);
        let middle = make_box("m", 1000, 1000, 50, 50);
        let far = make_box("r", 1700, 1000, 50, 50);

        assert!(!keeps(&left, &side, &PAGE));
        assert!(keeps(&left, &middle, &PAGE));
        assert!(keeps(&right, &middle, &PAGE));
        assert!(!keeps(&right, &far, &PAGE));
    }

    #[test]
    fn test_unknown_page_size_keeps_everything() {
        let page = PageInfo::new(1, 0, 0);
        let item = make_box("12", 0, 0, 10, 10);
        assert!(keeps(&header_band(0.2), &item, &page));
        assert!(keeps(&footer_band(0.9), &item, &page));
        assert!(keeps(&left_sidebar(0.2), &item, &page));
        assert!(keeps(&right_sidebar(0.2), &item, &page));
        assert!(keeps(&page_number(0.9), &item, &page));
    }

    #[test]
    fn test_header_keywords() {
        let filter = header_keywords(DEFAULT_HEADER_RATIO, words(&["语文", "六年级上册"]));
        assert!(!keeps(&filter, &make_box("语文 六年级 上册", 100, 100, 500, 50), &PAGE));
        assert!(keeps(&filter, &make_box("语文", 100, 100, 500, 50), &PAGE));
        assert!(keeps(&filter, &make_box("语文六年级上册", 100, 1500, 500, 50), &PAGE));
    }

    #[test]
    fn test_footer_keywords() {
        let filter = footer_keywords(DEFAULT_FOOTER_RATIO, words(&["时间", "语文·六年级上册"]));
        assert!(!keeps(&filter, &make_box("时间 语文·六年级上册", 100, 2800, 500, 50), &PAGE));
        assert!(keeps(&filter, &make_box("时间", 100, 2800, 500, 50), &PAGE));
    }

    #[test]
    fn test_page_number() {
        let filter = page_number(DEFAULT_FOOTER_RATIO);
        assert!(!keeps(&filter, &make_box("1 2", 1000, 2900, 60, 40), &PAGE));
        assert!(keeps(&filter, &make_box("12a", 1000, 2900, 60, 40), &PAGE));
        assert!(keeps(&filter, &make_box("12", 1000, 1000, 60, 40), &PAGE));
    }

    #[test]
    fn test_keyword_filters() {
        let any = any_keyword(words(&["Answer", "时间"]));
        assert!(!keeps(&any, &make_box("the ANSWER key", 0, 0, 10, 10), &PAGE));
        assert!(keeps(&any, &make_box("question", 0, 0, 10, 10), &PAGE));

        let all = all_keywords(words(&["语文", "上册"]));
        assert!(!keeps(&all, &make_box("语文上册", 0, 0, 10, 10), &PAGE));
        assert!(keeps(&all, &make_box("语文", 0, 0, 10, 10), &PAGE));

        let empty = all_keywords::<TextBox>(Vec::new());
        assert!(keeps(&empty, &make_box("anything", 0, 0, 10, 10), &PAGE));
    }

    #[test]
    fn test_pattern_filter() {
        let filter = pattern::<TextBox>(r"^第\d+页$").unwrap();
        assert!(!keeps(&filter, &make_box("第12页", 0, 0, 10, 10), &PAGE));
        assert!(keeps(&filter, &make_box("第一课", 0, 0, 10, 10), &PAGE));

        assert!(matches!(
            pattern::<TextBox>("(unclosed"),
            Err(FilterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_min_confidence() {
        let filter = min_confidence(0.6);
        assert!(!keeps(&filter, &make_box("x", 0, 0, 10, 10).with_confidence(0.3), &PAGE));
        assert!(keeps(&filter, &make_box("x", 0, 0, 10, 10), &PAGE));
    }

    #[test]
    fn test_filter_spec_from_toml() {
        #[derive(Deserialize)]
        struct Specs {
            filters: Vec<FilterSpec>,
        }

        let specs: Specs = toml::from_str(
            r#"
            [[filters]]
            kind = "page_number"

            [[filters]]
            kind = "header_keywords"
            keywords = ["语文", "六年级上册"]

            [[filters]]
            kind = "min_width"
            min = 20
            "#,
        )
        .unwrap();

        assert_eq!(
            specs.filters[0],
            FilterSpec::PageNumber {
                ratio: DEFAULT_FOOTER_RATIO
            }
        );
        assert_eq!(specs.filters[2], FilterSpec::MinWidth { min: 20 });

        let built = build_all::<TextBox>(&specs.filters).unwrap();
        let names: Vec<&str> = built.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["page_number", "header_keywords", "min_width"]);
    }
}
