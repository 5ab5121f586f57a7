//! Markdown Renderer module
//!
//! Renders assembled rows as Markdown, one output line per row.

use super::heading::{HeadingClassifier, TableOfContents};
use super::types::{HeadingOptions, RenderOptions, Result};
use crate::layout::{PageRows, Row};

// ============================================================
// Markdown Renderer
// ============================================================

/// Renderer for converting page rows to Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    classifier: HeadingClassifier,
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new renderer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new renderer with specified options
    pub fn with_options(heading: HeadingOptions, options: RenderOptions) -> Result<Self> {
        Ok(Self {
            classifier: HeadingClassifier::new(heading)?,
            options,
        })
    }

    pub fn classifier(&self) -> &HeadingClassifier {
        &self.classifier
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_toc(&mut self, toc: Option<TableOfContents>) {
        self.classifier.set_toc(toc);
    }

    /// Render pages in order; empty pages contribute nothing
    pub fn render_pages(&self, pages: &[PageRows]) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut rendered_any = false;

        for page in pages.iter().filter(|p| !p.is_empty()) {
            if rendered_any {
                if let Some(marker) = &self.options.page_break_marker {
                    lines.push(marker.clone());
                }
            }
            lines.extend(self.render_page(page));
            rendered_any = true;
        }

        lines.join("\n")
    }

    /// Render a single page to Markdown lines
    pub fn render_page(&self, page: &PageRows) -> Vec<String> {
        let levels = self.classifier.classify_page(page);
        let mut lines = Vec::with_capacity(page.rows.len());
        let mut previous: Option<&Row> = None;

        for (row, level) in page.rows.iter().zip(levels) {
            if self.options.preserve_blank_lines {
                if let Some(prev) = previous {
                    let blanks = row.blank_lines_after(prev, page.line_spacing);
                    lines.extend(std::iter::repeat(String::new()).take(blanks));
                }
            }

            lines.push(match level {
                Some(level) => self.render_heading(&row.text, level),
                None => self.render_body(row),
            });
            previous = Some(row);
        }

        lines
    }

    /// Render a heading
    pub fn render_heading(&self, text: &str, level: u8) -> String {
        let level = level.clamp(1, 6) as usize;
        format!("{} {}", "#".repeat(level), text.trim())
    }

    /// Render a body row with its indentation
    pub fn render_body(&self, row: &Row) -> String {
        if self.options.trim_body_indent {
            row.text.clone()
        } else {
            row.line()
        }
    }
}

// ============================================================
// Tests
// ============================================================
