//! Page merging
//!
//! Concatenates the per-page Markdown files of a directory into one book.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::{MarkdownError, Result};

/// Default separator between merged files
pub const DEFAULT_PAGE_BREAK_MARKER: &str = "---";

/// Order of the merged files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeSortOrder {
    /// Natural file name order (`page2` before `page10`)
    #[default]
    Name,
    /// Modification time
    Mtime,
    /// Creation time
    Ctime,
}

/// Options for merging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Output file (default: `<dir name>.md` next to the input directory)
    pub output: Option<PathBuf>,
    pub page_breaks: bool,
    pub page_break_marker: String,
    pub sort: MergeSortOrder,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            output: None,
            page_breaks: true,
            page_break_marker: DEFAULT_PAGE_BREAK_MARKER.to_string(),
            sort: MergeSortOrder::Name,
        }
    }
}

/// One run of a file name: digits compare by value, text case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalChunk {
    Number(u64),
    Text(String),
}

/// Sort key ordering `file9.md` before `file10.md`
pub fn natural_sort_key(name: &str) -> Vec<NaturalChunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    let mut flush = |current: &mut String, digits: bool| {
        if current.is_empty() {
            return;
        }
        let chunk = if digits {
            NaturalChunk::Number(current.parse().unwrap_or(u64::MAX))
        } else {
            NaturalChunk::Text(current.to_lowercase())
        };
        chunks.push(chunk);
        current.clear();
    };

    for c in name.chars() {
        let digit = c.is_ascii_digit();
        if digit != in_digits {
            flush(&mut current, in_digits);
            in_digits = digit;
        }
        current.push(c);
    }
    flush(&mut current, in_digits);

    chunks
}

/// Merges the Markdown files of one directory
#[derive(Debug, Clone)]
pub struct MarkdownMerger {
    input_dir: PathBuf,
    options: MergeOptions,
}

impl MarkdownMerger {
    pub fn new(input_dir: impl Into<PathBuf>, options: MergeOptions) -> Result<Self> {
        let input_dir = input_dir.into();
        if !input_dir.exists() {
            return Err(MarkdownError::InputDirNotFound(input_dir));
        }
        if !input_dir.is_dir() {
            return Err(MarkdownError::NotADirectory(input_dir));
        }
        Ok(Self { input_dir, options })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Where the merged book is written
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.options.output {
            return output.clone();
        }
        let name = self
            .input_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "merged".to_string());
        let parent = self.input_dir.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.md", name))
    }

    /// `.md` / `.markdown` files of the directory in merge order
    pub fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.input_dir)? {
            let path = entry?.path();
            let is_markdown = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
            if path.is_file() && is_markdown {
                files.push(path);
            }
        }

        match self.options.sort {
            MergeSortOrder::Name => {
                files.sort_by_cached_key(|p| {
                    natural_sort_key(&p.file_name().unwrap_or_default().to_string_lossy())
                });
            }
            MergeSortOrder::Mtime | MergeSortOrder::Ctime => {
                let mut timed = files
                    .into_iter()
                    .map(|path| Ok((self.file_time(&path)?, path)))
                    .collect::<Result<Vec<(SystemTime, PathBuf)>>>()?;
                timed.sort_by(|a, b| match a.0.cmp(&b.0) {
                    Ordering::Equal => a.1.cmp(&b.1),
                    other => other,
                });
                files = timed.into_iter().map(|(_, path)| path).collect();
            }
        }

        Ok(files)
    }

    fn file_time(&self, path: &Path) -> Result<SystemTime> {
        let metadata = fs::metadata(path)?;
        let time = match self.options.sort {
            MergeSortOrder::Ctime => metadata.created().or_else(|_| metadata.modified())?,
            _ => metadata.modified()?,
        };
        Ok(time)
    }

    /// Concatenate the files; unreadable files are skipped with a warning
    pub fn merge_content(&self) -> Result<String> {
        let files = self.markdown_files()?;
        if files.is_empty() {
            warn!(dir = %self.input_dir.display(), "no markdown files to merge");
            return Ok(String::new());
        }

        let mut parts: Vec<String> = Vec::with_capacity(files.len() * 2);
        for (i, path) in files.iter().enumerate() {
            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            let content = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %path.display(), "file is not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };

            let name = path.file_name().unwrap_or_default().to_string_lossy();
            parts.push(format!("<!-- 文件: {} -->\n{}", name, content));

            if self.options.page_breaks && i + 1 < files.len() {
                parts.push(format!("\n{}\n", self.options.page_break_marker));
            }
        }

        Ok(parts.join("\n"))
    }

    /// Merge and write the book; returns the merged content
    pub fn merge(&self) -> Result<String> {
        let content = self.merge_content()?;
        if content.is_empty() {
            return Ok(content);
        }

        let output = self.output_path();
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, &content)?;
        info!(output = %output.display(), "merged markdown files");
        Ok(content)
    }
}
