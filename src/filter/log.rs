//! Filter audit log
//!
//! Every rejection is echoed through `tracing` under the `filter_log` target,
//! appended to the log file (flushed per record) and kept in memory.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use super::types::{FilterError, FilterRecord, Result};

/// Default audit log file name
pub const DEFAULT_LOG_FILE: &str = "filter_log.txt";

/// Append-only sink for filter rejections
#[derive(Debug, Default)]
pub struct FilterLog {
    path: Option<PathBuf>,
    file: Option<File>,
    records: Vec<FilterRecord>,
}

impl FilterLog {
    /// Log to `path`, or only to the console and memory when `None`.
    /// The file is opened on the first record.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            file: None,
            records: Vec::new(),
        }
    }

    /// Log to [`DEFAULT_LOG_FILE`] in the working directory
    pub fn with_default_path() -> Self {
        Self::new(Some(PathBuf::from(DEFAULT_LOG_FILE)))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Switch the log file; subsequent records go to the new path
    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.file = None;
        self.path = path;
    }

    /// Record one rejection
    pub fn record(&mut self, record: FilterRecord) -> Result<()> {
        info!(
            target: "filter_log",
            page = record.page_number,
            "{}",
            record
        );

        if let Some(path) = &self.path {
            let map_err = |source: std::io::Error| FilterError::Log {
                path: path.clone(),
                source,
            };
            if self.file.is_none() {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(map_err)?;
                self.file = Some(file);
            }
            if let Some(file) = self.file.as_mut() {
                writeln!(file, "{}", record).map_err(map_err)?;
                file.flush().map_err(map_err)?;
            }
        }

        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[FilterRecord] {
        &self.records
    }

    pub fn take_records(&mut self) -> Vec<FilterRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn clear_records(&mut self) {
        self.records.clear();
    }
}
