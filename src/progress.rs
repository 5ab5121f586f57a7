//! Progress display for batch conversion.
//!
//! Drives an `indicatif` bar over the files of a directory and prints the
//! final summary block.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::ProgressCallback;
use crate::converter::{Conversion, ConvertError};

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Normal output (progress bar and summary)
    #[default]
    Normal,
    /// Verbose output (one line per file)
    Verbose,
    /// Very verbose (rejection counts per file)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// Progress tracker for converting a set of OCR files
#[derive(Debug)]
pub struct ProgressTracker {
    bar: ProgressBar,
    total_files: usize,
    start_time: Instant,
    output_mode: OutputMode,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(1, OutputMode::Normal)
    }
}

impl ProgressTracker {
    /// Create a tracker; the bar is only drawn for more than one file
    pub fn new(total_files: usize, output_mode: OutputMode) -> Self {
        let bar = if total_files > 1 && output_mode.should_show(OutputMode::Normal) {
            let bar = ProgressBar::new(total_files as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓▒░  "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            total_files,
            start_time: Instant::now(),
            output_mode,
        }
    }

    pub fn total_files(&self) -> usize {
        self.total_files
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Files handled so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Get elapsed time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Remove the bar from the terminal
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn print_line(&self, line: String) {
        if self.bar.is_hidden() {
            println!("{}", line);
        } else {
            self.bar.println(line);
        }
    }

    /// Print final summary
    pub fn print_summary(
        total_files: usize,
        ok_count: usize,
        skip_count: usize,
        error_count: usize,
    ) {
        println!();
        println!("{}", "=".repeat(80));
        println!("Conversion Summary");
        println!("{}", "=".repeat(80));
        println!("  Total files:  {}", total_files);
        println!("  Succeeded:    {}", ok_count);
        println!("  Skipped:      {}", skip_count);
        println!("  Errors:       {}", error_count);
        println!("{}", "=".repeat(80));
        println!();
    }
}

impl ProgressCallback for ProgressTracker {
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        self.bar.set_message(name.into_owned());
        if self.output_mode.should_show(OutputMode::Verbose) {
            self.print_line(format!("[{}/{}] Converting: {}", index + 1, total, path.display()));
        }
    }

    fn on_file_skipped(&self, path: &Path) {
        self.bar.inc(1);
        if self.output_mode.should_show(OutputMode::Verbose) {
            self.print_line(format!("    Skipping (exists): {}", path.display()));
        }
    }

    fn on_file_complete(&self, path: &Path, conversion: &Conversion) {
        self.bar.inc(1);
        if self.output_mode.should_show(OutputMode::VeryVerbose) {
            self.print_line(format!(
                "    Completed: {} pages, {} rows, {} rejected -> {}",
                conversion.pages.len(),
                conversion.row_count(),
                conversion.rejections.len(),
                path.display()
            ));
        }
    }

    fn on_file_error(&self, path: &Path, error: &ConvertError) {
        self.bar.inc(1);
        if self.output_mode.should_show(OutputMode::Quiet) {
            self.print_line(format!("Error converting {}: {}", path.display(), error));
        }
    }
}
