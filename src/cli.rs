//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::CliOverrides;
use crate::layout::LayoutProfile;
use crate::markdown::merge::DEFAULT_PAGE_BREAK_MARKER;
use crate::markdown::{MergeOptions, MergeSortOrder};
use crate::normalize::OcrFormat;

/// Exit codes for the CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const SCHEMA_ERROR: i32 = 4;
}

/// Rebuild reading-order text from OCR JSON and write Markdown
#[derive(Parser, Debug)]
#[command(name = "ocr-markdown")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert OCR JSON files to Markdown
    Convert(ConvertArgs),
    /// Merge the Markdown files of a directory into one file
    Merge(MergeArgs),
}

/// Input schema selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Detect from the JSON shape
    #[default]
    Auto,
    Youdao,
    Pymupdf,
    Rapidocr,
}

impl FormatArg {
    pub fn format(self) -> Option<OcrFormat> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Youdao => Some(OcrFormat::Youdao),
            FormatArg::Pymupdf => Some(OcrFormat::PyMuPdf),
            FormatArg::Rapidocr => Some(OcrFormat::RapidOcr),
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// OCR JSON file or directory (searched recursively for *.json)
    pub input: PathBuf,

    /// Output file (file input) or directory (directory input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Input schema
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,

    /// Calibration profile
    #[arg(long, value_enum)]
    pub profile: Option<LayoutProfile>,

    /// Scan resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Height of one character in pixels
    #[arg(long)]
    pub char_height: Option<f64>,

    /// Line height as a multiple of the character height
    #[arg(long)]
    pub line_height_multiplier: Option<f64>,

    /// Config file (default: <config dir>/ocr-markdown/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Filter audit log file
    #[arg(long, conflicts_with = "no_log_file")]
    pub log_file: Option<PathBuf>,

    /// Do not write the filter audit log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Table of contents file used to level headings
    #[arg(long)]
    pub toc: Option<PathBuf>,

    /// Heading level of the least indented table of contents entries
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    pub toc_start_level: Option<u8>,

    /// Page width for schemas without page size
    #[arg(long, requires = "page_height")]
    pub page_width: Option<u32>,

    /// Page height for schemas without page size
    #[arg(long, requires = "page_width")]
    pub page_height: Option<u32>,

    /// Line written between pages
    #[arg(long)]
    pub page_break_marker: Option<String>,

    /// Emit blank lines for vertical gaps between rows
    #[arg(long)]
    pub preserve_blank_lines: bool,

    /// Skip files whose Markdown output already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the summary and the filter audit lines on stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl ConvertArgs {
    /// Values given on the command line; unset flags keep config file values
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            profile: self.profile,
            dpi: self.dpi,
            char_height: self.char_height,
            line_height_multiplier: self.line_height_multiplier,
            format: self.format.format(),
            page_size: self.page_width.zip(self.page_height),
            log_file: self.log_file.clone(),
            no_log_file: self.no_log_file,
            toc_file: self.toc.clone(),
            toc_start_level: self.toc_start_level,
            page_break_marker: self.page_break_marker.clone(),
            preserve_blank_lines: self.preserve_blank_lines.then_some(true),
        }
    }
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory of Markdown files
    pub input: PathBuf,

    /// Merged output file (default: <dir name>.md next to the directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not separate files with a page break marker
    #[arg(long)]
    pub no_page_breaks: bool,

    /// Page break marker line
    #[arg(long, default_value = DEFAULT_PAGE_BREAK_MARKER)]
    pub page_break_marker: String,

    /// File order
    #[arg(long, value_enum, default_value_t = MergeSortOrder::Name)]
    pub sort: MergeSortOrder,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl MergeArgs {
    pub fn to_options(&self) -> MergeOptions {
        MergeOptions {
            output: self.output.clone(),
            page_breaks: !self.no_page_breaks,
            page_break_marker: self.page_break_marker.clone(),
            sort: self.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_defaults() {
        let cli = parse(&["ocr-markdown", "convert", "page.json"]);
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, PathBuf::from("page.json"));
        assert_eq!(args.format, FormatArg::Auto);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.to_overrides(), CliOverrides::new());
    }

    #[test]
    fn test_convert_overrides() {
        let cli = parse(&[
            "ocr-markdown",
            "convert",
            "pages",
            "-o",
            "out",
            "--format",
            "rapidocr",
            "--profile",
            "compact",
            "--dpi",
            "200",
            "--page-width",
            "1654",
            "--page-height",
            "2339",
            "--no-log-file",
            "--preserve-blank-lines",
            "-vv",
        ]);
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        let overrides = args.to_overrides();
        assert_eq!(overrides.format, Some(OcrFormat::RapidOcr));
        assert_eq!(overrides.profile, Some(LayoutProfile::Compact));
        assert_eq!(overrides.dpi, Some(200));
        assert_eq!(overrides.page_size, Some((1654, 2339)));
        assert!(overrides.no_log_file);
        assert_eq!(overrides.preserve_blank_lines, Some(true));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_convert_rejects_conflicts() {
        assert!(Cli::try_parse_from([
            "ocr-markdown",
            "convert",
            "p.json",
            "--log-file",
            "a.txt",
            "--no-log-file"
        ])
        .is_err());
        assert!(
            Cli::try_parse_from(["ocr-markdown", "convert", "p.json", "--page-width", "10"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["ocr-markdown", "convert", "p.json", "--format", "tesseract"])
                .is_err()
        );
    }

    #[test]
    fn test_merge_args() {
        let cli = parse(&["ocr-markdown", "merge", "book", "--no-page-breaks", "--sort", "mtime"]);
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        let options = args.to_options();
        assert!(!options.page_breaks);
        assert_eq!(options.page_break_marker, "---");
        assert_eq!(options.sort, MergeSortOrder::Mtime);
        assert!(options.output.is_none());
    }
}
