//! ocr-markdown - OCR JSON to Markdown converter
//!
//! CLI entry point

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use ocr_markdown::{
    exit_codes,
    // Batch
    collect_json_files, convert_file, convert_path, BatchOptions,
    // CLI
    Cli, Commands, ConvertArgs, MergeArgs,
    // Config
    Config, ConvertError,
    // Pipeline
    MarkdownMerger, OcrConverter,
    // Progress tracking
    OutputMode, ProgressTracker,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let (verbose, quiet) = match &cli.command {
        Commands::Convert(args) => (args.verbose, args.quiet),
        Commands::Merge(args) => (args.verbose, false),
    };
    init_tracing(verbose, quiet);

    let result = match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Merge(args) => run_merge(&args),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

/// Filter audit records stay on stderr at the default level unless `quiet`
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if !quiet {
        if let Ok(directive) = "filter_log=info".parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Convert Command ============

fn run_convert(args: &ConvertArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();

    // Validate input path
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    // Collect JSON files to process
    let json_files = collect_json_files(&args.input)?;
    if json_files.is_empty() {
        eprintln!("Error: No JSON files found in input path");
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    // Load config file if specified, otherwise use default
    let file_config = match &args.config {
        Some(config_path) => match Config::load_from_path(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_default(),
    };

    // Merge config file with CLI arguments (CLI takes precedence)
    let cli_overrides = args.to_overrides();
    let options = file_config.merge_with_cli(&cli_overrides)?;

    let mut converter = OcrConverter::with_options(options)?;
    converter
        .box_filter(file_config.box_filters()?)
        .row_box_filter(file_config.row_filters()?);
    converter.set_toc(
        file_config
            .load_toc(&cli_overrides)
            .context("failed to read table of contents")?,
    );

    if args.input.is_file() {
        return run_convert_file(args, &mut converter, start_time);
    }

    let output_mode = if args.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(args.verbose)
    };
    let tracker = ProgressTracker::new(json_files.len(), output_mode);
    let batch_options = BatchOptions {
        skip_existing: args.skip_existing,
    };
    let report = convert_path(
        &mut converter,
        &args.input,
        args.output.as_deref(),
        &batch_options,
        &tracker,
    )?;
    tracker.finish();

    let elapsed = start_time.elapsed();

    // Print summary
    if !args.quiet {
        ProgressTracker::print_summary(
            report.total(),
            report.converted.len(),
            report.skipped.len(),
            report.failed.len(),
        );
        println!("Total time: {:.2}s", elapsed.as_secs_f64());
    }

    if !report.is_success() {
        bail!("{} file(s) failed to convert", report.failed.len());
    }

    Ok(())
}

fn run_convert_file(
    args: &ConvertArgs,
    converter: &mut OcrConverter,
    start_time: Instant,
) -> anyhow::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("md"));

    if args.skip_existing && output.exists() {
        if !args.quiet {
            println!("Skipping (exists): {}", output.display());
        }
        return Ok(());
    }

    match convert_file(converter, &args.input, &output) {
        Ok(conversion) => {
            if !args.quiet {
                print_file_result(&args.input, &output, conversion.rejections.len());
                println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
            }
            Ok(())
        }
        Err(ConvertError::Schema(e)) => {
            eprintln!("Error: {}: {}", args.input.display(), e);
            std::process::exit(exit_codes::SCHEMA_ERROR);
        }
        Err(e) => Err(e).with_context(|| format!("failed to convert {}", args.input.display())),
    }
}

fn print_file_result(input: &Path, output: &Path, rejected: usize) {
    println!("{} -> {}", input.display(), output.display());
    if rejected > 0 {
        println!("  Filtered: {} item(s)", rejected);
    }
}

// ============ Merge Command ============

fn run_merge(args: &MergeArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let merger = MarkdownMerger::new(&args.input, args.to_options())?;
    let files = merger.markdown_files()?;
    if files.is_empty() {
        eprintln!("Error: No Markdown files found in {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    merger.merge()?;
    println!(
        "Merged {} file(s) into {}",
        files.len(),
        merger.output_path().display()
    );
    Ok(())
}
