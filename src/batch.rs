//! Batch conversion
//!
//! Converts one OCR JSON file, or every `*.json` file below a directory,
//! writing `.md` files that mirror the input tree. A failing file is
//! recorded and the batch moves on.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::converter::{Conversion, ConvertError, OcrConverter, Result};

/// Progress callback for batch conversion
pub trait ProgressCallback {
    /// Called before a file is converted (`index` is 0-based)
    fn on_file_start(&self, _index: usize, _total: usize, _path: &Path) {}

    /// Called when a file is skipped because its output exists
    fn on_file_skipped(&self, _path: &Path) {}

    /// Called after a file was converted and written to `output`
    fn on_file_complete(&self, _output: &Path, _conversion: &Conversion) {}

    /// Called when a file fails
    fn on_file_error(&self, _path: &Path, _error: &ConvertError) {}
}

/// No-op progress callback
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {}

/// Options for batch conversion
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Leave files whose Markdown output already exists untouched
    pub skip_existing: bool,
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Input files converted successfully
    pub converted: Vec<PathBuf>,
    /// Input files skipped because their output existed
    pub skipped: Vec<PathBuf>,
    /// Input files that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Collect JSON files from input path (file or directory, recursive, sorted)
pub fn collect_json_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if input.is_file() {
        files.push(input.to_path_buf());
    } else if input.is_dir() {
        let mut pending = vec![input.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.is_file() && is_json(&path) {
                    files.push(path);
                }
            }
        }
        files.sort();
    }

    Ok(files)
}

/// Markdown path of `file`, mirroring its position below `input_root` in `output_dir`
pub fn output_path_for(input_root: &Path, file: &Path, output_dir: &Path) -> PathBuf {
    let relative = file
        .strip_prefix(input_root)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(file.file_name().unwrap_or_default()));
    output_dir.join(relative).with_extension("md")
}

/// Convert one JSON file and write its Markdown to `output`
pub fn convert_file(converter: &mut OcrConverter, input: &Path, output: &Path) -> Result<Conversion> {
    let json = fs::read_to_string(input)?;
    let conversion = converter.convert_str(&json)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, &conversion.markdown)?;
    debug!(input = %input.display(), output = %output.display(), "wrote markdown");

    Ok(conversion)
}

/// Convert a file or a directory tree.
///
/// For a file, `output` is the Markdown file (default: the input with an
/// `.md` extension). For a directory, `output` is the root of the mirrored
/// tree (default: the input directory itself).
pub fn convert_path(
    converter: &mut OcrConverter,
    input: &Path,
    output: Option<&Path>,
    options: &BatchOptions,
    progress: &dyn ProgressCallback,
) -> Result<BatchReport> {
    if !input.exists() {
        return Err(ConvertError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input path does not exist: {}", input.display()),
        )));
    }

    let files = collect_json_files(input)?;
    let targets: Vec<(PathBuf, PathBuf)> = if input.is_file() {
        let target = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension("md"));
        vec![(input.to_path_buf(), target)]
    } else {
        let output_dir = output.unwrap_or(input);
        files
            .into_iter()
            .map(|file| {
                let target = output_path_for(input, &file, output_dir);
                (file, target)
            })
            .collect()
    };

    let mut report = BatchReport::default();
    let total = targets.len();

    for (idx, (file, target)) in targets.into_iter().enumerate() {
        if options.skip_existing && target.exists() {
            progress.on_file_skipped(&file);
            report.skipped.push(file);
            continue;
        }

        progress.on_file_start(idx, total, &file);
        match convert_file(converter, &file, &target) {
            Ok(conversion) => {
                progress.on_file_complete(&target, &conversion);
                report.converted.push(file);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "conversion failed");
                progress.on_file_error(&file, &e);
                report.failed.push((file, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterOptions;
    use tempfile::tempdir;

    const RAPID_JSON: &str =
        r#"[{"box": [[100, 100], [700, 100], [700, 150], [100, 150]], "txt": "hello world", "score": 0.98}]"#;

    fn quiet_converter() -> OcrConverter {
        OcrConverter::with_options(ConverterOptions::builder().no_log_file().build()).unwrap()
    }

    #[test]
    fn test_collect_json_files_recursive_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b").join("2.json"), "[]").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_json_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.json"), dir.path().join("b").join("2.json")]
        );
    }

    #[test]
    fn test_output_path_for_mirrors_tree() {
        let out = output_path_for(
            Path::new("/in"),
            Path::new("/in/ch1/page3.json"),
            Path::new("/out"),
        );
        assert_eq!(out, PathBuf::from("/out/ch1/page3.md"));
    }

    #[test]
    fn test_convert_single_file_default_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("page.json");
        fs::write(&input, RAPID_JSON).unwrap();

        let mut converter = quiet_converter();
        let report =
            convert_path(&mut converter, &input, None, &BatchOptions::default(), &SilentProgress)
                .unwrap();
        assert_eq!(report.converted, vec![input.clone()]);
        assert_eq!(
            fs::read_to_string(dir.path().join("page.md")).unwrap(),
            "hello world"
        );
    }

    #[test]
    fn test_convert_directory_continues_past_errors() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(input.join("sub")).unwrap();
        fs::write(input.join("bad.json"), "{\"nothing\": 1}").unwrap();
        fs::write(input.join("sub").join("good.json"), RAPID_JSON).unwrap();
        let output = dir.path().join("out");

        let mut converter = quiet_converter();
        let report = convert_path(
            &mut converter,
            &input,
            Some(&output),
            &BatchOptions::default(),
            &SilentProgress,
        )
        .unwrap();

        assert_eq!(report.converted, vec![input.join("sub").join("good.json")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, input.join("bad.json"));
        assert!(!report.is_success());
        assert!(output.join("sub").join("good.md").exists());
        assert!(!output.join("bad.md").exists());
    }

    #[test]
    fn test_skip_existing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("page.json"), RAPID_JSON).unwrap();
        fs::write(dir.path().join("page.md"), "old").unwrap();

        let mut converter = quiet_converter();
        let options = BatchOptions { skip_existing: true };
        let report =
            convert_path(&mut converter, dir.path(), None, &options, &SilentProgress).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.total(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("page.md")).unwrap(), "old");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempdir().unwrap();
        let mut converter = quiet_converter();
        let result = convert_path(
            &mut converter,
            &dir.path().join("missing"),
            None,
            &BatchOptions::default(),
            &SilentProgress,
        );
        assert!(matches!(result, Err(ConvertError::Io(_))));
    }
}
