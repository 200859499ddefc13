use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::discovery::{discover_files, DiscoveryConfig};
use crate::model::{ExtractionResult, Variant};
use crate::{extract_with, read_source, ExtractOptions};

/// Extraction output for one file.
#[derive(Debug, Serialize)]
pub struct FileExtraction {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub files: Vec<FileExtraction>,
    /// Files that could not be read, as `path: error`.
    pub read_errors: Vec<String>,
    pub duration_ms: u128,
}

impl BatchResult {
    pub fn symbol_count(&self) -> usize {
        self.files.iter().map(|f| f.result.symbols.len()).sum()
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.result.error_count()).sum()
    }

    pub fn has_errors(&self) -> bool {
        !self.read_errors.is_empty() || self.error_count() > 0
    }
}

/// Discover the sources under `root` and extract them in parallel.
pub fn run_scan(root: &Path, config: &DiscoveryConfig, options: &ExtractOptions) -> Result<BatchResult> {
    let discovered = discover_files(root, config)?;
    let jobs: Vec<(PathBuf, Variant)> = discovered
        .into_iter()
        .map(|f| (f.path, f.variant))
        .collect();
    let result = run_batch(&jobs, options);
    info!(
        root = %root.display(),
        files = result.files.len(),
        symbols = result.symbol_count(),
        errors = result.error_count(),
        duration_ms = result.duration_ms as u64,
        "scan finished"
    );
    Ok(result)
}

/// Extract the given files, choosing each file's variant from `forced`,
/// its extension, or `fallback`, in that order.
pub fn run_extract(
    paths: &[PathBuf],
    forced: Option<Variant>,
    fallback: Option<Variant>,
    options: &ExtractOptions,
) -> Result<BatchResult> {
    let jobs = paths
        .iter()
        .map(|path| -> Result<(PathBuf, Variant)> {
            let variant = forced
                .or_else(|| {
                    path.extension()
                        .and_then(|e| e.to_str())
                        .and_then(Variant::from_extension)
                })
                .or(fallback)
                .ok_or_else(|| {
                    anyhow!(
                        "cannot tell the language of {}; pass --lang java or --lang csharp",
                        path.display()
                    )
                })?;
            Ok((path.clone(), variant))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(run_batch(&jobs, options))
}

/// Each worker reads and extracts one file on its own; an unreadable file
/// is reported and skipped.
fn run_batch(jobs: &[(PathBuf, Variant)], options: &ExtractOptions) -> BatchResult {
    let start = Instant::now();

    let outcomes: Vec<Result<FileExtraction, String>> = jobs
        .par_iter()
        .map(|(path, variant)| match read_source(path) {
            Ok(source) => Ok(FileExtraction {
                path: path.clone(),
                result: extract_with(&source, *variant, options),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                Err(format!("{}: {:#}", path.display(), e))
            }
        })
        .collect();

    let mut files = Vec::with_capacity(outcomes.len());
    let mut read_errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(file) => files.push(file),
            Err(e) => read_errors.push(e),
        }
    }

    BatchResult {
        files,
        read_errors,
        duration_ms: start.elapsed().as_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_extracts_every_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("A.java"), "class A { void run() {} }").unwrap();
        fs::write(root.join("B.cs"), "class B { int X { get; set; } }").unwrap();
        fs::write(root.join("Broken.java"), "class Broken {\n  void f() {\n").unwrap();

        let result = run_scan(root, &DiscoveryConfig::default(), &ExtractOptions::default()).unwrap();
        assert_eq!(result.files.len(), 3);
        assert_eq!(result.symbol_count(), 6);
        assert_eq!(result.error_count(), 1);
        assert!(result.has_errors());
        assert!(result.read_errors.is_empty());

        let b = result.files.iter().find(|f| f.path.ends_with("B.cs")).unwrap();
        assert_eq!(b.result.variant, Variant::CSharp);
    }

    #[test]
    fn test_extract_reports_unreadable_files() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("Good.java");
        fs::write(&good, "class Good {}").unwrap();
        let missing = dir.path().join("Missing.java");

        let result = run_extract(&[good, missing], None, None, &ExtractOptions::default()).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.read_errors.len(), 1);
        assert!(result.read_errors[0].contains("Missing.java"));
        assert!(result.has_errors());
    }

    #[test]
    fn test_extract_variant_selection() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("snippet.txt");
        fs::write(&plain, "class Snippet { }").unwrap();

        let err = run_extract(&[plain.clone()], None, None, &ExtractOptions::default()).unwrap_err();
        assert!(err.to_string().contains("--lang"));

        let result =
            run_extract(&[plain.clone()], None, Some(Variant::CSharp), &ExtractOptions::default())
                .unwrap();
        assert_eq!(result.files[0].result.variant, Variant::CSharp);

        let result =
            run_extract(&[plain], Some(Variant::Java), Some(Variant::CSharp), &ExtractOptions::default())
                .unwrap();
        assert_eq!(result.files[0].result.variant, Variant::Java);
    }
}
