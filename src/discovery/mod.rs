use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use tracing::trace;

use crate::model::Variant;

/// A source file found under the scanned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub variant: Variant,
}

/// Configuration for file discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Glob patterns to include (empty means include all).
    pub include: Vec<String>,
    /// Glob patterns to exclude.
    pub exclude: Vec<String>,
    /// Only these variants (empty means both).
    pub variants: Vec<Variant>,
}

/// Build output and IDE directories of JVM and .NET projects.
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Java / JVM
    "target/", "build/", ".gradle/", ".idea/",
    // .NET
    "bin/", "obj/", ".vs/",
];

/// Discover `.java` and `.cs` files under `root`, respecting .gitignore.
pub fn discover_files(root: &Path, config: &DiscoveryConfig) -> Result<Vec<DiscoveredFile>> {
    let mut files = Vec::new();

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .parents(true);

    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in DEFAULT_EXCLUDE_PATTERNS {
        overrides
            .add(&format!("!{}", pattern))
            .context("invalid default exclude pattern")?;
    }
    for pattern in &config.exclude {
        overrides
            .add(&format!("!{}", pattern))
            .with_context(|| format!("invalid exclude pattern `{}`", pattern))?;
    }
    for pattern in &config.include {
        overrides
            .add(pattern)
            .with_context(|| format!("invalid include pattern `{}`", pattern))?;
    }
    builder.overrides(overrides.build().context("failed to build overrides")?);

    for entry in builder.build() {
        let entry = entry.context("error reading directory entry")?;

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(variant) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Variant::from_extension)
        else {
            continue;
        };

        if !config.variants.is_empty() && !config.variants.contains(&variant) {
            continue;
        }

        trace!(path = %path.display(), %variant, "discovered source file");
        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            variant,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("src/main/java/com/example")).unwrap();
        fs::write(
            root.join("src/main/java/com/example/App.java"),
            "package com.example; public class App {}",
        )
        .unwrap();
        fs::create_dir_all(root.join("Billing")).unwrap();
        fs::write(root.join("Billing/Invoice.cs"), "public class Invoice {}").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();

        // Initialize a git repo so the ignore crate respects .gitignore
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join("generated/Stub.java"), "class Stub {}").unwrap();

        dir
    }

    fn names(files: &[DiscoveredFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_discovers_java_and_csharp() {
        let dir = setup_test_project();
        let files = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(names(&files), vec!["Invoice.cs", "App.java"]);
        assert_eq!(files[0].variant, Variant::CSharp);
        assert_eq!(files[1].variant, Variant::Java);
    }

    #[test]
    fn test_respects_gitignore() {
        let dir = setup_test_project();
        let files = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(!files
            .iter()
            .any(|f| f.path.to_string_lossy().contains("generated")));
    }

    #[test]
    fn test_build_dirs_excluded() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/App.java"), "public class App {}").unwrap();
        for build_dir in ["target/classes", "build/tmp", "bin/Debug", "obj/Debug"] {
            fs::create_dir_all(root.join(build_dir)).unwrap();
            fs::write(root.join(build_dir).join("Gen.java"), "class Gen {}").unwrap();
            fs::write(root.join(build_dir).join("Gen.cs"), "class Gen {}").unwrap();
        }

        let files = discover_files(root, &DiscoveryConfig::default()).unwrap();
        assert_eq!(names(&files), vec!["App.java"]);
    }

    #[test]
    fn test_variant_filter() {
        let dir = setup_test_project();
        let config = DiscoveryConfig {
            variants: vec![Variant::CSharp],
            ..Default::default()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(names(&files), vec!["Invoice.cs"]);
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let dir = setup_test_project();
        let config = DiscoveryConfig {
            exclude: vec!["*.cs".to_string()],
            ..Default::default()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(names(&files), vec!["App.java"]);

        let config = DiscoveryConfig {
            include: vec!["Billing/**".to_string()],
            ..Default::default()
        };
        let files = discover_files(dir.path(), &config).unwrap();
        assert_eq!(names(&files), vec!["Invoice.cs"]);
    }

    #[test]
    fn test_results_are_sorted_by_path() {
        let dir = setup_test_project();
        let files = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        for window in files.windows(2) {
            assert!(window[0].path <= window[1].path);
        }
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let files = discover_files(dir.path(), &DiscoveryConfig::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_nonexistent_directory_returns_error() {
        let result = discover_files(
            Path::new("/nonexistent/path/that/surely/doesnt/exist"),
            &DiscoveryConfig::default(),
        );
        assert!(result.is_err(), "should error on nonexistent directory");
    }
}
