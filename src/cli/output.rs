use std::fmt::Write as _;

use serde::Serialize;

use super::batch::{BatchResult, FileExtraction};
use super::OutputFormat;

/// Format a batch for output: every file's symbols and diagnostics.
pub fn format_batch(batch: &BatchResult, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Compact => format_json(&batch.files, format),
        OutputFormat::Text => {
            let mut output = String::new();
            for file in &batch.files {
                output.push_str(&format_file_text(file));
            }
            output
        }
    }
}

fn format_file_text(file: &FileExtraction) -> String {
    let result = &file.result;
    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", file.path.display(), result.variant);
    if let Some(package) = &result.package {
        let _ = writeln!(output, "  package {}", package);
    }
    for symbol in &result.symbols {
        let depth = std::iter::successors(symbol.parent, |&p| {
            result.symbol(p).and_then(|s| s.parent)
        })
        .count();
        let mut flags = String::new();
        if symbol.partial {
            flags.push_str(" [partial]");
        }
        if symbol.duplicate {
            flags.push_str(" [duplicate]");
        }
        let _ = writeln!(
            output,
            "  {}{:<13} {:<40} (line {}){}",
            "  ".repeat(depth),
            symbol.kind,
            symbol.qualified_name,
            symbol.line_span.start.line,
            flags,
        );
    }
    for diagnostic in &result.diagnostics {
        let _ = writeln!(output, "  {}", diagnostic);
    }
    output
}

/// Format any serializable value as JSON.
pub fn format_json<T: Serialize>(value: &T, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Compact => serde_json::to_string(value).unwrap_or_default(),
        OutputFormat::Json | OutputFormat::Text => {
            serde_json::to_string_pretty(value).unwrap_or_default()
        }
    }
}

/// One-line summary of a scan.
pub fn format_scan_summary(batch: &BatchResult, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Compact => {
            let summary = serde_json::json!({
                "files_extracted": batch.files.len(),
                "symbols_extracted": batch.symbol_count(),
                "errors": batch.error_count(),
                "unreadable_files": batch.read_errors.len(),
                "duration_ms": batch.duration_ms,
            });
            format_json(&summary, format)
        }
        OutputFormat::Text => format!(
            "Extracted {} files: {} symbols, {} errors ({}ms)",
            batch.files.len(),
            batch.symbol_count(),
            batch.error_count(),
            batch.duration_ms,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract, Variant};
    use std::path::PathBuf;

    fn batch(source: &str) -> BatchResult {
        BatchResult {
            files: vec![FileExtraction {
                path: PathBuf::from("src/Outer.java"),
                result: extract(source, Variant::Java),
            }],
            read_errors: Vec::new(),
            duration_ms: 3,
        }
    }

    #[test]
    fn test_text_output_indents_members() {
        let text = format_batch(
            &batch("package app;\nclass Outer {\n  class Inner {}\n}\n"),
            &OutputFormat::Text,
        );
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "src/Outer.java (java)");
        assert_eq!(lines[1], "  package app");
        assert!(lines[2].starts_with("  class"));
        assert!(lines[2].contains("Outer"));
        assert!(lines[3].starts_with("    class"));
        assert!(lines[3].contains("Outer.Inner"));
        assert!(lines[3].contains("(line 3)"));
    }

    #[test]
    fn test_text_output_lists_diagnostics() {
        let text = format_batch(&batch("class A {\n  int x = ;\n}\n"), &OutputFormat::Text);
        assert!(text.contains("[partial]"));
        assert!(text.contains("error [syntax]"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let json = format_batch(&batch("class A { void f() {} }"), &OutputFormat::Compact);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["path"], "src/Outer.java");
        assert_eq!(value[0]["variant"], "java");
        assert_eq!(value[0]["symbols"][1]["qualified_name"], "A.f");
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_scan_summary() {
        let b = batch("class A {}");
        assert_eq!(
            format_scan_summary(&b, &OutputFormat::Text),
            "Extracted 1 files: 1 symbols, 0 errors (3ms)"
        );
        let value: serde_json::Value =
            serde_json::from_str(&format_scan_summary(&b, &OutputFormat::Json)).unwrap();
        assert_eq!(value["symbols_extracted"], 1);
    }
}
