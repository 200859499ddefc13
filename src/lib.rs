pub mod builder;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod dialect;
pub mod discovery;
pub mod lexer;
pub mod logging;
pub mod model;
pub mod parser;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

pub use builder::ExtractOptions;
pub use model::{ExtractionResult, SymbolKind, SymbolRecord, Variant};

/// Extract the declaration-level symbols of one source unit with default
/// options.
pub fn extract(source: &str, variant: Variant) -> ExtractionResult {
    extract_with(source, variant, &ExtractOptions::default())
}

/// Tokenize, parse and build the symbol model of one source unit. Never
/// fails: problems in the source come back as diagnostics.
pub fn extract_with(source: &str, variant: Variant, options: &ExtractOptions) -> ExtractionResult {
    let mut unit = parser::parse_with(source, variant, &options.override_annotations);
    let mut diagnostics = std::mem::replace(
        &mut unit.diagnostics,
        diagnostics::Diagnostics::new(model::LineIndex::new("")),
    );
    let symbols = builder::build(&unit, options, &mut diagnostics);
    let (diagnostics, line_index) = diagnostics.into_parts();
    debug!(
        variant = %variant,
        symbols = symbols.len(),
        diagnostics = diagnostics.len(),
        "extracted source unit"
    );
    ExtractionResult {
        variant,
        symbols,
        diagnostics,
        line_index,
        package: unit.package,
        imports: unit.imports,
    }
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
