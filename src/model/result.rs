use serde::Serialize;

use crate::diagnostics::{Diagnostic, Severity};

use super::{ImportRecord, LineIndex, Relationship, SymbolId, SymbolRecord, Variant};

/// Symbols and diagnostics extracted from one source unit.
///
/// Symbols are in depth-first pre-order, so a record's id is also its index
/// and every record precedes its descendants.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub variant: Variant,
    pub symbols: Vec<SymbolRecord>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing)]
    pub line_index: LineIndex,
    pub package: Option<String>,
    pub imports: Vec<ImportRecord>,
}

impl ExtractionResult {
    pub fn symbol(&self, id: SymbolId) -> Option<&SymbolRecord> {
        self.symbols.get(id.index())
    }

    /// First symbol in source order with the given qualified name.
    pub fn by_qualified_name(&self, name: &str) -> Option<&SymbolRecord> {
        self.symbols.iter().find(|s| s.qualified_name == name)
    }

    pub fn children(&self, id: SymbolId) -> impl Iterator<Item = &SymbolRecord> {
        self.symbols.iter().filter(move |s| s.parent == Some(id))
    }

    pub fn parent(&self, id: SymbolId) -> Option<&SymbolRecord> {
        self.symbol(id)?.parent.and_then(|p| self.symbol(p))
    }

    /// Declarations at file level.
    pub fn roots(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.symbols.iter().filter(|s| s.parent.is_none())
    }

    /// No error-severity diagnostics. Informational unresolved-reference
    /// notes do not count.
    pub fn is_clean(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Every edge whose target could not be found in this unit, with its owner.
    pub fn unresolved(&self) -> impl Iterator<Item = (&SymbolRecord, &Relationship)> {
        self.symbols.iter().flat_map(|s| {
            s.relations
                .iter()
                .filter(|r| !r.is_resolved())
                .map(move |r| (s, r))
        })
    }
}
