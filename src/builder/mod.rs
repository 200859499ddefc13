//! Symbol model builder.
//!
//! Flattens a [`DeclTree`] into [`SymbolRecord`]s in depth-first pre-order,
//! attaches relationship edges, flags duplicates and resolves edge targets
//! against the declarations of the same unit.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::model::{
    Annotation, Parameter, RelationKind, Relationship, SymbolId, SymbolKind, SymbolRecord,
    Variant, Visibility,
};
use crate::parser::{
    effective_visibility, DeclKind, DeclNode, DeclTree, ParsedUnit, Placement, TypeDecl,
    TypeKind,
};

mod resolve;

pub use resolve::InFileResolver;

/// Knobs for a single extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Add an info diagnostic for every edge left unresolved.
    pub report_unresolved: bool,
    /// Annotation names that mark a method as overriding, on top of the
    /// language's own marker.
    pub override_annotations: Vec<String>,
}

/// Build the symbol records of `unit`. Resolution notes, when enabled, are
/// appended to `diagnostics`.
pub fn build(
    unit: &ParsedUnit,
    options: &ExtractOptions,
    diagnostics: &mut Diagnostics,
) -> Vec<SymbolRecord> {
    let tree = &unit.tree;
    let order = tree.walk();
    let mut ids: Vec<Option<SymbolId>> = vec![None; tree.len()];
    for (index, decl) in order.iter().enumerate() {
        ids[decl.index()] = Some(SymbolId(index as u32));
    }

    let mut records: Vec<SymbolRecord> = Vec::with_capacity(order.len());
    for &decl in &order {
        let node = tree.get(decl);
        let parent = node.parent.and_then(|p| ids[p.index()]);
        let qualified_name = match parent {
            Some(p) => format!("{}.{}", records[p.index()].qualified_name, node.name),
            None => node.name.clone(),
        };
        let id = SymbolId(records.len() as u32);
        let span = node.span;
        let line_span = diagnostics.line_index().line_span(span);
        let mut record = SymbolRecord {
            id,
            name: node.name.clone(),
            qualified_name,
            kind: symbol_kind(node),
            span,
            line_span,
            parent,
            visibility: visibility(tree, node, unit.variant),
            modifiers: sorted(&node.modifiers),
            annotations: node
                .annotations
                .iter()
                .map(|a| Annotation {
                    name: a.name.clone(),
                    arguments: a.arguments.clone(),
                    span: a.span,
                    attached_to: id,
                })
                .collect(),
            signature: Some(signature(node, unit.variant)),
            type_name: None,
            parameters: Vec::new(),
            throws: Vec::new(),
            overrides: false,
            has_body: false,
            duplicate: false,
            partial: node.partial,
            diagnostics: node.diagnostics.clone(),
            doc: node.doc.clone(),
            relations: Vec::new(),
        };
        fill_kind_details(&mut record, node);
        records.push(record);
    }

    flag_duplicates(&mut records);
    let unresolved = InFileResolver::new(&records).resolve_all(&mut records);

    if options.report_unresolved {
        for warning in &unresolved {
            diagnostics.unresolved(warning);
        }
    }

    debug!(
        symbols = records.len(),
        duplicates = records.iter().filter(|r| r.duplicate).count(),
        unresolved = unresolved.len(),
        "built symbol model"
    );
    records
}

fn symbol_kind(node: &DeclNode) -> SymbolKind {
    match &node.kind {
        DeclKind::Type(t) => match t.kind {
            TypeKind::Class => SymbolKind::Class,
            TypeKind::Interface => SymbolKind::Interface,
            TypeKind::Enum => SymbolKind::Enum,
            TypeKind::Record => SymbolKind::Record,
            TypeKind::Struct => SymbolKind::Struct,
            TypeKind::Annotation => SymbolKind::Annotation,
        },
        DeclKind::Method(_) => SymbolKind::Method,
        DeclKind::Constructor(_) => SymbolKind::Constructor,
        DeclKind::Field(f) if f.property => SymbolKind::Property,
        DeclKind::Field(_) => SymbolKind::Field,
        DeclKind::EnumConstant(_) => SymbolKind::EnumConstant,
        DeclKind::File => unreachable!("walk yields declarations, never the file root"),
    }
}

fn visibility(tree: &DeclTree, node: &DeclNode, variant: Variant) -> Visibility {
    match &node.kind {
        DeclKind::EnumConstant(_) => return Visibility::Public,
        DeclKind::Field(f) if f.component => {
            return match variant {
                Variant::Java => Visibility::Private,
                Variant::CSharp => Visibility::Public,
            }
        }
        _ => {}
    }
    let placement = match node.parent {
        Some(p) if p != tree.root() => {
            let owner = tree.get(p);
            if owner.type_kind().is_some_and(|k| k.members_default_public()) {
                Placement::InterfaceMember
            } else {
                Placement::Member
            }
        }
        _ => Placement::TopLevel,
    };
    effective_visibility(&node.modifiers, variant, placement)
}

fn sorted(modifiers: &[String]) -> Vec<String> {
    let mut out = modifiers.to_vec();
    out.sort();
    out
}

/// Type text, parameters, throws, body presence and edges.
fn fill_kind_details(record: &mut SymbolRecord, node: &DeclNode) {
    match &node.kind {
        DeclKind::Type(t) => record.relations.extend(type_edges(t)),
        DeclKind::Method(m) => {
            record.type_name = Some(m.return_type.clone());
            record.parameters = m.params.clone();
            record.throws = m.throws.clone();
            record.overrides = m.is_override;
            record.has_body = m.body.is_some();
            if m.is_override {
                record
                    .relations
                    .push(Relationship::unresolved(RelationKind::Overrides, &node.name));
            }
        }
        DeclKind::Constructor(c) => {
            record.parameters = c.params.clone();
            record.throws = c.throws.clone();
            record.has_body = c.body.is_some();
        }
        DeclKind::Field(f) => record.type_name = Some(f.type_name.clone()),
        DeclKind::EnumConstant(c) => record.has_body = c.body.is_some(),
        DeclKind::File => {}
    }
    for thrown in &record.throws {
        record
            .relations
            .push(Relationship::unresolved(RelationKind::Throws, thrown));
    }
    for annotation in &node.annotations {
        record
            .relations
            .push(Relationship::unresolved(RelationKind::AnnotatedBy, &annotation.name));
    }
}

fn type_edges(decl: &TypeDecl) -> Vec<Relationship> {
    let mut edges = Vec::new();
    if let Some(superclass) = &decl.superclass {
        edges.push(Relationship::unresolved(RelationKind::Extends, superclass));
    }
    let kind = if matches!(decl.kind, TypeKind::Interface | TypeKind::Annotation) {
        RelationKind::Extends
    } else {
        RelationKind::Implements
    };
    for interface in &decl.interfaces {
        edges.push(Relationship::unresolved(kind, interface));
    }
    edges
}

/// One-line declaration text, modifiers in source order.
fn signature(node: &DeclNode, variant: Variant) -> String {
    let mut parts: Vec<String> = node.modifiers.clone();
    match &node.kind {
        DeclKind::Type(t) => {
            parts.push(t.kind.keyword().to_string());
            let mut head = node.name.clone();
            if let Some(tp) = &t.type_params {
                head.push_str(tp);
            }
            parts.push(head);
            match variant {
                Variant::Java => {
                    if let Some(superclass) = &t.superclass {
                        parts.push(format!("extends {}", superclass));
                    }
                    if !t.interfaces.is_empty() {
                        let keyword = if matches!(t.kind, TypeKind::Interface | TypeKind::Annotation) {
                            "extends"
                        } else {
                            "implements"
                        };
                        parts.push(format!("{} {}", keyword, t.interfaces.join(", ")));
                    }
                }
                Variant::CSharp => {
                    let bases: Vec<&str> = t
                        .superclass
                        .iter()
                        .chain(t.interfaces.iter())
                        .map(String::as_str)
                        .collect();
                    if !bases.is_empty() {
                        parts.push(format!(": {}", bases.join(", ")));
                    }
                }
            }
        }
        DeclKind::Method(m) => {
            if let Some(tp) = &m.type_params {
                parts.push(tp.clone());
            }
            // `implicit operator decimal(..)` already names its result type.
            let conversion = node.modifiers.iter().any(|m| m == "implicit" || m == "explicit");
            if !conversion {
                parts.push(m.return_type.clone());
            }
            parts.push(format!("{}({})", node.name, params_text(&m.params, variant)));
            if !m.throws.is_empty() {
                parts.push(format!("throws {}", m.throws.join(", ")));
            }
        }
        DeclKind::Constructor(c) => {
            parts.push(format!("{}({})", node.name, params_text(&c.params, variant)));
            if !c.throws.is_empty() {
                parts.push(format!("throws {}", c.throws.join(", ")));
            }
        }
        DeclKind::Field(f) => {
            parts.push(f.type_name.clone());
            parts.push(node.name.clone());
        }
        DeclKind::EnumConstant(c) => match &c.arguments {
            Some(args) => parts.push(format!("{}({})", node.name, args)),
            None => parts.push(node.name.clone()),
        },
        DeclKind::File => {}
    }
    parts.join(" ")
}

fn params_text(params: &[Parameter], variant: Variant) -> String {
    params
        .iter()
        .map(|p| match (p.varargs, variant) {
            (true, Variant::Java) => {
                let element = p.type_name.strip_suffix("[]").unwrap_or(&p.type_name);
                format!("{}... {}", element, p.name)
            }
            (true, Variant::CSharp) => format!("params {} {}", p.type_name, p.name),
            (false, _) => format!("{} {}", p.type_name, p.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Category {
    Type,
    Method,
    Constructor,
    Value,
}

fn category(kind: SymbolKind) -> Category {
    match kind {
        k if k.is_type() => Category::Type,
        SymbolKind::Method => Category::Method,
        SymbolKind::Constructor => Category::Constructor,
        _ => Category::Value,
    }
}

/// Mark every member of a group sharing parent, category, name and (for
/// callables) parameter types.
fn flag_duplicates(records: &mut [SymbolRecord]) {
    let mut groups: HashMap<(Option<SymbolId>, Category, String, Vec<String>), Vec<usize>> =
        HashMap::new();
    for (index, record) in records.iter().enumerate() {
        let params = if record.kind.is_callable() {
            record.parameters.iter().map(|p| p.type_name.clone()).collect()
        } else {
            Vec::new()
        };
        groups
            .entry((record.parent, category(record.kind), record.name.clone(), params))
            .or_default()
            .push(index);
    }
    for members in groups.values().filter(|m| m.len() > 1) {
        for &index in members {
            records[index].duplicate = true;
        }
    }
}
