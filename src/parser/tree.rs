//! Arena-backed declaration tree.
//!
//! Nodes own their children through id lists held by the arena; the upward
//! link is a plain [`DeclId`], so the structure stays acyclic in terms of
//! ownership and drops in one go.

use serde::Serialize;

use crate::diagnostics::DiagnosticId;
use crate::model::{Parameter, Span};

use super::modifiers::{AnnotationUse, ResolvedPrefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Struct,
    /// Java `@interface`.
    Annotation,
}

impl TypeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Struct => "struct",
            TypeKind::Annotation => "@interface",
        }
    }

    /// Members without an access modifier are public.
    pub fn members_default_public(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub type_params: Option<String>,
    pub superclass: Option<String>,
    /// Implemented interfaces; for interface kinds, the extended ones.
    pub interfaces: Vec<String>,
    /// C# base list entries not yet split into superclass and interfaces.
    #[serde(skip)]
    pub unclassified_bases: Vec<String>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            type_params: None,
            superclass: None,
            interfaces: Vec::new(),
            unclassified_bases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub return_type: String,
    pub type_params: Option<String>,
    pub params: Vec<Parameter>,
    pub throws: Vec<String>,
    pub is_override: bool,
    pub body: Option<Span>,
    /// Annotation element default value, verbatim.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstructorDecl {
    pub params: Vec<Parameter>,
    pub throws: Vec<String>,
    pub body: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecl {
    pub type_name: String,
    pub has_initializer: bool,
    /// C# property, indexer or event with accessors.
    pub property: bool,
    /// Record header component.
    pub component: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumConstantDecl {
    pub arguments: Option<String>,
    pub body: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeclKind {
    /// Synthetic root for the source unit.
    File,
    Type(TypeDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Field(FieldDecl),
    EnumConstant(EnumConstantDecl),
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclNode {
    pub id: DeclId,
    pub name: String,
    pub kind: DeclKind,
    /// Source order, deduplicated.
    pub modifiers: Vec<String>,
    pub annotations: Vec<AnnotationUse>,
    pub is_override: bool,
    pub span: Span,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub doc: Option<String>,
    pub partial: bool,
    pub diagnostics: Vec<DiagnosticId>,
}

impl DeclNode {
    pub fn type_decl(&self) -> Option<&TypeDecl> {
        match &self.kind {
            DeclKind::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn type_kind(&self) -> Option<TypeKind> {
        self.type_decl().map(|t| t.kind)
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclTree {
    nodes: Vec<DeclNode>,
}

impl DeclTree {
    /// A tree holding only the synthetic file root spanning `span`.
    pub fn new(span: Span) -> Self {
        Self {
            nodes: vec![DeclNode {
                id: DeclId(0),
                name: String::new(),
                kind: DeclKind::File,
                modifiers: Vec::new(),
                annotations: Vec::new(),
                is_override: false,
                span,
                parent: None,
                children: Vec::new(),
                doc: None,
                partial: false,
                diagnostics: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> DeclId {
        DeclId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: DeclId) -> &DeclNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: DeclId) -> &mut DeclNode {
        &mut self.nodes[id.index()]
    }

    /// Append a declaration as the last child of `parent`.
    pub fn add(
        &mut self,
        parent: DeclId,
        name: impl Into<String>,
        kind: DeclKind,
        prefix: &ResolvedPrefix,
        span: Span,
        doc: Option<String>,
    ) -> DeclId {
        let id = DeclId(self.nodes.len() as u32);
        self.nodes.push(DeclNode {
            id,
            name: name.into(),
            kind,
            modifiers: prefix.modifiers.clone(),
            annotations: prefix.annotations.clone(),
            is_override: prefix.is_override,
            span,
            parent: Some(parent),
            children: Vec::new(),
            doc,
            partial: false,
            diagnostics: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn children(&self, id: DeclId) -> &[DeclId] {
        &self.get(id).children
    }

    pub fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.get(id).parent
    }

    /// Enclosing declarations from the nearest outwards, root excluded.
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
            .filter(move |&p| p != self.root())
    }

    pub fn set_end(&mut self, id: DeclId, end: usize) {
        let node = self.get_mut(id);
        node.span.end = end.max(node.span.start);
    }

    /// Flag a node as structurally incomplete because of `diagnostic`,
    /// stretching its span to `end` when recovery consumed past it.
    pub fn mark_partial(&mut self, id: DeclId, diagnostic: DiagnosticId, end: usize) {
        let node = self.get_mut(id);
        node.partial = true;
        if !node.diagnostics.contains(&diagnostic) {
            node.diagnostics.push(diagnostic);
        }
        if end > node.span.end {
            node.span.end = end;
        }
    }

    /// Depth-first pre-order walk, root excluded, children in source order.
    pub fn walk(&self) -> Vec<DeclId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<DeclId> = self.children(self.root()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DeclNode> {
        self.nodes.iter().skip(1)
    }
}
