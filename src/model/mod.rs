use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dialect::{Dialect, CSHARP, JAVA};

pub mod line_index;
pub mod result;

pub use line_index::LineIndex;
pub use result::ExtractionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Class,
    Interface,
    Enum,
    Record,
    Struct,
    Annotation,
    Method,
    Constructor,
    Field,
    Property,
    EnumConstant,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Record => "record",
            SymbolKind::Struct => "struct",
            SymbolKind::Annotation => "annotation",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::EnumConstant => "enum_constant",
        }
    }

    /// Kinds that declare a type and can be the target of type edges.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Enum
                | SymbolKind::Record
                | SymbolKind::Struct
                | SymbolKind::Annotation
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Constructor)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(SymbolKind::Class),
            "interface" => Ok(SymbolKind::Interface),
            "enum" => Ok(SymbolKind::Enum),
            "record" => Ok(SymbolKind::Record),
            "struct" => Ok(SymbolKind::Struct),
            "annotation" => Ok(SymbolKind::Annotation),
            "method" => Ok(SymbolKind::Method),
            "constructor" => Ok(SymbolKind::Constructor),
            "field" => Ok(SymbolKind::Field),
            "property" => Ok(SymbolKind::Property),
            "enum_constant" => Ok(SymbolKind::EnumConstant),
            _ => Err(format!("unknown symbol kind: {}", s)),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Extends,
    Implements,
    Overrides,
    Throws,
    AnnotatedBy,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::Overrides => "overrides",
            RelationKind::Throws => "throws",
            RelationKind::AnnotatedBy => "annotated_by",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    /// Java's default access.
    Package,
    /// C#'s assembly-level access.
    Internal,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Line is 1-based, column is a 0-based byte offset within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: Position,
    pub end: Position,
}

/// Language variant selecting the keyword set and grammar dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Java,
    #[serde(alias = "cs", alias = "c#")]
    CSharp,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Java => "java",
            Variant::CSharp => "csharp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "java" => Some(Variant::Java),
            "cs" => Some(Variant::CSharp),
            _ => None,
        }
    }

    pub fn dialect(&self) -> &'static Dialect {
        match self {
            Variant::Java => &JAVA,
            Variant::CSharp => &CSHARP,
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Variant::Java),
            "csharp" | "cs" | "c#" => Ok(Variant::CSharp),
            _ => Err(format!("unknown language variant: {}", s)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub varargs: bool,
}

/// An annotation (Java) or attribute (C#) usage attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    /// Text between the parentheses, verbatim.
    pub arguments: Option<String>,
    pub span: Span,
    pub attached_to: SymbolId,
}

impl Annotation {
    /// Last segment of a qualified annotation name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// A structural edge from one symbol to another symbol, named as written in
/// source and resolved within the same file when possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationKind,
    pub target: String,
    pub resolved: Option<SymbolId>,
}

impl Relationship {
    pub fn unresolved(kind: RelationKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub id: SymbolId,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub span: Span,
    pub line_span: LineSpan,
    pub parent: Option<SymbolId>,
    pub visibility: Visibility,
    /// Normalized modifier set, sorted.
    pub modifiers: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub signature: Option<String>,
    /// Return type for methods, declared type for fields and properties.
    pub type_name: Option<String>,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<String>,
    pub overrides: bool,
    pub has_body: bool,
    pub duplicate: bool,
    pub partial: bool,
    pub diagnostics: Vec<crate::diagnostics::DiagnosticId>,
    pub doc: Option<String>,
    pub relations: Vec<Relationship>,
}

impl SymbolRecord {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn relations_of(&self, kind: RelationKind) -> impl Iterator<Item = &Relationship> {
        self.relations.iter().filter(move |r| r.kind == kind)
    }

    /// Target names of all edges of the given kind, in source order.
    pub fn targets(&self, kind: RelationKind) -> Vec<&str> {
        self.relations_of(kind).map(|r| r.target.as_str()).collect()
    }
}

/// A `package`/`import` (Java) or `namespace`/`using` (C#) directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    /// C# `using Alias = Some.Type;`
    pub alias: Option<String>,
    pub span: Span,
}

/// Last dot-separated segment of a name, with generic arguments erased.
pub fn simple_name(name: &str) -> &str {
    let erased = erase_generics(name);
    erased.rsplit('.').next().unwrap_or(erased)
}

/// Strip a trailing generic argument list and array dimensions: `List<T>[]` -> `List`.
pub fn erase_generics(name: &str) -> &str {
    let end = name.find(&['<', '['][..]).unwrap_or(name.len());
    name[..end].trim()
}
