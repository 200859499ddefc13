//! Per-variant keyword sets and grammar switches.
//!
//! The lexer and parser never hard-code a keyword list; they consult the
//! [`Dialect`] of the variant being extracted.

use crate::model::Variant;

#[derive(Debug)]
pub struct Dialect {
    pub variant: Variant,
    /// Reserved words, lexed as [`TokenKind::Keyword`](crate::lexer::TokenKind::Keyword).
    pub keywords: &'static [&'static str],
    /// Keywords that may appear in a declaration's modifier prefix.
    pub modifiers: &'static [&'static str],
    /// Contextual words that act as modifiers only in prefix position.
    pub contextual_modifiers: &'static [&'static str],
    /// Keywords introducing a type declaration.
    pub type_keywords: &'static [&'static str],
    /// Keywords that name a built-in type.
    pub primitive_types: &'static [&'static str],
    /// Annotation names that mark a method as overriding.
    pub override_annotations: &'static [&'static str],
    /// Modifiers that mark a method as overriding.
    pub override_modifiers: &'static [&'static str],
    /// Letters accepted after a numeric literal.
    pub number_suffixes: &'static str,
    /// Suffixes that make an integer-looking literal a floating point one.
    pub float_suffixes: &'static str,
    /// Annotations are written `@Name(..)` rather than `[Name(..)]`.
    pub at_annotations: bool,
    /// Line comments starting with `///` are documentation.
    pub triple_slash_docs: bool,
}

impl Dialect {
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word)
    }

    pub fn is_modifier(&self, word: &str) -> bool {
        self.modifiers.contains(&word) || self.contextual_modifiers.contains(&word)
    }

    pub fn is_type_keyword(&self, word: &str) -> bool {
        self.type_keywords.contains(&word)
    }

    pub fn is_primitive(&self, word: &str) -> bool {
        self.primitive_types.contains(&word)
    }

    pub fn is_visibility(&self, word: &str) -> bool {
        matches!(word, "public" | "protected" | "private" | "internal")
            && self.is_modifier(word)
    }
}

pub static JAVA: Dialect = Dialect {
    variant: Variant::Java,
    keywords: &[
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
        "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
        "interface", "long", "native", "new", "package", "private", "protected", "public",
        "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this",
        "throw", "throws", "transient", "try", "void", "volatile", "while", "true", "false",
        "null",
    ],
    modifiers: &[
        "public", "protected", "private", "static", "final", "abstract", "native",
        "synchronized", "transient", "volatile", "strictfp", "default",
    ],
    contextual_modifiers: &["sealed", "non-sealed"],
    type_keywords: &["class", "interface", "enum"],
    primitive_types: &[
        "boolean", "byte", "short", "int", "long", "char", "float", "double", "void",
    ],
    override_annotations: &["Override"],
    override_modifiers: &[],
    number_suffixes: "lLfFdD",
    float_suffixes: "fFdD",
    at_annotations: true,
    triple_slash_docs: false,
};

pub static CSHARP: Dialect = Dialect {
    variant: Variant::CSharp,
    keywords: &[
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
        "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this",
        "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort",
        "using", "virtual", "void", "volatile", "while",
    ],
    modifiers: &[
        "public", "protected", "private", "internal", "static", "abstract", "sealed",
        "virtual", "override", "readonly", "const", "extern", "unsafe", "volatile", "new",
        "event", "implicit", "explicit", "delegate", "ref",
    ],
    contextual_modifiers: &["partial", "async", "required", "file"],
    type_keywords: &["class", "interface", "enum", "struct"],
    primitive_types: &[
        "bool", "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "char",
        "float", "double", "decimal", "string", "object", "void",
    ],
    override_annotations: &[],
    override_modifiers: &["override"],
    number_suffixes: "lLuUfFdDmM",
    float_suffixes: "fFdDmM",
    at_annotations: false,
    triple_slash_docs: true,
};
