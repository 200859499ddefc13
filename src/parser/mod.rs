//! Recursive-descent declaration parser.
//!
//! Works over the significant tokens of one source unit and builds a
//! [`DeclTree`]. Method bodies and initializers are skipped by bracket
//! matching. Grammar mismatches never abort the parse: the parser records a
//! syntax diagnostic, skips to a synchronization point and carries on, so
//! every input yields a tree.

use tracing::{debug, trace};

use crate::diagnostics::{DiagnosticId, Diagnostics, SyntaxError};
use crate::dialect::Dialect;
use crate::lexer::{tokenize, CommentKind, Token, TokenKind};
use crate::model::{ImportRecord, LineIndex, Span, Variant};

mod csharp;
mod decl;
mod java;
pub mod modifiers;
pub mod tree;

pub use modifiers::{effective_visibility, resolve_prefix, AnnotationUse, Placement, ResolvedPrefix};
pub use tree::{
    ConstructorDecl, DeclId, DeclKind, DeclNode, DeclTree, EnumConstantDecl, FieldDecl, MethodDecl,
    TypeDecl, TypeKind,
};

/// Everything the parser learned about one source unit.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub variant: Variant,
    pub tree: DeclTree,
    pub diagnostics: Diagnostics,
    /// Java `package` or the C# namespace enclosing the first declaration.
    pub package: Option<String>,
    pub imports: Vec<ImportRecord>,
}

/// Parse with the dialect's built-in override markers only.
pub fn parse(source: &str, variant: Variant) -> ParsedUnit {
    parse_with(source, variant, &[])
}

/// Parse, treating `override_markers` as additional override annotations.
pub fn parse_with(source: &str, variant: Variant, override_markers: &[String]) -> ParsedUnit {
    let (tokens, lex_errors) = tokenize(source, variant);
    let mut diagnostics = Diagnostics::new(LineIndex::new(source));
    for error in &lex_errors {
        diagnostics.lex(error);
    }

    let mut parser = Parser::new(source, variant.dialect(), tokens, diagnostics, override_markers);
    parser.parse_unit();

    debug!(
        variant = %variant,
        tokens = parser.sig.len(),
        declarations = parser.tree.len() - 1,
        diagnostics = parser.diagnostics.len(),
        "parsed source unit"
    );

    ParsedUnit {
        variant,
        tree: parser.tree,
        diagnostics: parser.diagnostics,
        package: parser.package,
        imports: parser.imports,
    }
}

/// A grammar mismatch on its way to the nearest recovery point.
#[derive(Debug)]
struct ParseFailure {
    error: SyntaxError,
    /// Node allocated before the failure; it becomes partial.
    node: Option<DeclId>,
    /// Already recorded (unclosed block); no skipping, no new diagnostic.
    reported: Option<DiagnosticId>,
}

impl ParseFailure {
    fn new(error: SyntaxError) -> Self {
        Self {
            error,
            node: None,
            reported: None,
        }
    }

    fn reported(error: SyntaxError, id: DiagnosticId) -> Self {
        Self {
            error,
            node: None,
            reported: Some(id),
        }
    }

    fn with_node(mut self, id: DeclId) -> Self {
        if self.node.is_none() {
            self.node = Some(id);
        }
        self
    }
}

type PResult<T> = Result<T, ParseFailure>;

struct Parser<'src> {
    source: &'src str,
    dialect: &'static Dialect,
    override_markers: Vec<String>,
    /// Every token, trivia included.
    all: Vec<Token<'src>>,
    /// Indices into `all` of the significant tokens.
    sig: Vec<usize>,
    pos: usize,
    tree: DeclTree,
    diagnostics: Diagnostics,
    package: Option<String>,
    imports: Vec<ImportRecord>,
    /// Enclosing C# namespace blocks, outermost first.
    namespaces: Vec<String>,
    /// Set when the unit has more `{` than `}`.
    dedent_recovery: bool,
    /// Column of the top-level declaration being parsed.
    decl_column: usize,
    /// Diagnostic of an unclosed block whose enclosing bodies are closing.
    unwinding: Option<DiagnosticId>,
}

impl<'src> Parser<'src> {
    fn new(
        source: &'src str,
        dialect: &'static Dialect,
        all: Vec<Token<'src>>,
        diagnostics: Diagnostics,
        override_markers: &[String],
    ) -> Self {
        let sig: Vec<usize> = (0..all.len()).filter(|&i| !all[i].is_trivia()).collect();
        let (open, close) = sig.iter().fold((0usize, 0usize), |(o, c), &i| {
            if all[i].is_punct("{") {
                (o + 1, c)
            } else if all[i].is_punct("}") {
                (o, c + 1)
            } else {
                (o, c)
            }
        });
        Self {
            source,
            dialect,
            override_markers: override_markers.to_vec(),
            all,
            sig,
            pos: 0,
            tree: DeclTree::new(Span::new(0, source.len())),
            diagnostics,
            package: None,
            imports: Vec::new(),
            namespaces: Vec::new(),
            dedent_recovery: open > close,
            decl_column: 0,
            unwinding: None,
        }
    }

    fn variant(&self) -> Variant {
        self.dialect.variant
    }

    fn is_java(&self) -> bool {
        self.dialect.variant == Variant::Java
    }

    fn is_csharp(&self) -> bool {
        self.dialect.variant == Variant::CSharp
    }

    // ---- cursor ----

    fn peek_n(&self, n: usize) -> Option<Token<'src>> {
        self.sig.get(self.pos + n).map(|&i| self.all[i])
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.peek_n(0)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.sig.len()
    }

    fn at(&self, punct: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(punct))
    }

    fn at_n(&self, n: usize, punct: &str) -> bool {
        self.peek_n(n).is_some_and(|t| t.is_punct(punct))
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn at_n_word(&self, n: usize, word: &str) -> bool {
        self.peek_n(n).is_some_and(|t| t.is_word(word))
    }

    fn at_ident(&self) -> bool {
        self.peek().is_some_and(|t| t.is_ident())
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.at(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.sig.get(p))
            .map_or(0, |&i| self.all[i].span.end)
    }

    /// Span of the current token, or an empty span at end of input.
    fn here(&self) -> Span {
        self.peek()
            .map_or(Span::empty(self.source.len()), |t| t.span)
    }

    fn describe_here(&self) -> String {
        match self.peek() {
            Some(tok) => format!("`{}`", tok.text),
            None => "end of input".to_string(),
        }
    }

    fn expected(&self, what: &str, context: &str) -> ParseFailure {
        let message = if context.is_empty() {
            format!("expected {}, found {}", what, self.describe_here())
        } else {
            format!("expected {} {}, found {}", what, context, self.describe_here())
        };
        ParseFailure::new(SyntaxError::new(message, self.here()))
    }

    fn expect(&mut self, punct: &str, context: &str) -> PResult<Token<'src>> {
        if self.at(punct) {
            self.pos += 1;
            Ok(self.all[self.sig[self.pos - 1]])
        } else {
            Err(self.expected(&format!("`{}`", punct), context))
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<Token<'src>> {
        match self.peek() {
            Some(tok) if tok.is_ident() => {
                self.pos += 1;
                Ok(tok)
            }
            _ => Err(ParseFailure::new(SyntaxError::new(
                format!("expected {}, found {}", what, self.describe_here()),
                self.here(),
            ))),
        }
    }

    /// Raw tokens (trivia included) of the significant range `from..to`.
    fn raw_range(&self, from: usize, to: usize) -> &[Token<'src>] {
        if from >= to {
            return &[];
        }
        &self.all[self.sig[from]..=self.sig[to - 1]]
    }

    /// Significant tokens `from..self.pos` joined into normalized text.
    fn text_from(&self, from: usize) -> String {
        join_tokens(self.sig[from..self.pos].iter().map(|&i| &self.all[i]))
    }

    // ---- recovery ----

    /// First token on its line, at or left of the current top-level
    /// declaration's column, and able to start a declaration.
    fn at_dedented_decl(&self) -> bool {
        if !self.dedent_recovery {
            return false;
        }
        let Some(tok) = self.peek() else {
            return false;
        };
        let first_on_line = self.pos == 0
            || self
                .sig
                .get(self.pos - 1)
                .is_some_and(|&i| self.all[i].start.line < tok.start.line);
        first_on_line && tok.start.column <= self.decl_column && self.can_start_decl(tok)
    }

    fn can_start_decl(&self, tok: Token<'_>) -> bool {
        match tok.kind {
            TokenKind::Keyword | TokenKind::Identifier => {
                self.dialect.is_modifier(tok.text)
                    || self.dialect.is_type_keyword(tok.text)
                    || tok.text == "record"
            }
            TokenKind::Punct if self.dialect.at_annotations => tok.text == "@",
            TokenKind::Punct => tok.text == "[",
            _ => false,
        }
    }

    /// Skip a balanced `{ ... }` starting at the current `{`.
    fn skip_block(&mut self) -> PResult<Span> {
        let open = self.here();
        self.pos += 1;
        let mut depth = 1usize;
        loop {
            if self.at_eof() {
                return Err(self.unclosed(open, "unexpected end of input: missing `}`".to_string()));
            }
            if self.at_dedented_decl() {
                return Err(self.unclosed(open, "missing `}`".to_string()));
            }
            let tok = self.all[self.sig[self.pos]];
            self.pos += 1;
            if tok.is_punct("{") {
                depth += 1;
            } else if tok.is_punct("}") {
                depth -= 1;
                if depth == 0 {
                    return Ok(Span::new(open.start, tok.span.end));
                }
            }
        }
    }

    /// Skip a balanced group starting at the current `open` token. Stops
    /// short at a `;` or an unmatched `}` outside braces.
    fn skip_group(&mut self, open: &str, close: &str) -> PResult<Span> {
        let start = self.here();
        let mut depth = 0usize;
        let mut braces = 0usize;
        while let Some(tok) = self.peek() {
            if tok.is_punct(open) {
                depth += 1;
            } else if tok.is_punct(close) {
                depth = depth.saturating_sub(1);
            } else if tok.is_punct("{") {
                braces += 1;
            } else if tok.is_punct("}") {
                if braces == 0 {
                    break;
                }
                braces -= 1;
            } else if tok.is_punct(";") && braces == 0 {
                break;
            }
            self.pos += 1;
            if depth == 0 {
                return Ok(Span::new(start.start, tok.span.end));
            }
        }
        Err(ParseFailure::new(SyntaxError::new(
            format!("unclosed `{}`", open),
            Span::new(start.start, self.prev_end().max(start.end)),
        )))
    }

    /// Record the single diagnostic for an unclosed block and start
    /// closing the enclosing bodies.
    fn unclosed(&mut self, open: Span, message: String) -> ParseFailure {
        let error = SyntaxError::new(message, Span::new(open.start, self.prev_end().max(open.end)));
        let id = self.diagnostics.syntax(&error);
        self.unwinding = Some(id);
        ParseFailure::reported(error, id)
    }

    /// Skip to a `;` at depth zero (consumed), the end of a balanced brace
    /// group (consumed), a `}` at depth zero, or a dedented declaration.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            if self.at_dedented_decl() || (depth == 0 && tok.is_punct("}")) {
                break;
            }
            self.pos += 1;
            if tok.is_punct("{") {
                depth += 1;
            } else if tok.is_punct("}") {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if tok.is_punct(";") && depth == 0 {
                break;
            }
        }
    }

    fn recover(&mut self, failure: ParseFailure, member_start: usize) {
        if let Some(id) = failure.reported {
            if let Some(node) = failure.node {
                let end = self.prev_end();
                self.tree.mark_partial(node, id, end);
            }
            return;
        }
        let skip_from = self.pos;
        self.synchronize();
        if self.pos == member_start && !self.at_eof() {
            self.pos += 1;
        }
        let mut span = failure.error.span;
        if self.pos > skip_from {
            span = span.cover(Span::new(span.start, self.prev_end()));
        }
        trace!(
            message = %failure.error.message,
            skipped = self.pos - skip_from,
            "recovered from syntax error"
        );
        let id = self
            .diagnostics
            .syntax(&SyntaxError::new(failure.error.message, span));
        if let Some(node) = failure.node {
            let end = self.prev_end();
            self.tree.mark_partial(node, id, end);
        }
    }

    // ---- prefix and docs ----

    /// Consume the modifier/annotation prefix of a declaration and resolve it.
    fn prefix(&mut self) -> ResolvedPrefix {
        let first = self.pos;
        while let Some(tok) = self.peek() {
            if self.dialect.at_annotations && tok.is_punct("@") && !self.at_n_word(1, "interface") {
                self.skip_annotation();
            } else if !self.dialect.at_annotations && tok.is_punct("[") {
                if self.skip_group("[", "]").is_err() {
                    break;
                }
            } else if self.is_java()
                && tok.is_word("non")
                && self.at_n(1, "-")
                && self.at_n_word(2, "sealed")
            {
                self.pos += 3;
            } else if tok.kind == TokenKind::Keyword && self.dialect.modifiers.contains(&tok.text) {
                self.pos += 1;
            } else if tok.is_ident()
                && self.dialect.contextual_modifiers.contains(&tok.text)
                && self
                    .peek_n(1)
                    .is_some_and(|t| matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword))
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        let resolved = resolve_prefix(
            self.raw_range(first, self.pos),
            self.dialect,
            &self.override_markers,
        );
        for problem in &resolved.problems {
            self.diagnostics.syntax(problem);
        }
        resolved
    }

    /// `@Name(...)`, name possibly qualified.
    fn skip_annotation(&mut self) {
        self.pos += 1;
        while let Some(tok) = self.peek() {
            let word = matches!(tok.kind, TokenKind::Identifier | TokenKind::Keyword);
            if word || tok.is_punct(".") {
                self.pos += 1;
                if word && !self.at(".") {
                    break;
                }
            } else {
                break;
            }
        }
        if self.at("(") {
            let _ = self.skip_group("(", ")");
        }
    }

    /// Doc comment immediately preceding the significant token at `at`.
    fn doc_before(&self, at: usize) -> Option<String> {
        let end = *self.sig.get(at)?;
        let mut docs: Vec<&str> = Vec::new();
        for tok in self.all[..end].iter().rev() {
            match tok.kind {
                TokenKind::Whitespace => {}
                TokenKind::Comment(CommentKind::Doc) => {
                    docs.push(tok.text);
                    if self.is_java() {
                        break;
                    }
                }
                TokenKind::Comment(_) if docs.is_empty() => {}
                _ => break,
            }
        }
        if docs.is_empty() {
            return None;
        }
        docs.reverse();
        Some(clean_doc(&docs))
    }

    // ---- source unit ----

    fn parse_unit(&mut self) {
        while !self.at_eof() {
            self.unit_item();
        }
        if self.is_csharp() {
            csharp::classify_bases(&mut self.tree);
        }
    }

    /// One directive or top-level declaration.
    fn unit_item(&mut self) {
        let start = self.pos;
        let directive = match self.variant() {
            Variant::Java => self.java_directive(),
            Variant::CSharp => self.csharp_directive(),
        };
        match directive {
            Ok(true) => {}
            Ok(false) => self.top_level_declaration(),
            Err(failure) => self.recover(failure, start),
        }
    }

    fn top_level_declaration(&mut self) {
        if self.eat(";") {
            return;
        }
        if self.at("}") {
            let span = self.here();
            self.pos += 1;
            self.diagnostics
                .syntax(&SyntaxError::new("unexpected `}` at file level", span));
            return;
        }
        self.unwinding = None;
        if self.package.is_none() && !self.namespaces.is_empty() {
            self.package = Some(self.namespaces.join("."));
        }
        self.decl_column = self.peek().map_or(0, |t| t.start.column);
        let start = self.pos;
        let root = self.tree.root();
        if let Err(failure) = self.member(root) {
            self.recover(failure, start);
        }
    }
}

/// Join significant tokens into readable type text: `Map<String, List<T>>`,
/// `? extends T`, `A & B`.
fn join_tokens<'a, 'src: 'a>(tokens: impl Iterator<Item = &'a Token<'src>>) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token<'src>> = None;
    let is_word = |t: &Token<'_>| matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword);
    for tok in tokens {
        if let Some(p) = prev {
            let space = (is_word(p) && is_word(tok))
                || (p.is_punct(",") && !tok.is_punct("]") && !tok.is_punct(","))
                || (p.is_punct("?") && is_word(tok))
                || p.is_punct("&")
                || tok.is_punct("&");
            if space {
                out.push(' ');
            }
        }
        out.push_str(tok.text);
        prev = Some(tok);
    }
    out
}

/// Strip comment markers and leading asterisks from doc comment text.
fn clean_doc(parts: &[&str]) -> String {
    let mut lines = Vec::new();
    for part in parts {
        let body = match part.strip_prefix("///") {
            Some(rest) => rest,
            None => part.trim_start_matches("/**").trim_end_matches("*/"),
        };
        for line in body.lines() {
            let line = line.trim();
            let line = line.strip_prefix('*').map_or(line, str::trim_start);
            lines.push(line);
        }
    }
    lines.join("\n").trim().to_string()
}
