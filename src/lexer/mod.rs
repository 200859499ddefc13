//! Tokenizer for Java and C# source text.
//!
//! The lexer is a lazy iterator that covers the whole input: whitespace and
//! comments come out as tokens too, so the parser can attach doc comments
//! and every byte of the source belongs to exactly one token. Malformed
//! literals and comments never stop it; they are recorded as [`LexError`]s
//! and the partial token is still produced.

use crate::diagnostics::LexError;
use crate::dialect::Dialect;
use crate::model::{Position, Span, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Literal(LiteralKind),
    Punct,
    Comment(CommentKind),
    Whitespace,
    /// A character outside the lexical grammar.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    String,
    /// Java `"""` text block.
    TextBlock,
    Char,
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    Line,
    Block,
    /// `/** ... */` in Java, `/// ...` in C#.
    Doc,
    /// C# preprocessor line such as `#region` or `#if DEBUG`.
    Directive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
    pub start: Position,
}

impl<'src> Token<'src> {
    /// Whitespace and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment(_))
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier with the given text (contextual keywords such as `record`).
    pub fn is_word(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword) && self.text == text
    }
}

/// Multi-character punctuators, longest first. `>` never combines so that
/// nested generic argument lists close one bracket at a time.
const PUNCTUATORS: &[&str] = &[
    "<<=", "??=", "...", "->", "=>", "::", "==", "!=", "<=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "<<", "??", "?.",
];

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    dialect: &'static Dialect,
    pos: usize,
    line: usize,
    column: usize,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, variant: Variant) -> Self {
        Self {
            source,
            dialect: variant.dialect(),
            pos: 0,
            line: 1,
            column: 0,
            errors: Vec::new(),
        }
    }

    /// Lex errors seen so far, in source order.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Byte offset (absolute) of the first char at or after `from` matching `pred`.
    fn find_from(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        self.source[from..]
            .char_indices()
            .find(|&(_, c)| pred(c))
            .map(|(i, _)| from + i)
            .unwrap_or(self.source.len())
    }

    /// Only whitespace precedes `offset` on its line.
    fn at_line_start(&self, offset: usize) -> bool {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |nl| nl + 1);
        self.source[line_start..offset].trim().is_empty()
    }

    fn lex_token(&mut self) -> (TokenKind, usize) {
        let start = self.pos;
        let first = match self.peek_nth(0) {
            Some(c) => c,
            None => return (TokenKind::Unknown, start),
        };

        if first.is_whitespace() {
            let end = self.find_from(start, |c| !c.is_whitespace());
            return (TokenKind::Whitespace, end);
        }
        if first == '#' && self.dialect.variant == Variant::CSharp && self.at_line_start(start) {
            let end = self.find_from(start, |c| c == '\n');
            return (TokenKind::Comment(CommentKind::Directive), end);
        }
        if self.starts_with("//") {
            let end = self.find_from(start, |c| c == '\n');
            let doc = self.dialect.triple_slash_docs
                && self.starts_with("///")
                && !self.starts_with("////");
            let kind = if doc { CommentKind::Doc } else { CommentKind::Line };
            return (TokenKind::Comment(kind), end);
        }
        if self.starts_with("/*") {
            return self.lex_block_comment(start);
        }
        if first == '"' {
            if self.dialect.variant == Variant::Java && self.starts_with("\"\"\"") {
                return self.lex_text_block(start);
            }
            let end = self.lex_quoted(start + 1, '"', start);
            return (TokenKind::Literal(LiteralKind::String), end);
        }
        if first == '\'' {
            let end = self.lex_quoted(start + 1, '\'', start);
            return (TokenKind::Literal(LiteralKind::Char), end);
        }
        if self.dialect.variant == Variant::CSharp {
            if let Some(result) = self.lex_csharp_prefixed(start) {
                return result;
            }
        }
        if first.is_ascii_digit()
            || (first == '.' && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.lex_number(start);
        }
        if is_ident_start(first) {
            let end = self.find_from(start, |c| !is_ident_continue(c));
            let word = &self.source[start..end];
            let kind = if self.dialect.is_keyword(word) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            return (kind, end);
        }
        if let Some(p) = PUNCTUATORS.iter().find(|p| self.starts_with(p)) {
            return (TokenKind::Punct, start + p.len());
        }
        let end = start + first.len_utf8();
        if first.is_ascii_punctuation() {
            (TokenKind::Punct, end)
        } else {
            (TokenKind::Unknown, end)
        }
    }

    fn lex_block_comment(&mut self, start: usize) -> (TokenKind, usize) {
        let end = match self.source[start + 2..].find("*/") {
            Some(i) => start + 2 + i + 2,
            None => {
                let end = self.source.len();
                self.errors.push(LexError::UnterminatedComment {
                    span: Span::new(start, end),
                });
                end
            }
        };
        let text = &self.source[start..end];
        let doc = self.dialect.variant == Variant::Java
            && text.starts_with("/**")
            && text != "/**/";
        let kind = if doc { CommentKind::Doc } else { CommentKind::Block };
        (TokenKind::Comment(kind), end)
    }

    /// Scan a quoted literal whose body starts at `from`. Escapes apply; the
    /// literal may not span lines. Returns the end offset.
    fn lex_quoted(&mut self, from: usize, quote: char, start: usize) -> usize {
        let source = self.source;
        let mut chars = source[from..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, '\n')) = chars.clone().next() {
                        continue;
                    }
                    chars.next();
                }
                '\n' => {
                    return self.unterminated(quote, start, from + i);
                }
                c if c == quote => return from + i + c.len_utf8(),
                _ => {}
            }
        }
        self.unterminated(quote, start, self.source.len())
    }

    fn unterminated(&mut self, quote: char, start: usize, end: usize) -> usize {
        let span = Span::new(start, end);
        self.errors.push(if quote == '\'' {
            LexError::UnterminatedChar { span }
        } else {
            LexError::UnterminatedString { span }
        });
        end
    }

    fn lex_text_block(&mut self, start: usize) -> (TokenKind, usize) {
        let body = start + 3;
        let mut chars = self.source[body..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' if self.source[body + i..].starts_with("\"\"\"") => {
                    return (TokenKind::Literal(LiteralKind::TextBlock), body + i + 3);
                }
                _ => {}
            }
        }
        let end = self.source.len();
        self.errors.push(LexError::UnterminatedString {
            span: Span::new(start, end),
        });
        (TokenKind::Literal(LiteralKind::TextBlock), end)
    }

    /// C# `@"verbatim"`, `$"interpolated"`, `$@"..."` strings and `@keyword`
    /// identifiers.
    fn lex_csharp_prefixed(&mut self, start: usize) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        let prefix_len = ["$@\"", "@$\"", "@\"", "$\""]
            .iter()
            .find(|p| rest.starts_with(*p))
            .map(|p| p.len());
        if let Some(len) = prefix_len {
            let prefix = &rest[..len - 1];
            let verbatim = prefix.contains('@');
            let interpolated = prefix.contains('$');
            let end = self.lex_csharp_string(start, start + len, verbatim, interpolated);
            return Some((TokenKind::Literal(LiteralKind::String), end));
        }
        if rest.starts_with('@') && self.peek_nth(1).is_some_and(is_ident_start) {
            let end = self.find_from(start + 1, |c| !is_ident_continue(c));
            return Some((TokenKind::Identifier, end));
        }
        None
    }

    fn lex_csharp_string(
        &mut self,
        start: usize,
        body: usize,
        verbatim: bool,
        interpolated: bool,
    ) -> usize {
        let mut depth = 0usize;
        let mut i = body;
        let source = self.source;
        let bytes = source.as_bytes();
        while i < bytes.len() {
            let b = bytes[i];
            if depth > 0 {
                match b {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    b'"' => {
                        i = self.lex_quoted(i + 1, '"', i);
                        continue;
                    }
                    _ => {}
                }
                i += 1;
                continue;
            }
            match b {
                b'{' if interpolated => {
                    if bytes.get(i + 1) == Some(&b'{') {
                        i += 2;
                        continue;
                    }
                    depth = 1;
                }
                b'\\' if !verbatim => {
                    i += 2;
                    continue;
                }
                b'\n' if !verbatim => {
                    return self.unterminated('"', start, i);
                }
                b'"' => {
                    if verbatim && bytes.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    return i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        self.unterminated('"', start, self.source.len())
    }

    fn lex_number(&mut self, start: usize) -> (TokenKind, usize) {
        let bytes = self.source.as_bytes();
        let mut i = start;
        let mut float = false;
        let lower = |i: usize| bytes.get(i).map(|b| b.to_ascii_lowercase());

        if bytes[i] == b'0' && matches!(lower(i + 1), Some(b'x') | Some(b'b')) {
            let hex = lower(i + 1) == Some(b'x');
            i += 2;
            while let Some(&b) = bytes.get(i) {
                let digit = if hex { b.is_ascii_hexdigit() } else { b == b'0' || b == b'1' };
                if !(digit || b == b'_') {
                    break;
                }
                i += 1;
            }
        } else {
            while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'_') {
                i += 1;
            }
            if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
                float = true;
                i += 1;
                while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'_') {
                    i += 1;
                }
            }
            if lower(i) == Some(b'e') {
                let digits_at = if matches!(bytes.get(i + 1), Some(b'+') | Some(b'-')) {
                    i + 2
                } else {
                    i + 1
                };
                if bytes.get(digits_at).is_some_and(u8::is_ascii_digit) {
                    float = true;
                    i = digits_at;
                    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                        i += 1;
                    }
                }
            }
        }

        let suffixes = self.dialect.number_suffixes.as_bytes();
        let mut taken = 0;
        while taken < 2 && bytes.get(i).is_some_and(|b| suffixes.contains(b)) {
            if self.dialect.float_suffixes.as_bytes().contains(&bytes[i]) {
                float = true;
            }
            i += 1;
            taken += 1;
        }

        let kind = if float {
            LiteralKind::Float
        } else {
            LiteralKind::Integer
        };
        (TokenKind::Literal(kind), i)
    }

    fn advance_to(&mut self, end: usize) {
        let text = &self.source[self.pos..end];
        match text.rfind('\n') {
            Some(nl) => {
                self.line += text.matches('\n').count();
                self.column = text.len() - nl - 1;
            }
            None => self.column += text.len(),
        }
        self.pos = end;
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.source.len() {
            return None;
        }
        let start = self.pos;
        let position = Position {
            line: self.line,
            column: self.column,
        };
        let (kind, end) = self.lex_token();
        // Every branch consumes at least one character.
        let end = end.max(start + self.rest().chars().next().map_or(1, char::len_utf8));
        self.advance_to(end);
        Some(Token {
            kind,
            text: &self.source[start..end],
            span: Span::new(start, end),
            start: position,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tokenize the whole input, returning every token and the lex errors.
pub fn tokenize(source: &str, variant: Variant) -> (Vec<Token<'_>>, Vec<LexError>) {
    let mut lexer = Lexer::new(source, variant);
    let tokens: Vec<Token<'_>> = lexer.by_ref().collect();
    (tokens, lexer.into_errors())
}
