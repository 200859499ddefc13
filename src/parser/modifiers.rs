//! Modifier and annotation prefix resolution.
//!
//! The parser only delimits the prefix of a declaration (everything before
//! the type keyword, return type or name). This module turns those raw
//! tokens into a normalized modifier list, the annotation usages with their
//! argument text kept verbatim, and the override marker.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::diagnostics::SyntaxError;
use crate::dialect::Dialect;
use crate::lexer::{Token, TokenKind};
use crate::model::{simple_name, Span, Variant, Visibility};

/// An annotation (`@Name(args)`) or attribute (`[Name(args)]`) as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationUse {
    pub name: String,
    pub arguments: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPrefix {
    /// Source order, deduplicated.
    pub modifiers: Vec<String>,
    pub annotations: Vec<AnnotationUse>,
    pub is_override: bool,
    pub span: Option<Span>,
    pub problems: Vec<SyntaxError>,
}

impl ResolvedPrefix {
    /// Order-independent view of the modifiers.
    pub fn modifier_set(&self) -> BTreeSet<&str> {
        self.modifiers.iter().map(String::as_str).collect()
    }

    pub fn has(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty() && self.annotations.is_empty()
    }
}

/// Resolve the raw prefix tokens of one declaration. `tokens` may include
/// trivia; it is what keeps annotation arguments verbatim.
pub fn resolve_prefix(
    tokens: &[Token<'_>],
    dialect: &Dialect,
    extra_override_markers: &[String],
) -> ResolvedPrefix {
    let sig: Vec<usize> = (0..tokens.len()).filter(|&i| !tokens[i].is_trivia()).collect();
    let mut prefix = ResolvedPrefix {
        span: match (sig.first(), sig.last()) {
            (Some(&first), Some(&last)) => Some(Span::new(tokens[first].span.start, tokens[last].span.end)),
            _ => None,
        },
        ..ResolvedPrefix::default()
    };

    let mut i = 0;
    while i < sig.len() {
        let tok = tokens[sig[i]];
        if dialect.at_annotations && tok.is_punct("@") {
            i = read_at_annotation(tokens, &sig, i, &mut prefix.annotations);
            continue;
        }
        if !dialect.at_annotations && tok.is_punct("[") {
            i = read_attribute_section(tokens, &sig, i, &mut prefix.annotations);
            continue;
        }
        let (word, span, next) = if tok.is_word("non")
            && sig.get(i + 2).is_some_and(|&j| tokens[j].is_word("sealed"))
            && sig.get(i + 1).is_some_and(|&j| tokens[j].is_punct("-"))
        {
            let end = tokens[sig[i + 2]].span.end;
            ("non-sealed".to_string(), Span::new(tok.span.start, end), i + 3)
        } else {
            (tok.text.to_string(), tok.span, i + 1)
        };
        if prefix.modifiers.contains(&word) {
            prefix
                .problems
                .push(SyntaxError::new(format!("repeated modifier `{}`", word), span));
        } else {
            check_visibility_conflict(&prefix.modifiers, &word, span, dialect, &mut prefix.problems);
            prefix.modifiers.push(word);
        }
        i = next;
    }

    prefix.is_override = prefix
        .modifiers
        .iter()
        .any(|m| dialect.override_modifiers.contains(&m.as_str()))
        || prefix.annotations.iter().any(|a| {
            let name = simple_name(&a.name);
            dialect.override_annotations.contains(&name)
                || extra_override_markers.iter().any(|m| simple_name(m) == name)
        });
    prefix
}

fn check_visibility_conflict(
    seen: &[String],
    word: &str,
    span: Span,
    dialect: &Dialect,
    problems: &mut Vec<SyntaxError>,
) {
    if !dialect.is_visibility(word) {
        return;
    }
    for prior in seen.iter().filter(|m| dialect.is_visibility(m)) {
        let combined = matches!(
            (prior.as_str(), word),
            ("protected", "internal")
                | ("internal", "protected")
                | ("private", "protected")
                | ("protected", "private")
        );
        if !(combined && dialect.variant == Variant::CSharp) {
            problems.push(SyntaxError::new(
                format!("conflicting visibility modifiers `{}` and `{}`", prior, word),
                span,
            ));
            return;
        }
    }
}

/// Verbatim text of the raw tokens after `open`, up to `close` or the end
/// of the prefix when the group was never closed.
fn text_between(tokens: &[Token<'_>], open: usize, close: Option<usize>) -> String {
    let end = close.unwrap_or(tokens.len()).max(open + 1);
    tokens[open + 1..end]
        .iter()
        .map(|t| t.text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Index into `sig` of the closer matching the opener at `sig[at]`, if the
/// prefix contains it.
fn matching(tokens: &[Token<'_>], sig: &[usize], at: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (k, &j) in sig.iter().enumerate().skip(at) {
        if tokens[j].is_punct(open) {
            depth += 1;
        } else if tokens[j].is_punct(close) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(k);
            }
        }
    }
    None
}

/// Dotted name starting at `sig[at]`; returns the name and the index after it.
fn read_name(tokens: &[Token<'_>], sig: &[usize], mut at: usize) -> (String, usize) {
    let mut name = String::new();
    while let Some(&j) = sig.get(at) {
        let tok = tokens[j];
        let word = tok.is_ident() || tok.kind == TokenKind::Keyword;
        let sep = tok.is_punct(".") || tok.is_punct("::");
        let expects_word = name.is_empty() || name.ends_with('.') || name.ends_with("::");
        if (word && expects_word) || (sep && !expects_word) {
            name.push_str(tok.text);
            at += 1;
        } else {
            break;
        }
    }
    (name, at)
}

fn read_at_annotation(
    tokens: &[Token<'_>],
    sig: &[usize],
    at: usize,
    out: &mut Vec<AnnotationUse>,
) -> usize {
    let start = tokens[sig[at]].span.start;
    let (name, mut next) = read_name(tokens, sig, at + 1);
    let mut end = tokens[sig[next - 1]].span.end;
    let mut arguments = None;
    if sig.get(next).is_some_and(|&j| tokens[j].is_punct("(")) {
        match matching(tokens, sig, next, "(", ")") {
            Some(close) => {
                arguments = Some(text_between(tokens, sig[next], Some(sig[close])));
                end = tokens[sig[close]].span.end;
                next = close + 1;
            }
            // Unclosed: the parser reports it; keep what was written.
            None => {
                arguments = Some(text_between(tokens, sig[next], None));
                end = tokens[sig[sig.len() - 1]].span.end;
                next = sig.len();
            }
        }
    }
    out.push(AnnotationUse {
        name,
        arguments,
        span: Span::new(start, end),
    });
    next
}

/// `[Target: A, B(x)]`; the target specifier is dropped.
fn read_attribute_section(
    tokens: &[Token<'_>],
    sig: &[usize],
    at: usize,
    out: &mut Vec<AnnotationUse>,
) -> usize {
    let close = matching(tokens, sig, at, "[", "]").unwrap_or(sig.len());
    let mut k = at + 1;
    if sig.get(k + 1).is_some_and(|&j| tokens[j].is_punct(":")) {
        k += 2;
    }
    while k < close {
        let start = tokens[sig[k]].span.start;
        let (name, mut next) = read_name(tokens, sig, k);
        if name.is_empty() {
            k += 1;
            continue;
        }
        let mut end = tokens[sig[next - 1]].span.end;
        let mut arguments = None;
        if next < close && tokens[sig[next]].is_punct("(") {
            match matching(tokens, sig, next, "(", ")").filter(|&paren| paren < close) {
                Some(paren) => {
                    arguments = Some(text_between(tokens, sig[next], Some(sig[paren])));
                    end = tokens[sig[paren]].span.end;
                    next = paren + 1;
                }
                None => {
                    let section_end = sig.get(close).copied();
                    arguments = Some(text_between(tokens, sig[next], section_end));
                    end = tokens[sig[close - 1]].span.end;
                    next = close;
                }
            }
        }
        out.push(AnnotationUse {
            name,
            arguments,
            span: Span::new(start, end),
        });
        k = next;
        while k < close && !tokens[sig[k]].is_punct(",") {
            k += 1;
        }
        k += 1;
    }
    (close + 1).min(sig.len())
}

/// Where a declaration sits, for default visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    TopLevel,
    /// Member of an interface or annotation type.
    InterfaceMember,
    Member,
}

/// Explicit access keyword if any, else the variant's default for the
/// declaration's placement.
pub fn effective_visibility(modifiers: &[String], variant: Variant, placement: Placement) -> Visibility {
    let has = |m: &str| modifiers.iter().any(|x| x == m);
    if has("protected") && (has("internal") || has("private")) {
        return Visibility::Protected;
    }
    let explicit = modifiers.iter().find_map(|m| match m.as_str() {
        "public" => Some(Visibility::Public),
        "protected" => Some(Visibility::Protected),
        "private" => Some(Visibility::Private),
        "internal" if variant == Variant::CSharp => Some(Visibility::Internal),
        _ => None,
    });
    if let Some(visibility) = explicit {
        return visibility;
    }
    match (variant, placement) {
        (_, Placement::InterfaceMember) => Visibility::Public,
        (Variant::Java, _) => Visibility::Package,
        (Variant::CSharp, Placement::TopLevel) => Visibility::Internal,
        (Variant::CSharp, Placement::Member) => Visibility::Private,
    }
}
