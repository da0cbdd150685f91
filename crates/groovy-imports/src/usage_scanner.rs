//! Collects identifier references from the body of a parsed file.
//!
//! Only bare identifiers are references: a name written after a member
//! access operator (`a.b`, `a?.b`, `a*.b`, `a.&b`, `a.@b`, `A::b`) is
//! resolved against its receiver and can never bind to an import. Comments,
//! plain string text and the package/import clauses are never scanned;
//! interpolation sub-expressions are. Annotations written in front of an
//! import are scanned on request, see [`scan_import_annotations`].

use std::fmt;
use std::ops::Range;

use log::trace;

use crate::groovy_keywords::{introduces_type, is_member_access};
use crate::parser::{BodyItem, BodyItemKind, ImportStatement, ParsedFile};
use crate::span::{LineIndex, SourceSpan};
use crate::tokenizer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceContext {
    TypePosition,
    ValuePosition,
    AnnotationPosition,
    /// A call with no receiver, e.g. `max(a, b)`.
    StaticMemberAccess,
    InterpolationExpression,
}

impl fmt::Display for ReferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TypePosition => "type",
            Self::ValuePosition => "value",
            Self::AnnotationPosition => "annotation",
            Self::StaticMemberAccess => "static-member",
            Self::InterpolationExpression => "interpolation",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierReference {
    pub name: String,
    pub span: SourceSpan,
    pub context: ReferenceContext,
}

/// Scan every body item of `parsed` for identifier references.
pub fn scan_references(source: &str, parsed: &ParsedFile<'_>) -> Vec<IdentifierReference> {
    let mut scanner = UsageScanner::new(source, parsed);
    scanner.scan_items(&parsed.body);
    trace!("collected {} identifier reference(s)", scanner.references.len());
    scanner.references
}

/// References made by the annotations written in front of an import, e.g.
/// `Consts` in `@Grab(group = Consts.G) import a.B`.
///
/// These only count while the import they decorate stays in the file.
pub fn scan_import_annotations(
    source: &str,
    parsed: &ParsedFile<'_>,
    statement: &ImportStatement<'_>,
) -> Vec<IdentifierReference> {
    let mut scanner = UsageScanner::new(source, parsed);
    if let Some(annotations) = statement.annotations.clone() {
        scanner.scan_range(annotations);
    }
    scanner.references
}

struct UsageScanner<'a, 'src> {
    source: &'src str,
    line_index: LineIndex,
    tokens: &'a [Token<'src>],
    references: Vec<IdentifierReference>,
}

impl<'a, 'src> UsageScanner<'a, 'src> {
    fn new(source: &'src str, parsed: &'a ParsedFile<'src>) -> Self {
        Self {
            source,
            line_index: LineIndex::new(source),
            tokens: &parsed.tokens,
            references: Vec::new(),
        }
    }

    fn scan_items(&mut self, items: &[BodyItem]) {
        for item in items {
            match &item.kind {
                BodyItemKind::TypeDeclaration { header, members } => {
                    self.scan_range(header.clone());
                    self.scan_items(members);
                }
                BodyItemKind::Statement => self.scan_range(item.tokens.clone()),
            }
        }
    }

    fn scan_range(&mut self, range: Range<usize>) {
        for i in range {
            let token = self.tokens[i];
            if token.kind != TokenKind::Identifier {
                continue;
            }
            let previous = self.previous_significant(i);
            if previous.is_some_and(|p| p.kind == TokenKind::Operator && is_member_access(p.text)) {
                continue;
            }
            let context = self.classify(i, previous);
            self.references.push(IdentifierReference {
                name: token.text.to_owned(),
                span: self.line_index.span(self.source, token.start, token.end),
                context,
            });
        }
    }

    fn classify(&self, i: usize, previous: Option<&Token<'_>>) -> ReferenceContext {
        if self.tokens[i].interpolation_depth > 0 {
            return ReferenceContext::InterpolationExpression;
        }
        if previous.is_some_and(|p| p.is_operator("@")) {
            return ReferenceContext::AnnotationPosition;
        }
        let after_type_keyword = previous.is_some_and(|p| p.is_word() && introduces_type(p.text));
        let next = self.next_on_line(i + 1);
        let next_token = next.map(|n| &self.tokens[n]);
        if next_token.is_some_and(|n| n.is_operator("(")) && !previous.is_some_and(|p| p.is_keyword("new")) {
            return ReferenceContext::StaticMemberAccess;
        }
        if after_type_keyword {
            return ReferenceContext::TypePosition;
        }
        let (Some(n), Some(next_token)) = (next, next_token) else {
            return ReferenceContext::ValuePosition;
        };
        let after_next = || self.next_on_line(n + 1).map(|a| &self.tokens[a]);
        let is_type = next_token.kind == TokenKind::Identifier
            || next_token.is_operator("...")
            // `Name[]`
            || (next_token.is_operator("[") && after_next().is_some_and(|a| a.is_operator("]")))
            // `Name.class`
            || (next_token.is_operator(".") && after_next().is_some_and(|a| a.is_keyword("class")));
        if is_type {
            ReferenceContext::TypePosition
        } else {
            ReferenceContext::ValuePosition
        }
    }

    fn previous_significant(&self, i: usize) -> Option<&Token<'_>> {
        self.tokens[..i].iter().rev().find(|t| !t.is_trivia())
    }

    /// Index of the next non-trivia token before the end of the line.
    fn next_on_line(&self, mut i: usize) -> Option<usize> {
        while let Some(token) = self.tokens.get(i) {
            match token.kind {
                TokenKind::Whitespace | TokenKind::Comment => i += 1,
                TokenKind::Newline => return None,
                _ => return Some(i),
            }
        }
        None
    }
}
