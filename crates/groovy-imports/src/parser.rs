//! Structural parser.
//!
//! Recognizes just enough of a Groovy compilation unit to delimit the package
//! clause and every import statement. Everything else becomes body items:
//! type declarations (with their members parsed recursively) or opaque
//! statements. Unfamiliar syntax is carried as opaque tokens rather than
//! rejected; only bracket structure and the import grammar itself can fail.

use std::ops::Range;

use log::trace;

use crate::groovy_keywords::{is_member_access, is_modifier, is_type_declaration_keyword};
use crate::span::{LineIndex, SourceSpan};
use crate::tokenizer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unbalanced closing `{0}`")]
    UnbalancedBracket(char),
    #[error("unclosed `{0}`")]
    UnclosedBracket(char),
    #[error("malformed import statement")]
    MalformedImport,
    #[error("malformed package clause")]
    MalformedPackage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: SourceSpan,
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageClause {
    pub span: SourceSpan,
    pub tokens: Range<usize>,
}

/// One `import` statement as written, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatement<'src> {
    /// Annotations written in front of the statement, e.g. `@Grab(...)`.
    pub annotations: Option<Range<usize>>,
    pub is_static: bool,
    pub segments: Vec<&'src str>,
    pub wildcard: bool,
    pub alias: Option<&'src str>,
    pub span: SourceSpan,
    pub tokens: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItemKind {
    TypeDeclaration {
        /// Annotations, modifiers, name, type parameters, supertypes.
        header: Range<usize>,
        members: Vec<BodyItem>,
    },
    Statement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyItem {
    pub kind: BodyItemKind,
    pub tokens: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct ParsedFile<'src> {
    pub tokens: Vec<Token<'src>>,
    pub package: Option<PackageClause>,
    pub imports: Vec<ImportStatement<'src>>,
    pub body: Vec<BodyItem>,
}

/// Parse a token stream produced by the tokenizer for `source`.
pub fn parse<'src>(source: &'src str, tokens: Vec<Token<'src>>) -> ParseResult<ParsedFile<'src>> {
    let mut parser = Parser::new(source, tokens)?;
    let len = parser.tokens.len();
    let body = parser.parse_items(0..len, true)?;
    trace!(
        "parsed {} import(s), {} top-level body item(s)",
        parser.imports.len(),
        body.len()
    );
    Ok(ParsedFile {
        tokens: parser.tokens,
        package: parser.package,
        imports: parser.imports,
        body,
    })
}

struct Parser<'src> {
    source: &'src str,
    line_index: LineIndex,
    tokens: Vec<Token<'src>>,
    /// For each opening bracket token, the index of its closing token.
    closing: Vec<Option<usize>>,
    package: Option<PackageClause>,
    imports: Vec<ImportStatement<'src>>,
    seen_statement: bool,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: Vec<Token<'src>>) -> ParseResult<Self> {
        let line_index = LineIndex::new(source);
        let mut closing = vec![None; tokens.len()];
        let mut open: Vec<(usize, char)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Operator {
                continue;
            }
            match token.text {
                "(" => open.push((i, ')')),
                "[" => open.push((i, ']')),
                "{" => open.push((i, '}')),
                ")" | "]" | "}" => {
                    let found = token.text.chars().next().unwrap_or(')');
                    match open.pop() {
                        Some((opener, expected)) if expected == found => closing[opener] = Some(i),
                        _ => {
                            return Err(ParseError {
                                kind: ParseErrorKind::UnbalancedBracket(found),
                                span: line_index.span(source, token.start, token.end),
                            });
                        }
                    }
                }
                _ => {}
            }
        }
        if let Some(&(opener, _)) = open.last() {
            let token = &tokens[opener];
            let ch = token.text.chars().next().unwrap_or('(');
            return Err(ParseError {
                kind: ParseErrorKind::UnclosedBracket(ch),
                span: line_index.span(source, token.start, token.end),
            });
        }
        Ok(Self {
            source,
            line_index,
            tokens,
            closing,
            package: None,
            imports: Vec::new(),
            seen_statement: false,
        })
    }

    fn span_of(&self, tokens: Range<usize>) -> SourceSpan {
        let start = self.tokens[tokens.start].start;
        let end = self.tokens[tokens.end - 1].end;
        self.line_index.span(self.source, start, end)
    }

    fn error(&self, kind: ParseErrorKind, at: usize) -> ParseError {
        let index = at.min(self.tokens.len().saturating_sub(1));
        let (start, end) = self
            .tokens
            .get(index)
            .map_or((self.source.len(), self.source.len()), |t| (t.start, t.end));
        ParseError {
            kind,
            span: self.line_index.span(self.source, start, end),
        }
    }

    /// Next index at or after `i` (below `end`) that is not trivia.
    fn next_significant(&self, mut i: usize, end: usize) -> Option<usize> {
        while i < end {
            if !self.tokens[i].is_trivia() {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Like `next_significant`, but a newline stops the search.
    fn next_on_line(&self, mut i: usize, end: usize) -> Option<usize> {
        while i < end {
            match self.tokens[i].kind {
                TokenKind::Newline => return None,
                TokenKind::Whitespace | TokenKind::Comment => i += 1,
                _ => return Some(i),
            }
        }
        None
    }

    fn previous_significant(&self, i: usize) -> Option<&Token<'src>> {
        self.tokens[..i].iter().rev().find(|t| !t.is_trivia())
    }

    /// Index just past a balanced group opened at `i`, or `i + 1`.
    fn skip_group(&self, i: usize) -> usize {
        self.closing[i].map_or(i + 1, |close| close + 1)
    }

    /// Skip annotations (`@a.b.C(...)`) starting at `i`, newlines included.
    /// Returns the index of the first token after them, or `None` if `i`
    /// does not start an annotation.
    fn skip_annotations(&self, i: usize, end: usize) -> Option<usize> {
        let mut cursor = i;
        let mut found = false;
        loop {
            let Some(at) = self.next_significant(cursor, end) else {
                return found.then_some(end);
            };
            if !self.tokens[at].is_operator("@") {
                return found.then_some(at);
            }
            let name = self.next_significant(at + 1, end)?;
            if !self.tokens[name].is_word() || self.tokens[name].is_keyword("interface") {
                return found.then_some(at);
            }
            cursor = name + 1;
            while let Some(dot) = self.next_on_line(cursor, end) {
                if !self.tokens[dot].is_operator(".") {
                    break;
                }
                match self.next_on_line(dot + 1, end) {
                    Some(segment) if self.tokens[segment].is_word() => cursor = segment + 1,
                    _ => break,
                }
            }
            if let Some(paren) = self.next_on_line(cursor, end) {
                if self.tokens[paren].is_operator("(") {
                    cursor = self.skip_group(paren);
                }
            }
            found = true;
        }
    }

    fn parse_items(&mut self, range: Range<usize>, top_level: bool) -> ParseResult<Vec<BodyItem>> {
        let mut items = Vec::new();
        let mut i = range.start;
        while i < range.end {
            let token = self.tokens[i];
            if token.is_trivia() || token.is_operator(";") {
                i += 1;
                continue;
            }
            if top_level {
                if let Some(next) = self.try_top_level_clause(i, range.end, &mut items)? {
                    i = next;
                    continue;
                }
            }
            self.seen_statement = true;
            let item = match self.try_type_declaration(i, range.end)? {
                Some(item) => item,
                None => self.statement(i, range.end),
            };
            i = item.tokens.end;
            items.push(item);
        }
        Ok(items)
    }

    /// Package clause or import statement at `i`; returns the index after it.
    fn try_top_level_clause(
        &mut self,
        i: usize,
        end: usize,
        items: &mut Vec<BodyItem>,
    ) -> ParseResult<Option<usize>> {
        let keyword_at = self.skip_annotations(i, end).unwrap_or(i);
        let Some(keyword) = self.tokens.get(keyword_at).copied() else {
            return Ok(None);
        };
        if keyword.is_keyword("import") {
            if self
                .previous_significant(keyword_at)
                .is_some_and(|t| t.kind == TokenKind::Operator && is_member_access(t.text))
            {
                return Ok(None);
            }
            let annotations = (keyword_at > i).then_some(i..keyword_at);
            let statement = self.import_statement(i, keyword_at, annotations, end)?;
            let next = statement.tokens.end;
            self.imports.push(statement);
            return Ok(Some(next));
        }
        if keyword.is_keyword("package") && !self.seen_statement && self.package.is_none() {
            if keyword_at > i {
                items.push(BodyItem {
                    kind: BodyItemKind::Statement,
                    tokens: i..keyword_at,
                });
            }
            let clause = self.package_clause(keyword_at, end)?;
            let next = clause.tokens.end;
            self.package = Some(clause);
            self.seen_statement = true;
            return Ok(Some(next));
        }
        Ok(None)
    }

    /// Parse `segment(.segment)*` on the current line, starting after `i`.
    /// Stops before `.*`, which callers handle.
    fn dotted_name(&self, i: usize, end: usize) -> Option<(Vec<&'src str>, usize)> {
        let first = self.next_on_line(i, end)?;
        if !self.tokens[first].is_word() {
            return None;
        }
        let mut segments = vec![self.tokens[first].text];
        let mut last = first;
        while let Some(dot) = self.next_on_line(last + 1, end) {
            if !self.tokens[dot].is_operator(".") {
                break;
            }
            match self.next_on_line(dot + 1, end) {
                Some(segment) if self.tokens[segment].is_word() => {
                    segments.push(self.tokens[segment].text);
                    last = segment;
                }
                _ => break,
            }
        }
        Some((segments, last))
    }

    fn import_statement(
        &self,
        start: usize,
        keyword: usize,
        annotations: Option<Range<usize>>,
        end: usize,
    ) -> ParseResult<ImportStatement<'src>> {
        let malformed = |at: usize| self.error(ParseErrorKind::MalformedImport, at);

        let mut cursor = keyword + 1;
        let mut is_static = false;
        if let Some(at) = self.next_on_line(cursor, end) {
            if self.tokens[at].is_keyword("static") {
                is_static = true;
                cursor = at + 1;
            }
        }

        let (segments, mut last) = self.dotted_name(cursor, end).ok_or_else(|| malformed(keyword))?;

        let mut wildcard = false;
        if let Some(dot) = self.next_on_line(last + 1, end) {
            if self.tokens[dot].is_operator(".") {
                match self.next_on_line(dot + 1, end) {
                    Some(star) if self.tokens[star].is_operator("*") => {
                        wildcard = true;
                        last = star;
                    }
                    _ => return Err(malformed(dot)),
                }
            }
        }

        let mut alias = None;
        if let Some(as_kw) = self.next_on_line(last + 1, end) {
            if self.tokens[as_kw].is_keyword("as") {
                match self.next_on_line(as_kw + 1, end) {
                    Some(name) if self.tokens[name].kind == TokenKind::Identifier && !wildcard => {
                        alias = Some(self.tokens[name].text);
                        last = name;
                    }
                    _ => return Err(malformed(as_kw)),
                }
            }
        }

        if let Some(semi) = self.next_on_line(last + 1, end) {
            if self.tokens[semi].is_operator(";") {
                last = semi;
            }
        }

        let tokens = start..last + 1;
        Ok(ImportStatement {
            annotations,
            is_static,
            segments,
            wildcard,
            alias,
            span: self.span_of(tokens.clone()),
            tokens,
        })
    }

    fn package_clause(&self, keyword: usize, end: usize) -> ParseResult<PackageClause> {
        let (_, mut last) = self
            .dotted_name(keyword + 1, end)
            .ok_or_else(|| self.error(ParseErrorKind::MalformedPackage, keyword))?;
        if let Some(semi) = self.next_on_line(last + 1, end) {
            if self.tokens[semi].is_operator(";") {
                last = semi;
            }
        }
        let tokens = keyword..last + 1;
        Ok(PackageClause {
            span: self.span_of(tokens.clone()),
            tokens,
        })
    }

    /// Recognize `[annotations] [modifiers] (class|interface|enum|trait|record|@interface) Name ... { ... }`.
    fn try_type_declaration(&mut self, i: usize, end: usize) -> ParseResult<Option<BodyItem>> {
        let mut cursor = self.skip_annotations(i, end).unwrap_or(i);
        let keyword_at = loop {
            let Some(at) = self.next_significant(cursor, end) else {
                return Ok(None);
            };
            let token = self.tokens[at];
            if token.is_word() && is_modifier(token.text) {
                cursor = at + 1;
                continue;
            }
            // `non-sealed`
            if token.is_operator("-") {
                cursor = at + 1;
                continue;
            }
            if token.is_operator("@") {
                if let Some(kw) = self.next_significant(at + 1, end) {
                    if self.tokens[kw].is_keyword("interface") {
                        break kw;
                    }
                }
                cursor = self.skip_annotations(at, end).unwrap_or(at + 1);
                continue;
            }
            let declares = (token.kind == TokenKind::Keyword && is_type_declaration_keyword(token.text))
                || (token.kind == TokenKind::Identifier && token.text == "record");
            if declares {
                break at;
            }
            return Ok(None);
        };

        let Some(name_at) = self.next_significant(keyword_at + 1, end) else {
            return Ok(None);
        };
        if self.tokens[name_at].kind != TokenKind::Identifier {
            return Ok(None);
        }

        // Find the body `{`, skipping type parameters and record components.
        let mut cursor = name_at + 1;
        let open = loop {
            let Some(at) = self.next_significant(cursor, end) else {
                return Ok(None);
            };
            let token = self.tokens[at];
            if token.is_operator("{") {
                break at;
            }
            if token.is_operator(";") || token.is_operator("}") {
                return Ok(None);
            }
            cursor = if token.is_operator("(") || token.is_operator("[") {
                self.skip_group(at)
            } else {
                at + 1
            };
        };
        let Some(close) = self.closing[open] else {
            return Ok(None);
        };

        let members = self.parse_items(open + 1..close, false)?;
        Ok(Some(BodyItem {
            kind: BodyItemKind::TypeDeclaration {
                header: i..open,
                members,
            },
            tokens: i..close + 1,
        }))
    }

    /// An opaque statement: everything up to a depth-0 `;` or line break.
    fn statement(&self, i: usize, end: usize) -> BodyItem {
        let mut cursor = i;
        while cursor < end {
            let token = self.tokens[cursor];
            if token.kind == TokenKind::Newline || token.is_operator(";") {
                break;
            }
            cursor = if matches!(token.text, "(" | "[" | "{") && token.kind == TokenKind::Operator {
                self.skip_group(cursor)
            } else {
                cursor + 1
            };
        }
        BodyItem {
            kind: BodyItemKind::Statement,
            tokens: i..cursor.min(end),
        }
    }
}
