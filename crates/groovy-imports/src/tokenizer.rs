//! Groovy tokenizer.
//!
//! Produces a gap-free token stream over the whole input: whitespace,
//! newlines and comments are tokens too, so every byte of the source belongs
//! to exactly one token. String literals are split around interpolation
//! sub-expressions, which are tokenized as ordinary code between
//! `InterpolationStart` and `InterpolationEnd` tokens.

use crate::groovy_keywords::{is_keyword, operators};
use crate::span::{LineIndex, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    /// A piece of string literal text, delimiters included.
    StringLiteral,
    /// `${` or the `$` of a `$name` interpolation.
    InterpolationStart,
    /// `}` closing a `${`, or a zero-width marker after `$name`.
    InterpolationEnd,
    Operator,
    Comment,
    Whitespace,
    Newline,
}

/// A token paired with its location in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub start: usize,
    pub end: usize,
    /// Number of interpolation expressions enclosing this token.
    pub interpolation_depth: u16,
}

impl Token<'_> {
    /// Whitespace, newlines and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// Identifiers and keywords; both may appear as segments of a dotted name.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated interpolation expression")]
    UnterminatedInterpolation,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
}

/// Errors that can occur while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {span}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: SourceSpan,
}

pub type LexResult<T> = Result<T, LexError>;

/// Tokenize `source` completely.
pub fn tokenize(source: &str) -> LexResult<Vec<Token<'_>>> {
    Tokenizer::new(source).tokenize()
}

/// How a string literal is delimited and escaped.
#[derive(Debug, Clone, Copy)]
struct StringStyle {
    close: &'static str,
    interpolated: bool,
    multiline: bool,
    dollar_slashy: bool,
}

const SINGLE_QUOTED: StringStyle = StringStyle {
    close: "'",
    interpolated: false,
    multiline: false,
    dollar_slashy: false,
};
const TRIPLE_SINGLE_QUOTED: StringStyle = StringStyle {
    close: "'''",
    interpolated: false,
    multiline: true,
    dollar_slashy: false,
};
const DOUBLE_QUOTED: StringStyle = StringStyle {
    close: "\"",
    interpolated: true,
    multiline: false,
    dollar_slashy: false,
};
const TRIPLE_DOUBLE_QUOTED: StringStyle = StringStyle {
    close: "\"\"\"",
    interpolated: true,
    multiline: true,
    dollar_slashy: false,
};
const SLASHY: StringStyle = StringStyle {
    close: "/",
    interpolated: true,
    multiline: true,
    dollar_slashy: false,
};
const DOLLAR_SLASHY: StringStyle = StringStyle {
    close: "/$",
    interpolated: true,
    multiline: true,
    dollar_slashy: true,
};

pub struct Tokenizer<'src> {
    source: &'src str,
    cursor: usize,
    depth: u16,
    tokens: Vec<Token<'src>>,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: 0,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> LexResult<Vec<Token<'src>>> {
        if self.source.starts_with('\u{feff}') {
            self.push(TokenKind::Whitespace, 0, '\u{feff}'.len_utf8());
        }
        if self.rest().starts_with("#!") {
            let end = self.line_end(self.cursor);
            self.push(TokenKind::Comment, self.cursor, end);
        }
        self.lex_code(false)?;
        debug_assert_eq!(self.cursor, self.source.len());
        Ok(self.tokens)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.cursor..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth_char(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.source[start..end],
            start,
            end,
            interpolation_depth: self.depth,
        });
        self.cursor = end;
    }

    fn error(&self, kind: LexErrorKind, start: usize) -> LexError {
        let index = LineIndex::new(self.source);
        LexError {
            kind,
            span: index.span(self.source, start, self.cursor.max(start)),
        }
    }

    /// Offset of the end of the line containing `from`, excluding the terminator.
    fn line_end(&self, from: usize) -> usize {
        let end = self.source[from..]
            .find('\n')
            .map_or(self.source.len(), |i| from + i);
        if end > from && self.source.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    /// Lex code until end of input or, inside an interpolation, until the
    /// unmatched `}` that closes it (left unconsumed).
    fn lex_code(&mut self, in_interpolation: bool) -> LexResult<()> {
        let mut brace_depth = 0usize;
        while let Some(ch) = self.peek_char() {
            let start = self.cursor;
            match ch {
                '\n' => self.push(TokenKind::Newline, start, start + 1),
                '\r' if self.rest().starts_with("\r\n") => {
                    self.push(TokenKind::Newline, start, start + 2);
                }
                c if c.is_whitespace() => self.lex_whitespace(),
                '/' if self.rest().starts_with("//") => {
                    let end = self.line_end(start);
                    self.push(TokenKind::Comment, start, end);
                }
                '/' if self.rest().starts_with("/*") => self.lex_block_comment()?,
                '\'' | '"' => self.lex_quoted_string()?,
                '$' if self.rest().starts_with("$/") => self.lex_string(2, DOLLAR_SLASHY)?,
                '/' if self.operand_expected() => self.lex_string(1, SLASHY)?,
                c if is_ident_start(c) => self.lex_word(),
                c if c.is_ascii_digit() => self.lex_number(),
                '{' => {
                    brace_depth += 1;
                    self.push(TokenKind::Operator, start, start + 1);
                }
                '}' => {
                    if brace_depth == 0 && in_interpolation {
                        return Ok(());
                    }
                    brace_depth = brace_depth.saturating_sub(1);
                    self.push(TokenKind::Operator, start, start + 1);
                }
                c => {
                    let Some(op) = operators().iter().find(|op| self.rest().starts_with(**op))
                    else {
                        self.cursor += c.len_utf8();
                        return Err(self.error(LexErrorKind::UnexpectedCharacter(c), start));
                    };
                    self.push(TokenKind::Operator, start, start + op.len());
                }
            }
        }
        if in_interpolation {
            return Err(self.error(LexErrorKind::UnterminatedInterpolation, self.cursor));
        }
        Ok(())
    }

    fn lex_whitespace(&mut self) {
        let start = self.cursor;
        let len: usize = self
            .rest()
            .chars()
            .take_while(|&c| c.is_whitespace() && c != '\n')
            .map(char::len_utf8)
            .sum();
        // A `\r` directly before `\n` belongs to the newline token.
        let mut end = start + len;
        if self.source[end..].starts_with('\n') && self.source[start..end].ends_with('\r') {
            end -= 1;
        }
        self.push(TokenKind::Whitespace, start, end);
    }

    fn lex_block_comment(&mut self) -> LexResult<()> {
        let start = self.cursor;
        match self.source[start + 2..].find("*/") {
            Some(i) => {
                self.push(TokenKind::Comment, start, start + 2 + i + 2);
                Ok(())
            }
            None => {
                self.cursor = self.source.len();
                Err(self.error(LexErrorKind::UnterminatedComment, start))
            }
        }
    }

    fn lex_word(&mut self) {
        let start = self.cursor;
        let len: usize = self
            .rest()
            .chars()
            .take_while(|&c| is_ident_continue(c))
            .map(char::len_utf8)
            .sum();
        let word = &self.source[start..start + len];
        let kind = if is_keyword(word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start, start + len);
    }

    fn lex_number(&mut self) {
        let start = self.cursor;
        let bytes = self.source.as_bytes();
        let radix_prefixed = self.rest().len() > 1
            && bytes[start] == b'0'
            && matches!(bytes[start + 1], b'x' | b'X' | b'b' | b'B');
        let mut end = start;
        let mut seen_dot = false;
        while end < bytes.len() {
            let b = bytes[end];
            if b.is_ascii_alphanumeric() || b == b'_' {
                end += 1;
            } else if b == b'.'
                && !seen_dot
                && !radix_prefixed
                && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
            {
                seen_dot = true;
                end += 1;
            } else if matches!(b, b'+' | b'-')
                && !radix_prefixed
                && matches!(bytes[end - 1], b'e' | b'E')
                && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
            {
                end += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, end);
    }

    /// Whether a `/` at the cursor starts a slashy string rather than a division.
    fn operand_expected(&self) -> bool {
        let Some(previous) = self.tokens.iter().rev().find(|t| !t.is_trivia()) else {
            return true;
        };
        match previous.kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::StringLiteral
            | TokenKind::InterpolationEnd => false,
            TokenKind::Keyword => !matches!(previous.text, "this" | "super" | "true" | "false" | "null"),
            TokenKind::Operator => !matches!(previous.text, ")" | "]" | "}" | "++" | "--"),
            TokenKind::InterpolationStart => true,
            TokenKind::Comment | TokenKind::Whitespace | TokenKind::Newline => true,
        }
    }

    fn lex_quoted_string(&mut self) -> LexResult<()> {
        let rest = self.rest();
        let (open, style) = if rest.starts_with("'''") {
            (3, TRIPLE_SINGLE_QUOTED)
        } else if rest.starts_with("\"\"\"") {
            (3, TRIPLE_DOUBLE_QUOTED)
        } else if rest.starts_with('\'') {
            (1, SINGLE_QUOTED)
        } else {
            (1, DOUBLE_QUOTED)
        };
        self.lex_string(open, style)
    }

    /// Lex a string literal whose opening delimiter is `open` bytes long.
    fn lex_string(&mut self, open: usize, style: StringStyle) -> LexResult<()> {
        let literal_start = self.cursor;
        let mut segment_start = self.cursor;
        self.cursor += open;
        loop {
            let rest = self.rest();
            let Some(ch) = rest.chars().next() else {
                return Err(self.error(LexErrorKind::UnterminatedString, literal_start));
            };
            if rest.starts_with(style.close) {
                self.push(TokenKind::StringLiteral, segment_start, self.cursor + style.close.len());
                return Ok(());
            }
            match ch {
                '\n' | '\r' if !style.multiline => {
                    return Err(self.error(LexErrorKind::UnterminatedString, literal_start));
                }
                '\\' if !style.dollar_slashy => {
                    self.cursor += 1;
                    if let Some(escaped) = self.peek_char() {
                        self.cursor += escaped.len_utf8();
                    }
                }
                '$' if style.dollar_slashy && matches!(self.peek_nth_char(1), Some('$' | '/')) => {
                    self.cursor += 2;
                }
                '$' if style.interpolated && self.peek_nth_char(1) == Some('{') => {
                    self.flush_segment(segment_start);
                    self.lex_braced_interpolation()?;
                    segment_start = self.cursor;
                }
                '$' if style.interpolated && self.peek_nth_char(1).is_some_and(is_short_ident_start) => {
                    self.flush_segment(segment_start);
                    self.lex_short_interpolation();
                    segment_start = self.cursor;
                }
                c => self.cursor += c.len_utf8(),
            }
        }
    }

    fn flush_segment(&mut self, segment_start: usize) {
        if self.cursor > segment_start {
            let end = self.cursor;
            self.push(TokenKind::StringLiteral, segment_start, end);
        }
    }

    fn lex_braced_interpolation(&mut self) -> LexResult<()> {
        let start = self.cursor;
        self.push(TokenKind::InterpolationStart, start, start + 2);
        self.depth += 1;
        let result = self.lex_code(true);
        if let Err(err) = result {
            return Err(match err.kind {
                LexErrorKind::UnterminatedInterpolation => {
                    self.error(LexErrorKind::UnterminatedInterpolation, start)
                }
                _ => err,
            });
        }
        self.depth -= 1;
        let close = self.cursor;
        self.push(TokenKind::InterpolationEnd, close, close + 1);
        Ok(())
    }

    /// `$name` or `$name.property.chain`.
    fn lex_short_interpolation(&mut self) {
        let start = self.cursor;
        self.push(TokenKind::InterpolationStart, start, start + 1);
        self.depth += 1;
        self.lex_word();
        while self.rest().starts_with('.') && self.peek_nth_char(1).is_some_and(is_short_ident_start) {
            let dot = self.cursor;
            self.push(TokenKind::Operator, dot, dot + 1);
            self.lex_word();
        }
        self.depth -= 1;
        let end = self.cursor;
        self.push(TokenKind::InterpolationEnd, end, end);
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Identifier start inside a GString; `$` there is never part of a name.
fn is_short_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_tokens_cover_input_without_gaps() {
        let source = "import a.b.C // note\r\nclass X { def s = \"${C.x} and $y.z\" }\n";
        let tokens = tokenize(source).unwrap();
        let mut cursor = 0;
        for token in &tokens {
            assert_eq!(token.start, cursor, "gap before {:?}", token);
            cursor = token.end;
        }
        assert_eq!(cursor, source.len());
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_braced_interpolation_is_code() {
        let tokens = significant(r#""a ${Math.max(1, b)} c""#);
        assert_eq!(
            tokens,
            vec![
                (TokenKind::StringLiteral, "\"a "),
                (TokenKind::InterpolationStart, "${"),
                (TokenKind::Identifier, "Math"),
                (TokenKind::Operator, "."),
                (TokenKind::Identifier, "max"),
                (TokenKind::Operator, "("),
                (TokenKind::Number, "1"),
                (TokenKind::Operator, ","),
                (TokenKind::Identifier, "b"),
                (TokenKind::Operator, ")"),
                (TokenKind::InterpolationEnd, "}"),
                (TokenKind::StringLiteral, " c\""),
            ]
        );
    }

    #[test]
    fn test_short_interpolation_and_depth() {
        let tokens = tokenize(r#""$user.name!""#).unwrap();
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| (t.text, t.interpolation_depth))
            .collect();
        assert_eq!(idents, vec![("user", 1), ("name", 1)]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::InterpolationEnd && t.text.is_empty()));
    }

    #[test]
    fn test_nested_braces_and_strings_in_interpolation() {
        let tokens = significant(r#""${ list.collect { "${it}" }.join(',') }""#);
        assert_eq!(tokens.first(), Some(&(TokenKind::StringLiteral, "\"")));
        assert_eq!(tokens.last(), Some(&(TokenKind::StringLiteral, "\"")));
        assert!(tokens.contains(&(TokenKind::Identifier, "it")));
        assert!(tokens.contains(&(TokenKind::StringLiteral, "','")));
    }

    #[test]
    fn test_single_quoted_strings_are_not_interpolated() {
        let tokens = significant(r"'${Foo}' + '''$Bar'''");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::StringLiteral, "'${Foo}'"),
                (TokenKind::Operator, "+"),
                (TokenKind::StringLiteral, "'''$Bar'''"),
            ]
        );
    }

    #[test]
    fn test_slashy_string_versus_division() {
        let regex = significant(r"def p = /a\/b${X}/");
        assert!(regex.contains(&(TokenKind::StringLiteral, r"/a\/b")));
        assert!(regex.contains(&(TokenKind::Identifier, "X")));

        let division = significant("def half = total / 2");
        assert!(division.contains(&(TokenKind::Operator, "/")));
    }

    #[test]
    fn test_dollar_slashy_string() {
        let tokens = significant(r"def s = $/path $$ and $/ and ${Y}/$");
        assert!(tokens.contains(&(TokenKind::Identifier, "Y")));
        assert_eq!(tokens.last(), Some(&(TokenKind::StringLiteral, "/$")));
    }

    #[test]
    fn test_comments_and_shebang() {
        let tokens = tokenize("#!/usr/bin/env groovy\n/** doc */ // line\r\nx").unwrap();
        let comments: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.text)
            .collect();
        assert_eq!(comments, vec!["#!/usr/bin/env groovy", "/** doc */", "// line"]);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Newline && t.text == "\r\n"));
    }

    #[test]
    fn test_numbers_and_ranges() {
        let tokens = significant("1..5 + 0xFF + 1_000L + 1.5e-3d");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Number, "1"),
                (TokenKind::Operator, ".."),
                (TokenKind::Number, "5"),
                (TokenKind::Operator, "+"),
                (TokenKind::Number, "0xFF"),
                (TokenKind::Operator, "+"),
                (TokenKind::Number, "1_000L"),
                (TokenKind::Operator, "+"),
                (TokenKind::Number, "1.5e-3d"),
            ]
        );
    }

    #[test]
    fn test_unterminated_literals_fail() {
        let err = tokenize("def s = \"abc\nclass X {}").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.line, 1);

        let err = tokenize("/* never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);

        let err = tokenize("def s = \"\"\"${ foo \"\"\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("def x = `cmd`").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('`'));
        assert_eq!(err.span.column, 9);
    }
}
