//! Cuts removed import statements out of the original text.
//!
//! The rewriter never re-renders code. It computes a set of byte ranges to
//! drop and copies every other byte through, so line endings, indentation
//! and comments outside the removed lines survive untouched.

use std::ops::Range;

use log::trace;

use crate::span::{LineIndex, SourceSpan};
use crate::tokenizer::{Token, TokenKind};

const BOM: &str = "\u{feff}";

/// Remove the statements at `removals` from `source`.
///
/// `tokens` must be the token stream of `source`.
pub fn remove_statements(source: &str, tokens: &[Token<'_>], removals: &[SourceSpan]) -> String {
    if removals.is_empty() {
        return source.to_owned();
    }
    let rewriter = Rewriter {
        source,
        tokens,
        line_index: LineIndex::new(source),
        removals,
    };
    rewriter.rewrite()
}

struct Rewriter<'a, 'src> {
    source: &'src str,
    tokens: &'a [Token<'src>],
    line_index: LineIndex,
    removals: &'a [SourceSpan],
}

impl Rewriter<'_, '_> {
    fn rewrite(&self) -> String {
        let line_count = self.line_index.line_count();
        let mut deleted = vec![false; line_count];
        let mut cuts = Vec::new();

        for removal in self.removals {
            let lines = self.lines_of(removal);
            if lines.clone().all(|line| self.is_clean(line)) {
                for line in lines {
                    deleted[line] = true;
                }
            } else {
                cuts.push(self.partial_cut(removal));
            }
        }

        for (line, _) in deleted.iter().enumerate().filter(|(_, d)| **d) {
            let mut range = self.line_index.line_range(line);
            if range.start == 0 && self.source.starts_with(BOM) {
                range.start = BOM.len();
            }
            cuts.push(range);
        }
        cuts.extend(self.surplus_blank_lines(&deleted));

        trace!(
            "deleting {} whole line(s), {} cut(s) in total",
            deleted.iter().filter(|d| **d).count(),
            cuts.len()
        );
        self.apply(cuts)
    }

    fn lines_of(&self, span: &SourceSpan) -> Range<usize> {
        let first = self.line_index.line_of(span.start);
        let last = self.line_index.line_of(span.end.saturating_sub(1).max(span.start));
        first..last + 1
    }

    /// Byte range of a line without its terminator.
    fn content(&self, line: usize) -> Range<usize> {
        let range = self.line_index.line_range(line);
        let text = &self.source[range.clone()];
        let terminator = if text.ends_with("\r\n") {
            2
        } else {
            usize::from(text.ends_with('\n'))
        };
        range.start..range.end - terminator
    }

    fn is_removed(&self, token: &Token<'_>) -> bool {
        self.removals
            .iter()
            .any(|r| token.start >= r.start && token.end <= r.end)
    }

    /// True when the line holds nothing but removed statements, whitespace
    /// and comments that end on this line.
    fn is_clean(&self, line: usize) -> bool {
        let content = self.content(line);
        let first = self.tokens.partition_point(|t| t.end <= content.start);
        self.tokens[first..]
            .iter()
            .take_while(|t| t.start < content.end)
            .all(|t| match t.kind {
                TokenKind::Whitespace | TokenKind::Newline => true,
                TokenKind::Comment => t.start >= content.start && !t.text.contains('\n'),
                _ => self.is_removed(t),
            })
    }

    /// The statement plus the horizontal whitespace after it, or before it
    /// when the statement ends its line.
    fn partial_cut(&self, span: &SourceSpan) -> Range<usize> {
        let bytes = self.source.as_bytes();
        let is_blank = |b: u8| b == b' ' || b == b'\t';
        let lines = self.lines_of(span);
        let start_line = self.content(lines.start);
        let end_line = self.content(lines.end - 1);

        let mut end = span.end;
        while end < end_line.end && is_blank(bytes[end]) {
            end += 1;
        }
        let mut start = span.start;
        if end == end_line.end {
            while start > start_line.start && is_blank(bytes[start - 1]) {
                start -= 1;
            }
        }
        start..end
    }

    fn is_blank(&self, line: usize, deleted: &[bool]) -> bool {
        let range = self.line_index.line_range(line);
        !deleted[line]
            && !range.is_empty()
            && self.source[self.content(line)]
                .chars()
                .all(|c| c == ' ' || c == '\t' || c == '\r')
    }

    /// Blank lines to drop so that every run of blank lines touching a
    /// deleted line keeps only as many blank lines as the larger of its
    /// outer groups, the ones that separated the import block from its
    /// neighbours. Groups between deleted lines are dropped. A run at the
    /// start (end) of the file keeps its leading (trailing) group instead.
    fn surplus_blank_lines(&self, deleted: &[bool]) -> Vec<Range<usize>> {
        let line_count = deleted.len();
        let last_real_line = if self.line_index.line_range(line_count - 1).is_empty() {
            line_count.saturating_sub(2)
        } else {
            line_count - 1
        };

        let mut surplus = Vec::new();
        let mut line = 0;
        while line < line_count {
            if !deleted[line] && !self.is_blank(line, deleted) {
                line += 1;
                continue;
            }
            let run_start = line;
            while line < line_count && (deleted[line] || self.is_blank(line, deleted)) {
                line += 1;
            }
            let run = run_start..line;
            if !run.clone().any(|l| deleted[l]) {
                continue;
            }

            let mut groups = vec![0usize];
            for l in run.clone() {
                if deleted[l] {
                    groups.push(0);
                } else if let Some(group) = groups.last_mut() {
                    *group += 1;
                }
            }
            let keep = if run.start == 0 {
                groups[0]
            } else if run.end > last_real_line {
                groups.last().copied().unwrap_or(0)
            } else {
                groups[0].max(groups.last().copied().unwrap_or(0))
            };

            surplus.extend(
                run.filter(|&l| !deleted[l])
                    .skip(keep)
                    .map(|l| self.line_index.line_range(l)),
            );
        }
        surplus
    }

    fn apply(&self, mut cuts: Vec<Range<usize>>) -> String {
        cuts.sort_by_key(|cut| (cut.start, cut.end));
        let mut output = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for cut in cuts {
            if cut.start > cursor {
                output.push_str(&self.source[cursor..cut.start]);
            }
            cursor = cursor.max(cut.end);
        }
        output.push_str(&self.source[cursor..]);
        output
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;

    /// Remove every import whose path is listed in `paths`.
    fn remove(source: &str, paths: &[&str]) -> String {
        let parsed = parse(source, tokenize(source).unwrap()).unwrap();
        let spans: Vec<_> = parsed
            .imports
            .iter()
            .filter(|import| paths.contains(&import.segments.join(".").as_str()))
            .map(|import| import.span)
            .collect();
        remove_statements(source, &parsed.tokens, &spans)
    }

    #[test]
    fn test_whole_lines_are_deleted() {
        let source = "import a.List\nimport a.Map\nclass X { List f }";
        assert_eq!(remove(source, &["a.Map"]), "import a.List\nclass X { List f }");
    }

    #[test]
    fn test_same_line_comment_goes_with_the_import() {
        let source = "import a.List // lists\nimport a.Map /* maps */\nList x\n";
        assert_eq!(remove(source, &["a.Map"]), "import a.List // lists\nList x\n");
    }

    #[test]
    fn test_partial_line_removal() {
        let source = "import a.B; import c.D\nimport e.F; println 1\nB x; D y\n";
        assert_eq!(
            remove(source, &["c.D", "e.F"]),
            "import a.B;\nprintln 1\nB x; D y\n"
        );
    }

    #[test]
    fn test_crlf_is_preserved() {
        let source = "package p\r\n\r\nimport a.A\r\nimport a.B\r\n\r\nclass X { A a }\r\n";
        assert_eq!(
            remove(source, &["a.B"]),
            "package p\r\n\r\nimport a.A\r\n\r\nclass X { A a }\r\n"
        );
    }

    #[test]
    fn test_blank_lines_collapse_to_the_import_block_density() {
        let source = "package p\n\nimport a.A\n\nimport b.B\n\nclass X {}\n";
        assert_eq!(remove(source, &["a.A", "b.B"]), "package p\n\nclass X {}\n");

        let source = "package p\n\nimport a.A\n\n\nclass X {}\n";
        assert_eq!(remove(source, &["a.A"]), "package p\n\n\nclass X {}\n");
    }

    #[test]
    fn test_gaps_inside_the_import_block_do_not_survive() {
        let source = "package p\n\nimport a.A\n\n\nimport b.B\n\nclass X {}\n";
        assert_eq!(remove(source, &["a.A", "b.B"]), "package p\n\nclass X {}\n");

        let source = "class X {}\nimport a.A\n\nimport b.B\nclass Y {}\n";
        assert_eq!(remove(source, &["a.A", "b.B"]), "class X {}\nclass Y {}\n");
    }

    #[test]
    fn test_no_leading_blank_line_at_start_of_file() {
        let source = "import a.A\n\nclass X {}\n";
        assert_eq!(remove(source, &["a.A"]), "class X {}\n");
    }

    #[test]
    fn test_no_trailing_blank_line_at_end_of_file() {
        let source = "class X {}\n\nimport a.A\n";
        assert_eq!(remove(source, &["a.A"]), "class X {}\n");
    }

    #[test]
    fn test_blank_lines_elsewhere_are_untouched() {
        let source = "import a.A\nclass X {\n\n\n    int y\n}\n";
        assert_eq!(remove(source, &["a.A"]), "class X {\n\n\n    int y\n}\n");
    }

    #[test]
    fn test_annotated_import_is_removed_with_its_annotation() {
        let source = "@Grab('g:a:1')\nimport a.A\nclass X {}\n";
        assert_eq!(remove(source, &["a.A"]), "class X {}\n");
    }

    #[test]
    fn test_byte_order_mark_survives() {
        let source = "\u{feff}import a.A\nclass X {}\n";
        assert_eq!(remove(source, &["a.A"]), "\u{feff}class X {}\n");
    }
}
