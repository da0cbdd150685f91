//! Typed records for every import statement of a file.

use std::fmt;

use crate::parser::{ImportStatement, ParsedFile};
use crate::span::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Plain,
    Static,
    Wildcard,
    StaticWildcard,
}

impl ImportKind {
    pub fn is_wildcard(self) -> bool {
        matches!(self, Self::Wildcard | Self::StaticWildcard)
    }

    pub fn is_static(self) -> bool {
        matches!(self, Self::Static | Self::StaticWildcard)
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plain => "plain",
            Self::Static => "static",
            Self::Wildcard => "wildcard",
            Self::StaticWildcard => "static-wildcard",
        })
    }
}

/// A single import declaration. Two textually identical imports are two
/// declarations; identity is the span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDeclaration {
    pub kind: ImportKind,
    /// Dotted path as written, without the trailing `.*`.
    pub imported_path: String,
    /// Last path segment; absent for wildcard kinds.
    pub simple_name: Option<String>,
    pub alias: Option<String>,
    /// Annotations were written in front of the statement.
    pub annotated: bool,
    pub span: SourceSpan,
}

impl ImportDeclaration {
    /// The name this import introduces into file scope, if any.
    pub fn bound_name(&self) -> Option<&str> {
        self.alias.as_deref().or(self.simple_name.as_deref())
    }
}

impl fmt::Display for ImportDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("import ")?;
        if self.kind.is_static() {
            f.write_str("static ")?;
        }
        f.write_str(&self.imported_path)?;
        if self.kind.is_wildcard() {
            f.write_str(".*")?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }
        Ok(())
    }
}

/// Build the catalog for a parsed file, in source order.
pub fn build_catalog(parsed: &ParsedFile<'_>) -> Vec<ImportDeclaration> {
    parsed.imports.iter().map(declaration).collect()
}

fn declaration(statement: &ImportStatement<'_>) -> ImportDeclaration {
    let kind = match (statement.is_static, statement.wildcard) {
        (false, false) => ImportKind::Plain,
        (true, false) => ImportKind::Static,
        (false, true) => ImportKind::Wildcard,
        (true, true) => ImportKind::StaticWildcard,
    };
    let simple_name = if statement.wildcard {
        None
    } else {
        statement.segments.last().map(|s| (*s).to_owned())
    };
    ImportDeclaration {
        kind,
        imported_path: statement.segments.join("."),
        simple_name,
        alias: statement.alias.map(str::to_owned),
        annotated: statement.annotations.is_some(),
        span: statement.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;

    fn catalog(source: &str) -> Vec<ImportDeclaration> {
        let parsed = parse(source, tokenize(source).unwrap()).unwrap();
        build_catalog(&parsed)
    }

    #[test]
    fn test_import_kinds() {
        let imports = catalog(
            "import a.b.C\nimport a.b.C as D\nimport a.b.*\nimport static a.b.C.member\nimport static a.b.C.*\n",
        );
        let summary: Vec<_> = imports
            .iter()
            .map(|i| (i.kind, i.imported_path.as_str(), i.simple_name.as_deref(), i.alias.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ImportKind::Plain, "a.b.C", Some("C"), None),
                (ImportKind::Plain, "a.b.C", Some("C"), Some("D")),
                (ImportKind::Wildcard, "a.b", None, None),
                (ImportKind::Static, "a.b.C.member", Some("member"), None),
                (ImportKind::StaticWildcard, "a.b.C", None, None),
            ]
        );
        assert_eq!(imports[1].bound_name(), Some("D"));
        assert_eq!(imports[2].bound_name(), None);
    }

    #[test]
    fn test_duplicates_are_tracked_by_span() {
        let imports = catalog("import a.B\nimport a.B\n");
        assert_eq!(imports.len(), 2);
        assert_ne!(imports[0], imports[1]);
        assert_eq!(imports[0].imported_path, imports[1].imported_path);
        assert!(imports[0].span.start < imports[1].span.start);
    }

    #[test]
    fn test_display_round_trips_the_declaration() {
        let imports = catalog("import static a.B.c as d;\nimport x.y.*\n");
        assert_eq!(imports[0].to_string(), "import static a.B.c as d");
        assert_eq!(imports[1].to_string(), "import x.y.*");
    }
}
