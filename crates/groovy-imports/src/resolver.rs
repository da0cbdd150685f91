//! Decides which imports are provably unused.
//!
//! Matching is purely syntactic: an import is used when a bare reference in
//! the file carries the name the import binds. Anything the resolver cannot
//! prove unused is kept.

use std::fmt;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::import_catalog::{ImportDeclaration, ImportKind};
use crate::span::SourceSpan;
use crate::unused_import_trimmer::TrimConfig;
use crate::usage_scanner::{IdentifierReference, ReferenceContext};

/// Why an import is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    Wildcard,
    StaticWildcard,
    AllowListed,
    Annotated,
    Referenced {
        context: ReferenceContext,
        span: SourceSpan,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep(KeepReason),
    Remove,
}

impl Verdict {
    pub fn is_remove(self) -> bool {
        self == Self::Remove
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep(KeepReason::Wildcard) => f.write_str("kept (wildcard)"),
            Self::Keep(KeepReason::StaticWildcard) => f.write_str("kept (static wildcard)"),
            Self::Keep(KeepReason::AllowListed) => f.write_str("kept (allow-listed)"),
            Self::Keep(KeepReason::Annotated) => f.write_str("kept (annotated)"),
            Self::Keep(KeepReason::Referenced { context, span }) => {
                write!(f, "kept ({context} reference at {span})")
            }
            Self::Remove => f.write_str("unused"),
        }
    }
}

/// The verdict for one import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecision {
    pub import: ImportDeclaration,
    pub verdict: Verdict,
}

/// References grouped by name.
struct ReferenceIndex<'r> {
    by_name: FxHashMap<&'r str, Vec<&'r IdentifierReference>>,
}

impl<'r> ReferenceIndex<'r> {
    fn new(references: &'r [IdentifierReference]) -> Self {
        let mut by_name: FxHashMap<&str, Vec<&IdentifierReference>> = FxHashMap::default();
        for reference in references {
            by_name.entry(reference.name.as_str()).or_default().push(reference);
        }
        Self { by_name }
    }

    fn first_match(
        &self,
        name: &str,
        accepts: impl Fn(ReferenceContext) -> bool,
    ) -> Option<&'r IdentifierReference> {
        self.by_name
            .get(name)?
            .iter()
            .copied()
            .find(|reference| accepts(reference.context))
    }

    fn iter(&self) -> impl Iterator<Item = &'r IdentifierReference> + '_ {
        self.by_name.values().flatten().copied()
    }
}

pub struct Resolver<'cfg> {
    config: &'cfg TrimConfig,
}

impl<'cfg> Resolver<'cfg> {
    pub fn new(config: &'cfg TrimConfig) -> Self {
        Self { config }
    }

    /// Decide every import, in source order.
    pub fn resolve(
        &self,
        imports: &[ImportDeclaration],
        references: &[IdentifierReference],
    ) -> Vec<ImportDecision> {
        let index = ReferenceIndex::new(references);
        let statically_bound: FxHashSet<&str> = imports
            .iter()
            .filter(|import| import.kind == ImportKind::Static)
            .filter_map(ImportDeclaration::bound_name)
            .collect();

        imports
            .iter()
            .map(|import| {
                let verdict = self.decide(import, &index, &statically_bound);
                debug!("{import} at {}: {verdict}", import.span);
                ImportDecision {
                    import: import.clone(),
                    verdict,
                }
            })
            .collect()
    }

    /// The imports with no matching reference, in source order.
    pub fn unused(
        &self,
        imports: &[ImportDeclaration],
        references: &[IdentifierReference],
    ) -> Vec<ImportDeclaration> {
        self.resolve(imports, references)
            .into_iter()
            .filter(|decision| decision.verdict.is_remove())
            .map(|decision| decision.import)
            .collect()
    }

    fn decide(
        &self,
        import: &ImportDeclaration,
        index: &ReferenceIndex<'_>,
        statically_bound: &FxHashSet<&str>,
    ) -> Verdict {
        if self.is_allow_listed(&import.imported_path) {
            return Verdict::Keep(KeepReason::AllowListed);
        }
        if import.annotated && self.config.preserve_annotated_imports {
            return Verdict::Keep(KeepReason::Annotated);
        }

        let matched = match import.kind {
            ImportKind::Wildcard => return Verdict::Keep(KeepReason::Wildcard),
            ImportKind::StaticWildcard => {
                if self.config.preserve_static_wildcards {
                    return Verdict::Keep(KeepReason::StaticWildcard);
                }
                index.iter().find(|reference| {
                    matches!(
                        reference.context,
                        ReferenceContext::StaticMemberAccess
                            | ReferenceContext::ValuePosition
                            | ReferenceContext::InterpolationExpression
                    ) && !statically_bound.contains(reference.name.as_str())
                })
            }
            // An alias hides the simple name; static imports may bind fields
            // and nested types as well as methods.
            ImportKind::Static => import
                .bound_name()
                .and_then(|name| index.first_match(name, |_| true)),
            ImportKind::Plain if import.alias.is_some() => import
                .bound_name()
                .and_then(|name| index.first_match(name, |_| true)),
            ImportKind::Plain => import.simple_name.as_deref().and_then(|name| {
                index.first_match(name, |context| {
                    context != ReferenceContext::StaticMemberAccess
                })
            }),
        };

        match matched {
            Some(reference) => Verdict::Keep(KeepReason::Referenced {
                context: reference.context,
                span: reference.span,
            }),
            None => Verdict::Remove,
        }
    }

    /// Exact path, or a `prefix.*` pattern covering everything below `prefix`.
    fn is_allow_listed(&self, path: &str) -> bool {
        self.config.preserve.iter().any(|pattern| match pattern.strip_suffix(".*") {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('.'))
            }
            None => path == pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_catalog::build_catalog;
    use crate::parser::parse;
    use crate::tokenizer::tokenize;
    use crate::usage_scanner::scan_references;

    fn unused_with(source: &str, config: &TrimConfig) -> Vec<String> {
        let parsed = parse(source, tokenize(source).unwrap()).unwrap();
        let imports = build_catalog(&parsed);
        let references = scan_references(source, &parsed);
        Resolver::new(config)
            .unused(&imports, &references)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn unused(source: &str) -> Vec<String> {
        unused_with(source, &TrimConfig::default())
    }

    #[test]
    fn test_plain_imports_match_simple_name() {
        let source = "import a.b.List\nimport a.b.Map\nclass X { List f }\n";
        assert_eq!(unused(source), vec!["import a.b.Map"]);
    }

    #[test]
    fn test_alias_hides_simple_name() {
        assert_eq!(
            unused("import a.b.List as JList\nclass X { List f }\n"),
            vec!["import a.b.List as JList"]
        );
        assert!(unused("import a.b.List as JList\nclass X { JList f }\n").is_empty());
    }

    #[test]
    fn test_plain_import_is_not_used_by_a_bare_call() {
        assert_eq!(unused("import a.b.Foo\nFoo(1)\n"), vec!["import a.b.Foo"]);
        assert!(unused("import a.b.Foo\nnew Foo(1)\n").is_empty());
    }

    #[test]
    fn test_static_imports_match_any_context() {
        assert!(unused("import static java.lang.Math.PI\nclass X { def r = PI }\n").is_empty());
        assert!(unused("import static java.lang.Math.max\nprintln max(1, 2)\n").is_empty());
        assert!(unused("import static a.B.C as D\nD.go()\n").is_empty());
        assert_eq!(
            unused("import static java.lang.Math.max\nprintln min(1, 2)\n"),
            vec!["import static java.lang.Math.max"]
        );
    }

    #[test]
    fn test_wildcards_are_kept() {
        assert!(unused("import a.b.*\nclass X { }\n").is_empty());
        assert!(unused("import static a.B.*\nclass X { }\n").is_empty());
    }

    #[test]
    fn test_static_wildcard_without_preservation() {
        let config = TrimConfig {
            preserve_static_wildcards: false,
            ..TrimConfig::default()
        };
        assert_eq!(
            unused_with("import static a.B.*\nclass X { }\n", &config),
            vec!["import static a.B.*"]
        );
        assert!(unused_with("import static a.B.*\nprintln abs(-1)\n", &config).is_empty());
        assert_eq!(
            unused_with(
                "import static a.B.*\nimport static a.C.abs\nabs(-1)\n",
                &config
            ),
            vec!["import static a.B.*"]
        );
    }

    #[test]
    fn test_allow_list() {
        let config = TrimConfig {
            preserve: vec!["a.b.Kept".to_owned(), "org.spock.*".to_owned()],
            ..TrimConfig::default()
        };
        let source = "import a.b.Kept\nimport a.b.Dropped\nimport org.spock.lang.Specification\nimport org.spockframework.X\n";
        assert_eq!(
            unused_with(source, &config),
            vec!["import a.b.Dropped", "import org.spockframework.X"]
        );
    }

    #[test]
    fn test_annotated_imports() {
        let source = "@Grab('g:a:1')\nimport a.b.Unused\n";
        assert!(unused(source).is_empty());
        let config = TrimConfig {
            preserve_annotated_imports: false,
            ..TrimConfig::default()
        };
        assert_eq!(unused_with(source, &config), vec!["import a.b.Unused"]);
    }

    #[test]
    fn test_duplicates_share_a_reference() {
        let source = "import a.List\nimport b.List\nList x\n";
        assert!(unused(source).is_empty());
        let source = "import a.List\nimport a.List\n";
        assert_eq!(unused(source), vec!["import a.List", "import a.List"]);
    }

    #[test]
    fn test_decisions_carry_the_matching_reference() {
        let source = "import a.b.List\nimport a.b.*\n\nList items\n";
        let parsed = parse(source, tokenize(source).unwrap()).unwrap();
        let config = TrimConfig::default();
        let decisions = Resolver::new(&config).resolve(
            &build_catalog(&parsed),
            &scan_references(source, &parsed),
        );
        let rendered: Vec<_> = decisions
            .iter()
            .map(|d| format!("{}: {}", d.import, d.verdict))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "import a.b.List: kept (type reference at 4:1)",
                "import a.b.*: kept (wildcard)",
            ]
        );
    }
}
