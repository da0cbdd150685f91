//! Unused import analysis and trimming for Groovy sources.
//!
//! This module wires the pipeline together: tokenize, parse, catalog the
//! imports, scan the body for references, resolve, and cut the unused
//! import statements out of the original text.

use log::{debug, warn};

use crate::error::{Diagnostic, TrimError};
use crate::import_catalog::{ImportDeclaration, build_catalog};
use crate::parser::{ParsedFile, parse};
use crate::resolver::{ImportDecision, Resolver};
use crate::rewriter::remove_statements;
use crate::tokenizer::tokenize;
use crate::usage_scanner::{IdentifierReference, scan_import_annotations, scan_references};

/// A text-to-text step of a formatting pipeline.
pub trait FormatterStep: Send + Sync {
    /// Name the host uses to refer to this step.
    fn name(&self) -> &str;

    /// Transform `source`. Must never fail; a step that cannot handle its
    /// input returns it unchanged.
    fn apply(&self, source: &str) -> String;
}

/// Configuration for import trimming behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimConfig {
    /// Import paths that are always kept. An entry ending in `.*` covers
    /// every path below that prefix.
    pub preserve: Vec<String>,
    /// Whether to keep `import static a.B.*` regardless of usage
    pub preserve_static_wildcards: bool,
    /// Whether to keep imports written with leading annotations (`@Grab`)
    pub preserve_annotated_imports: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            preserve: vec![],
            preserve_static_wildcards: true,
            preserve_annotated_imports: true,
        }
    }
}

/// Result of trimming unused imports from Groovy code
#[derive(Debug, Clone)]
pub struct TrimResult {
    /// The transformed code with unused imports removed
    pub code: String,
    /// Imports that were removed, in source order
    pub removed_imports: Vec<ImportDeclaration>,
    /// Whether any changes were made to the original code
    pub has_changes: bool,
    /// Why the source was left alone, if it was
    pub diagnostics: Vec<Diagnostic>,
}

impl TrimResult {
    fn unchanged(source: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            code: source.to_owned(),
            removed_imports: vec![],
            has_changes: false,
            diagnostics,
        }
    }
}

/// Everything the analysis learned about one file.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub imports: Vec<ImportDeclaration>,
    pub references: Vec<IdentifierReference>,
    /// Provably unused imports, in source order
    pub unused: Vec<ImportDeclaration>,
    pub decisions: Vec<ImportDecision>,
}

/// Removes imports that nothing in the file refers to.
///
/// Holds only its configuration, so one instance can serve any number of
/// files from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct UnusedImportTrimmer {
    config: TrimConfig,
}

impl UnusedImportTrimmer {
    pub fn new(config: TrimConfig) -> Self {
        Self { config }
    }

    /// Analyze source code without making changes
    ///
    /// Fails when the source cannot be tokenized or its structure cannot be
    /// recognized.
    pub fn analyze(&self, source: &str) -> Result<AnalysisResult, TrimError> {
        self.analyze_parsed(source).map(|(analysis, _)| analysis)
    }

    fn analyze_parsed<'src>(
        &self,
        source: &'src str,
    ) -> Result<(AnalysisResult, ParsedFile<'src>), TrimError> {
        let tokens = tokenize(source)?;
        let parsed = parse(source, tokens)?;
        let imports = build_catalog(&parsed);
        let mut references = scan_references(source, &parsed);
        let resolver = Resolver::new(&self.config);

        // Annotations in front of a kept import stay in the file, so what
        // they refer to is used too. Settles after one pass per annotated
        // import at most.
        let mut scanned = vec![false; imports.len()];
        let decisions = loop {
            let decisions = resolver.resolve(&imports, &references);
            let mut grew = false;
            for (index, decision) in decisions.iter().enumerate() {
                let statement = &parsed.imports[index];
                if decision.verdict.is_remove()
                    || scanned[index]
                    || statement.annotations.is_none()
                {
                    continue;
                }
                scanned[index] = true;
                let found = scan_import_annotations(source, &parsed, statement);
                grew |= !found.is_empty();
                references.extend(found);
            }
            if !grew {
                break decisions;
            }
        };
        let unused = decisions
            .iter()
            .filter(|decision| decision.verdict.is_remove())
            .map(|decision| decision.import.clone())
            .collect();
        let analysis = AnalysisResult {
            imports,
            references,
            unused,
            decisions,
        };
        Ok((analysis, parsed))
    }

    /// Remove unused imports from `source`.
    ///
    /// Never fails: input that cannot be analyzed is returned unchanged with
    /// a diagnostic explaining why.
    pub fn trim(&self, source: &str) -> TrimResult {
        let (analysis, parsed) = match self.analyze_parsed(source) {
            Ok(result) => result,
            Err(err) => {
                let diagnostic = Diagnostic::from(&err);
                warn!("Leaving source unchanged: {diagnostic}");
                return TrimResult::unchanged(source, vec![diagnostic]);
            }
        };

        if analysis.unused.is_empty() {
            return TrimResult::unchanged(source, vec![]);
        }

        let spans: Vec<_> = analysis.unused.iter().map(|import| import.span).collect();
        let code = remove_statements(source, &parsed.tokens, &spans);
        let has_changes = code != source;
        debug!(
            "Removed {} of {} import(s)",
            analysis.unused.len(),
            analysis.imports.len()
        );

        TrimResult {
            code,
            removed_imports: analysis.unused,
            has_changes,
            diagnostics: vec![],
        }
    }

    /// Like [`trim`](Self::trim), for raw file contents.
    pub fn trim_bytes(&self, bytes: &[u8]) -> Result<TrimResult, TrimError> {
        let source = std::str::from_utf8(bytes)?;
        Ok(self.trim(source))
    }
}

impl FormatterStep for UnusedImportTrimmer {
    fn name(&self) -> &str {
        "removeUnusedImports"
    }

    fn apply(&self, source: &str) -> String {
        self.trim(source).code
    }
}

/// Remove unused imports from `source` with the default configuration.
pub fn transform(source: &str) -> String {
    UnusedImportTrimmer::default().apply(source)
}
