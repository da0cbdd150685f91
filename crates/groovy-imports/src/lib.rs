pub mod combine;
pub mod config;
pub mod dirs;
pub mod error;
pub mod files;
pub mod groovy_keywords;
pub mod import_catalog;
pub mod parser;
pub mod resolver;
pub mod rewriter;
pub mod span;
pub mod tokenizer;
pub mod unused_import_trimmer;
pub mod usage_scanner;

pub use config::Config;
pub use error::{Diagnostic, TrimError};
pub use import_catalog::{ImportDeclaration, ImportKind};
pub use unused_import_trimmer::{
    AnalysisResult, FormatterStep, TrimConfig, TrimResult, UnusedImportTrimmer, transform,
};
