use std::fmt;

use crate::parser::ParseError;
use crate::span::SourceSpan;
use crate::tokenizer::LexError;

/// Errors surfaced by the analysis entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrimError {
    #[error("failed to tokenize source: {0}")]
    Lex(#[from] LexError),
    #[error("failed to parse source: {0}")]
    Parse(#[from] ParseError),
    #[error("source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

impl TrimError {
    /// Location of the failure, when it has one.
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            Self::Lex(err) => Some(err.span),
            Self::Parse(err) => Some(err.span),
            Self::Encoding(_) => None,
        }
    }
}

/// A non-fatal note attached to a trim result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl From<&TrimError> for Diagnostic {
    fn from(err: &TrimError) -> Self {
        Self {
            message: err.to_string(),
            span: err.span(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
