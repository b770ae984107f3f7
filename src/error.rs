//! Error types for template compilation and evaluation

use serde::Serialize;
use thiserror::Error;

use crate::ast::{CompareOp, Helper};

/// Structural problems found while matching block tags.
///
/// Offsets are byte positions of the offending tag in the template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `{{#helper}}` was never closed
    #[error("unclosed {{{{#{helper}}}}} block opened at byte {at}")]
    UnmatchedBlockStart { helper: Helper, at: usize },

    /// A `{{/helper}}` with no open block
    #[error("{{{{/{helper}}}}} at byte {at} has no matching block start")]
    UnmatchedBlockEnd { helper: Helper, at: usize },

    /// A close tag for a different helper than the innermost open block
    #[error("expected {{{{/{expected}}}}} but found {{{{/{found}}}}} at byte {at}")]
    MismatchedBlockEnd {
        expected: Helper,
        found: Helper,
        at: usize,
    },

    /// A second `{{else}}` inside the same block
    #[error("second {{{{else}}}} at byte {at} in the same block")]
    MultipleElse { at: usize },

    /// `{{else}}` at the top level
    #[error("{{{{else}}}} at byte {at} is not inside a block")]
    ElseOutsideBlock { at: usize },

    /// Block nesting beyond the configured ceiling
    #[error("blocks nested deeper than {limit} levels at byte {at}")]
    NestingTooDeep { limit: usize, at: usize },
}

impl ParseError {
    /// Byte offset of the tag that triggered the error.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnmatchedBlockStart { at, .. }
            | ParseError::UnmatchedBlockEnd { at, .. }
            | ParseError::MismatchedBlockEnd { at, .. }
            | ParseError::MultipleElse { at }
            | ParseError::ElseOutsideBlock { at }
            | ParseError::NestingTooDeep { at, .. } => *at,
        }
    }
}

/// Errors surfaced by `try_render` and `annotate`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("template is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// Condition evaluation failures. Never fatal: the condition reads as false.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderError {
    #[error("cannot compare `{key}` ({lhs:?}) with {op} {literal:?}: operands must be numeric")]
    InvalidComparisonOperand {
        key: String,
        op: CompareOp,
        lhs: Option<String>,
        literal: String,
    },
}

/// Value shape did not match the variable's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CoercionWarning {
    #[error("list value for scalar variable `{key}` was joined into text")]
    ListAsScalar { key: String },

    #[error("scalar value for list variable `{key}` was used as text")]
    ScalarAsList { key: String },
}

impl CoercionWarning {
    pub fn key(&self) -> &str {
        match self {
            CoercionWarning::ListAsScalar { key } | CoercionWarning::ScalarAsList { key } => key,
        }
    }
}

/// Problems with authored variable definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("invalid variable key {0:?}: expected 1-50 characters from [A-Za-z0-9_-]")]
    InvalidKey(String),

    #[error("variable key {0:?} is defined more than once")]
    DuplicateKey(String),
}
