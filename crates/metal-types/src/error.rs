use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Runtime,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Runtime => write!(f, "runtime"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Numeric error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E199) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_LITERAL: Self = Self(102);

    // ── Syntax errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const UNCLOSED_DELIMITER: Self = Self(201);
    pub const NON_ASSOCIATIVE: Self = Self(202);
    pub const NESTING_TOO_DEEP: Self = Self(203);

    // ── Runtime errors (E300–E399) ──
    pub const MISSING_KEY: Self = Self(300);
    pub const UNBOUND_SYMBOL: Self = Self(301);
    pub const EMPTY_STACK: Self = Self(302);
    pub const NOT_EVALUABLE: Self = Self(303);
    pub const NOT_APPLICABLE: Self = Self(304);
    pub const UNKNOWN_OPERATOR: Self = Self(305);

    // ── I/O errors (E400–E499) ──
    pub const UNREADABLE_SOURCE: Self = Self(400);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Syntax,
            300..=399 => ErrorCategory::Runtime,
            _ => ErrorCategory::Io,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A diagnostic handed back to the host: lexical and syntax failures,
/// and runtime failures lifted to the statement that raised them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalError {
    /// Source chunk name (file path, `<stdin>`, ...).
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
}

impl MetalError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }

    /// Build an error located in `source`, pulling the source line from it.
    pub fn in_source(
        source: &SourceFile,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        let line = source.line(span.start_line).unwrap_or("");
        Self::new(&source.name, code, message, span, line)
    }

    /// Lift a runtime failure to the statement at `span`.
    pub fn runtime(source: &SourceFile, err: &NodeError, span: Span) -> Self {
        Self::in_source(source, err.code(), err.to_string(), span)
    }

    /// A source that could not be read at all.
    pub fn unreadable(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, ErrorCode::UNREADABLE_SOURCE, message, Span::point(1, 1), "")
    }
}

impl fmt::Display for MetalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for MetalError {}

/// Failures raised by node operations and by evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Slot lookup on a key the node does not have.
    #[error("missing key '{0}'")]
    MissingKey(String),

    /// A symbol with no binding in the environment.
    #[error("unbound symbol '{0}'")]
    UnboundSymbol(String),

    /// A stack operation that needs more elements than the sequence holds.
    #[error("{op}: stack holds {found} element(s), needs {needed}")]
    EmptyStack {
        op: &'static str,
        needed: usize,
        found: usize,
    },

    /// The node's kind has no evaluation rule.
    #[error("<{0}> cannot be evaluated")]
    NotEvaluable(String),

    /// The node's kind cannot be applied to an operand.
    #[error("<{0}> cannot be applied")]
    NotApplicable(String),

    /// An operator node whose glyph has no evaluation rule.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
}

impl NodeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingKey(_) => ErrorCode::MISSING_KEY,
            Self::UnboundSymbol(_) => ErrorCode::UNBOUND_SYMBOL,
            Self::EmptyStack { .. } => ErrorCode::EMPTY_STACK,
            Self::NotEvaluable(_) => ErrorCode::NOT_EVALUABLE,
            Self::NotApplicable(_) => ErrorCode::NOT_APPLICABLE,
            Self::UnknownOperator(_) => ErrorCode::UNKNOWN_OPERATOR,
        }
    }
}

/// Result alias for node operations and evaluation.
pub type NodeResult<T> = Result<T, NodeError>;
