//! Core error types for diagram parsing
//!
//! Fatal failures (I/O, cancellation, dialect mismatch) are `DiagramError`.
//! Recoverable per-line problems are plain data collected on the diagram:
//! [`LineError`] for lines that matched no construct and [`ExplainedError`]
//! for lines that matched but could not be resolved.

use std::fmt;

use thiserror::Error;

/// Core error types for diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Parse error: {message} at line {line}")]
    ParseError { message: String, line: usize },

    #[error("Dialect mismatch: expected a {expected} diagram but line {line} is {found} syntax")]
    DialectMismatch {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Parse cancelled before line {line}")]
    Cancelled { line: usize },

    #[error("Pattern error: {source}")]
    PatternError {
        #[from]
        source: regex::Error,
    },

    #[error("Detection error: {message}")]
    DetectionError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Unknown diagram type: {diagram_type}")]
    UnknownDiagramType { diagram_type: String },
}

impl DiagramError {
    /// Create a new parse error
    pub fn parse_error(message: String, line: usize) -> Self {
        Self::ParseError { message, line }
    }

    /// Create a new dialect mismatch error
    pub fn dialect_mismatch(expected: &str, found: &str, line: usize) -> Self {
        Self::DialectMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            line,
        }
    }

    /// Create a new detection error
    pub fn detection_error(message: String) -> Self {
        Self::DetectionError { message }
    }

    /// Create a new unknown diagram type error
    pub fn unknown_diagram_type(diagram_type: &str) -> Self {
        Self::UnknownDiagramType {
            diagram_type: diagram_type.to_string(),
        }
    }

    /// True when the error only says the text belongs to another dialect
    pub fn is_dialect_mismatch(&self) -> bool {
        matches!(self, Self::DialectMismatch { .. })
    }
}

/// A line that matched no known construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// Verbatim (trimmed) line text
    pub text: String,
    /// 1-based source line
    pub line_number: usize,
    /// Why a recognized line was rejected, when known
    pub reason: Option<String>,
}

impl LineError {
    pub fn new(text: impl Into<String>, line_number: usize) -> Self {
        Self {
            text: text.into(),
            line_number,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.text)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

/// A recognized line whose references could not be resolved
///
/// Used for component arrows with unknown endpoints, matcher timeouts and
/// sequence diagram warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainedError {
    /// Verbatim (trimmed) line text
    pub line: String,
    /// 1-based source line
    pub line_number: usize,
    /// Human-readable explanation
    pub explanation: String,
}

impl ExplainedError {
    pub fn new(line: impl Into<String>, line_number: usize, explanation: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            line_number,
            explanation: explanation.into(),
        }
    }
}

impl fmt::Display for ExplainedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} ({})",
            self.line_number, self.line, self.explanation
        )
    }
}
