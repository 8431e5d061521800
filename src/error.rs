//! Error types for schemafmt.

use thiserror::Error;

/// The main error type for formatting operations.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The dump could not be scanned or split into statements.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// The layout engine reached a state it must never be in.
    #[error("Internal formatting error: {0}")]
    Invariant(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Create a parse error at the given byte offset.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Byte offset of a parse error, if this is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Result type alias for formatting operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Translate a byte offset into a 1-based `(line, column)` pair.
pub fn line_col(source: &str, position: usize) -> (usize, usize) {
    let position = position.min(source.len());
    let before = &source.as_bytes()[..position];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, position - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormatError::parse(5, "unterminated quoted string");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unterminated quoted string"
        );
        assert_eq!(err.position(), Some(5));
    }

    #[test]
    fn test_invariant_display() {
        let err = FormatError::invariant("unbalanced parenthesis");
        assert_eq!(
            err.to_string(),
            "Internal formatting error: unbalanced parenthesis"
        );
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_line_col() {
        let source = "SET a = 1;\nSET b = 'x";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 19), (2, 9));
        assert_eq!(line_col(source, 500), (2, 11));
    }
}
