//! Error types for pattern compilation, symbol table updates and pattern
//! configuration files.

use thiserror::Error;

use crate::symbols::{DataType, ScopeId};

/// A malformed token pattern.
///
/// Scoped to one pattern: a tokenizer that fails to register one pattern
/// keeps every other one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern `{pattern}` at byte {position}: {kind}")]
pub struct PatternSyntaxError {
    /// The full pattern text.
    pub pattern: String,
    /// Byte offset into the pattern where the problem was detected.
    pub position: usize,
    pub kind: PatternErrorKind,
}

impl PatternSyntaxError {
    pub(crate) fn new(pattern: &str, position: usize, kind: PatternErrorKind) -> Self {
        PatternSyntaxError {
            pattern: pattern.to_string(),
            position,
            kind,
        }
    }
}

/// What exactly was wrong with a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternErrorKind {
    #[error("empty pattern")]
    Empty,
    #[error("unmatched ')'")]
    UnmatchedClose,
    #[error("unclosed '('")]
    UnclosedGroup,
    #[error("empty group '()'")]
    EmptyGroup,
    #[error("unclosed character class '['")]
    UnclosedClass,
    #[error("empty character class")]
    EmptyClass,
    #[error("character class range [{lo}-{hi}] is out of order")]
    RangeOutOfOrder { lo: char, hi: char },
    #[error("operator '{0}' is missing an operand")]
    MissingOperand(char),
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("invalid escape '\\{0}'")]
    InvalidEscape(char),
    #[error("invalid bounded repetition: {0}")]
    InvalidRepetition(String),
    #[error("non-ASCII byte 0x{0:02x}")]
    NonAscii(u8),
}

/// A declaration, reference or assignment the symbol table rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("symbol '{name}' is already defined in scope {scope}")]
    AlreadyDefined { name: String, scope: ScopeId },

    #[error("undefined symbol '{name}'")]
    Undefined { name: String },

    #[error("invalid {data_type} value '{value}' for symbol '{name}'")]
    InvalidValue {
        name: String,
        data_type: DataType,
        value: String,
    },

    #[error("decimal value '{value}' for symbol '{name}' exceeds {max} decimal places")]
    TooManyDecimalPlaces {
        name: String,
        value: String,
        max: usize,
    },

    #[error("cannot store a {found} value in {expected} symbol '{name}'")]
    TypeMismatch {
        name: String,
        expected: DataType,
        found: DataType,
    },

    #[error("unbalanced '}}': no open scope to close")]
    UnbalancedScope,
}

/// Error from parsing a token-pattern configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern config error at byte {position}: {message}")]
pub struct ConfigError {
    /// Byte offset into the config content where the error was detected.
    pub position: usize,
    /// Human-readable description of the error.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        ConfigError {
            position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_display() {
        let err = PatternSyntaxError::new("(ab", 0, PatternErrorKind::UnclosedGroup);
        assert_eq!(err.to_string(), "invalid pattern `(ab` at byte 0: unclosed '('");
    }

    #[test]
    fn test_semantic_error_messages() {
        let dup = SemanticError::AlreadyDefined { name: "x".to_string(), scope: 0 };
        assert!(dup.to_string().contains("already defined"));

        let undef = SemanticError::Undefined { name: "y".to_string() };
        assert_eq!(undef.to_string(), "undefined symbol 'y'");

        assert_eq!(
            SemanticError::UnbalancedScope.to_string(),
            "unbalanced '}': no open scope to close"
        );
    }

    #[test]
    fn test_invalid_escape_display() {
        assert_eq!(PatternErrorKind::InvalidEscape('q').to_string(), "invalid escape '\\q'");
    }
}
