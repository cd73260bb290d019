use thiserror::Error;

use crate::lexer::LexError;
use crate::token::Span;

/// First structural or lexical error found in a source text.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Syntax error at {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Span) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl From<LexError> for SyntaxError {
    fn from(error: LexError) -> Self {
        let message = match &error {
            LexError::UnexpectedCharacter { character, .. } => {
                format!("Unexpected character '{character}'")
            }
            LexError::InvalidIntegerLiteral { literal, .. } => {
                format!("Invalid integer literal '{literal}'")
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
        };
        Self {
            message,
            position: error.position(),
        }
    }
}
