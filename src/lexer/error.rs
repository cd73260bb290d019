use thiserror::Error;

use crate::token::Span;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LexError {
    #[error("Unexpected character '{character}' at {position}")]
    UnexpectedCharacter { character: char, position: Span },
    #[error("Invalid integer literal '{literal}' at {position}")]
    InvalidIntegerLiteral { literal: String, position: Span },
    #[error("Unterminated string literal at {position}")]
    UnterminatedString { position: Span },
}

impl LexError {
    pub fn position(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { position, .. }
            | LexError::InvalidIntegerLiteral { position, .. }
            | LexError::UnterminatedString { position } => *position,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
