use thiserror::Error;

use crate::token::Span;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BuildError {
    #[error("Malformed expression at {position}: binary node has no operator")]
    MalformedExpression { position: Span },
    #[error("Unknown operator '{lexeme}' at {position}")]
    UnknownOperator { lexeme: String, position: Span },
    #[error("Invalid assignment target at {position}")]
    InvalidAssignTarget { position: Span },
    #[error("Procedure '{name}' is declared more than once")]
    DuplicateProcedure { name: String },
}

pub type BuildResult<T> = Result<T, BuildError>;
