use super::literal::TypeCode;
use crate::path::BindingError;
use thiserror::Error;

/// Errors raised while constructing or testing an assertion
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("Assertions cannot be tested against a null context")]
    NullContext,

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error("Type code '{0}' cannot be used for ordered comparison")]
    NonComparableType(TypeCode),

    #[error("Cannot convert '{literal}' to {code}")]
    InvalidLiteral { code: TypeCode, literal: String },

    #[error("Context expression failed: {0}")]
    Expression(String),
}
