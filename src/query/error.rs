use thiserror::Error;

/// Errors that can occur when parsing query predicates
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("Unknown property: '{property}'. Valid properties are: {valid}")]
    UnknownProperty { property: String, valid: String },

    #[error("Unknown operator: '{0}'. Valid operators are: = (equals), != (not equals), ~ (contains), !~ (does not contain)")]
    UnknownOperator(String),

    #[error("Empty value for property '{0}'")]
    EmptyValue(String),

    #[error("Invalid date value: '{0}'. Expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")]
    InvalidDate(String),

    #[error("Invalid query predicate: {0}")]
    InvalidExpression(String),
}
