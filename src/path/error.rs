use thiserror::Error;

/// Malformed path-expression syntax
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid path expression '{expression}' at position {position}: {reason}")]
pub struct PathFormatError {
    pub expression: String,
    pub position: usize,
    pub reason: String,
}

/// A strict-mode lookup that could not be satisfied
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("Cannot evaluate '{step}' because the value it is applied to is null")]
    NullReference { step: String },

    #[error("Type '{type_name}' does not have a member named '{member}'")]
    MissingMember { type_name: String, member: String },

    #[error("Type '{type_name}' has no indexer accepting {index}")]
    MissingIndexer { type_name: String, index: String },
}
