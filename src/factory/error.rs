use crate::assertion::EvaluationError;
use crate::path::PathFormatError;
use thiserror::Error;

/// Errors raised while building an assertion tree from configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Unexpected content under '{parent}': {content:?}. Only rule elements are allowed")]
    UnexpectedContent { parent: String, content: String },

    #[error(
        "No builder named '{builder}' is registered for rule '{rule}'. Expected a public \
         builder registered as `{builder}`, either `fn(&AssertionFactory, &ConfigNode) -> \
         Result<Assertion, ConfigurationError>` or a parameter-bound builder"
    )]
    MissingBuilder { rule: String, builder: String },

    #[error(
        "Invalid rule module locator '{0}'. Expected '.../ns/<namespace>', \
         '.../module/<module>' or '.../nsmodule/<namespace>/<module>'"
    )]
    InvalidModuleLocator(String),

    #[error("Rule module '{module}' (namespace '{namespace}') is not registered")]
    UnresolvedModule { namespace: String, module: String },

    #[error("Rule '{rule}' requires the '{parameter}' parameter")]
    MissingParameter { rule: String, parameter: String },

    #[error("Invalid value {value:?} for parameter '{parameter}' of rule '{rule}': {reason}")]
    InvalidParameter {
        rule: String,
        parameter: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Path(#[from] PathFormatError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("Failed to build rule '{rule}': {message}")]
    Build {
        rule: String,
        message: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}
