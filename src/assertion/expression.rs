use super::error::EvaluationError;
use crate::path::{PathExpression, PathFormatError};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

pub type Resolver = Arc<dyn Fn(&Value) -> Result<Value, EvaluationError> + Send + Sync>;

/// Extracts a value from an evaluation context
#[derive(Clone)]
pub enum ContextExpression {
    Path(PathExpression),
    Delegate(Resolver),
}

impl ContextExpression {
    /// Lenient path binding: gaps in the graph evaluate to null.
    pub fn path(text: &str) -> Result<Self, PathFormatError> {
        Ok(ContextExpression::Path(PathExpression::parse(text, false)?))
    }

    pub fn strict_path(text: &str) -> Result<Self, PathFormatError> {
        Ok(ContextExpression::Path(PathExpression::parse(text, true)?))
    }

    pub fn delegate<F>(resolver: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        ContextExpression::Delegate(Arc::new(resolver))
    }

    pub fn evaluate(&self, context: &Value) -> Result<Value, EvaluationError> {
        match self {
            ContextExpression::Path(path) => Ok(path.evaluate(context)?),
            ContextExpression::Delegate(resolver) => resolver(context),
        }
    }
}

impl fmt::Debug for ContextExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextExpression::Path(path) => write!(f, "{path:?}"),
            ContextExpression::Delegate(_) => f.write_str("Delegate(..)"),
        }
    }
}

impl fmt::Display for ContextExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextExpression::Path(path) => write!(f, "{path}"),
            ContextExpression::Delegate(_) => f.write_str("<delegate>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::BindingError;
    use crate::value::Record;

    #[test]
    fn test_path_expressions_are_lenient_by_default() {
        let ctx = Value::object(Record::new("Ctx"));
        let expr = ContextExpression::path("Missing.Deeper").unwrap();
        assert!(expr.evaluate(&ctx).unwrap().is_null());

        let strict = ContextExpression::strict_path("Missing").unwrap();
        assert!(matches!(
            strict.evaluate(&ctx),
            Err(EvaluationError::Binding(BindingError::MissingMember { .. }))
        ));
    }

    #[test]
    fn test_delegate_expression() {
        let expr = ContextExpression::delegate(|_| Ok(Value::Int(3)));
        assert!(matches!(expr.evaluate(&Value::Null), Ok(Value::Int(3))));
        assert_eq!(expr.to_string(), "<delegate>");
    }
}
