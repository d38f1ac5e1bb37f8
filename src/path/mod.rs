//! Property-path expressions over navigable object graphs
//!
//! A path expression is a chain of member and indexer accessors applied to a
//! root value, in the spirit of data-binding expressions.
//!
//! # Syntax
//!
//! ```text
//! Exception.Message                       Named members
//! Context.Request.ServerVariables['HOST'] String indexer
//! Items[0].Name                           Integer index into a list
//! Form("user")                            Parenthesised indexer
//! ```
//!
//! In lenient mode any null or missing intermediate yields `Value::Null`.
//! In strict mode the same gaps raise a [`BindingError`].

pub mod error;
pub mod parser;

pub use error::{BindingError, PathFormatError};
pub use parser::{Accessor, parse_accessors};

use crate::value::{Index, Value};
use std::fmt;
use std::sync::Arc;

/// A compiled path: one function folding all accessor steps.
pub type CompiledPath = Arc<dyn Fn(&Value) -> Result<Value, BindingError> + Send + Sync>;

/// A parsed path expression bound to a lookup policy
#[derive(Clone, PartialEq, Eq)]
pub struct PathExpression {
    text: String,
    steps: Vec<Accessor>,
    strict: bool,
}

impl PathExpression {
    pub fn parse(text: &str, strict: bool) -> Result<Self, PathFormatError> {
        Ok(Self {
            text: text.trim().to_string(),
            steps: parse_accessors(text)?,
            strict,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn steps(&self) -> &[Accessor] {
        &self.steps
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn evaluate(&self, root: &Value) -> Result<Value, BindingError> {
        walk(root, &self.steps, self.strict)
    }
}

impl fmt::Debug for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathExpression({:?}, strict={})", self.text, self.strict)
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse `expression` and fold its steps into a single reusable function.
pub fn compile(expression: &str, strict: bool) -> Result<CompiledPath, PathFormatError> {
    let steps = parse_accessors(expression)?;
    Ok(Arc::new(move |root: &Value| walk(root, &steps, strict)))
}

/// One-shot evaluation of `expression` against `root`.
pub fn eval(root: &Value, expression: &str, strict: bool) -> Result<Value, PathError> {
    let steps = parse_accessors(expression)?;
    Ok(walk(root, &steps, strict)?)
}

/// Either failure a one-shot [`eval`] can produce
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error(transparent)]
    Format(#[from] PathFormatError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

fn walk(root: &Value, steps: &[Accessor], strict: bool) -> Result<Value, BindingError> {
    steps.iter().try_fold(root.clone(), |current, step| {
        if current.is_null() && !strict {
            return Ok(Value::Null);
        }
        match step {
            Accessor::Member(name) => member(&current, name, strict),
            Accessor::Index(index) => indexed(&current, index, strict),
        }
    })
}

fn member(current: &Value, name: &str, strict: bool) -> Result<Value, BindingError> {
    let found = match current {
        Value::Null => {
            return Err(BindingError::NullReference {
                step: name.to_string(),
            });
        }
        Value::Object(obj) => obj.get_named(name),
        Value::Str(s) if name == "Length" => Some(Value::Int(s.chars().count() as i64)),
        Value::List(items) if name == "Length" || name == "Count" => {
            Some(Value::Int(items.len() as i64))
        }
        _ => None,
    };

    match found {
        Some(value) => Ok(value),
        None if strict => Err(BindingError::MissingMember {
            type_name: current.type_name().to_string(),
            member: name.to_string(),
        }),
        None => Ok(Value::Null),
    }
}

fn indexed(current: &Value, index: &Index, strict: bool) -> Result<Value, BindingError> {
    let found = match (current, index) {
        (Value::Null, _) => {
            return Err(BindingError::NullReference {
                step: format!("[{index}]"),
            });
        }
        (Value::List(items), Index::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i).cloned()),
        (Value::Str(s), Index::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::Str(c.to_string())),
        (Value::Object(obj), index) => obj.get_indexed(index),
        _ => None,
    };

    match found {
        Some(value) => Ok(value),
        None if strict => Err(BindingError::MissingIndexer {
            type_name: current.type_name().to_string(),
            index: index.to_string(),
        }),
        None => Ok(Value::Null),
    }
}
