//! Composable boolean predicates over an error's evaluation context
//!
//! An [`Assertion`] tree is built once, usually by the
//! [`AssertionFactory`](crate::factory::AssertionFactory), and is immutable
//! afterwards. Testing never mutates the tree, so a single tree can be shared
//! across threads.

pub mod error;
pub mod expression;
pub mod literal;

pub use error::EvaluationError;
pub use expression::{ContextExpression, Resolver};
pub use literal::{Literal, TypeCode, TypedLiteral};

use crate::types::TypeRef;
use crate::value::Value;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equal,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparator {
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Equal => ordering == Ordering::Equal,
            Comparator::Lesser => ordering == Ordering::Less,
            Comparator::LesserOrEqual => ordering != Ordering::Greater,
            Comparator::Greater => ordering == Ordering::Greater,
            Comparator::GreaterOrEqual => ordering != Ordering::Less,
        }
    }
}

/// How a logical node combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalMode {
    /// True only if every child is true; empty is false.
    All,
    /// True if any child is true; empty is false.
    Any,
    /// Every child negated, then the `All` rule: plain negation for one
    /// child, NOR for several.
    InvertedAll,
}

#[derive(Debug, Clone)]
pub struct ComparisonAssertion {
    pub expression: ContextExpression,
    pub comparator: Comparator,
    pub expected: TypedLiteral,
}

#[derive(Debug, Clone)]
pub struct TypeAssertion {
    pub expression: ContextExpression,
    pub expected: TypeRef,
    pub by_compatibility: bool,
}

#[derive(Debug, Clone)]
pub struct RegexAssertion {
    pub expression: ContextExpression,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub struct LogicalAssertion {
    pub children: Arc<[Assertion]>,
    pub mode: LogicalMode,
}

#[derive(Debug, Clone)]
pub enum Assertion {
    Static(bool),
    IsNull(ContextExpression),
    Not(Box<Assertion>),
    Comparison(ComparisonAssertion),
    Type(TypeAssertion),
    RegexMatch(RegexAssertion),
    Logical(LogicalAssertion),
}

impl Assertion {
    pub const TRUE: Assertion = Assertion::Static(true);
    pub const FALSE: Assertion = Assertion::Static(false);

    pub fn is_null(expression: ContextExpression) -> Self {
        Assertion::IsNull(expression)
    }

    pub fn not(inner: Assertion) -> Self {
        Assertion::Not(Box::new(inner))
    }

    pub fn comparison(
        expression: ContextExpression,
        comparator: Comparator,
        code: TypeCode,
        literal: &str,
    ) -> Result<Self, EvaluationError> {
        Ok(Assertion::Comparison(ComparisonAssertion {
            expression,
            comparator,
            expected: TypedLiteral::parse(code, literal)?,
        }))
    }

    /// `expression` defaults to the context's `Exception` member.
    pub fn type_check(
        expression: Option<ContextExpression>,
        expected: TypeRef,
        by_compatibility: bool,
    ) -> Self {
        let expression = expression.unwrap_or_else(|| {
            ContextExpression::path("Exception").expect("constant path is well-formed")
        });
        let by_compatibility = by_compatibility || expected.forces_compatibility();
        Assertion::Type(TypeAssertion {
            expression,
            expected,
            by_compatibility,
        })
    }

    /// An empty pattern can never be meaningfully matched and collapses to
    /// [`Assertion::FALSE`].
    pub fn regex(
        expression: ContextExpression,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Assertion::FALSE);
        }
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Assertion::RegexMatch(RegexAssertion { expression, regex }))
    }

    pub fn logical(children: Vec<Assertion>, mode: LogicalMode) -> Self {
        Assertion::Logical(LogicalAssertion {
            children: children.into(),
            mode,
        })
    }

    pub fn all(children: Vec<Assertion>) -> Self {
        Self::logical(children, LogicalMode::All)
    }

    pub fn any(children: Vec<Assertion>) -> Self {
        Self::logical(children, LogicalMode::Any)
    }

    pub fn none_of(children: Vec<Assertion>) -> Self {
        Self::logical(children, LogicalMode::InvertedAll)
    }

    pub fn test(&self, context: &Value) -> Result<bool, EvaluationError> {
        if context.is_null() {
            return Err(EvaluationError::NullContext);
        }

        match self {
            Assertion::Static(value) => Ok(*value),
            Assertion::IsNull(expression) => Ok(expression.evaluate(context)?.is_null()),
            Assertion::Not(inner) => Ok(!inner.test(context)?),
            Assertion::Comparison(cmp) => {
                let actual = cmp.expression.evaluate(context)?;
                if actual.is_null() {
                    return Ok(false);
                }
                Ok(cmp
                    .expected
                    .compare(&actual)
                    .is_some_and(|ordering| cmp.comparator.accepts(ordering)))
            }
            Assertion::Type(check) => {
                let actual = check.expression.evaluate(context)?;
                if actual.is_null() {
                    return Ok(false);
                }
                let expected = check.expected.name.as_str();
                if actual.type_name() == expected {
                    return Ok(true);
                }
                Ok(check.by_compatibility
                    && (expected == "Object" || actual.ancestry().contains(&expected)))
            }
            Assertion::RegexMatch(matcher) => {
                let actual = matcher.expression.evaluate(context)?;
                Ok(matcher.regex.is_match(&actual.to_invariant_string()))
            }
            Assertion::Logical(logical) => test_logical(logical, context),
        }
    }
}

fn test_logical(logical: &LogicalAssertion, context: &Value) -> Result<bool, EvaluationError> {
    if logical.children.is_empty() {
        return Ok(false);
    }

    match logical.mode {
        LogicalMode::All => {
            for child in logical.children.iter() {
                if !child.test(context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        LogicalMode::Any => {
            for child in logical.children.iter() {
                if child.test(context)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        LogicalMode::InvertedAll => {
            for child in logical.children.iter() {
                if child.test(context)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
