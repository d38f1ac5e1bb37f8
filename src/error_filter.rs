//! Per-event filtering of captured errors
//!
//! An [`ErrorFilter`] tests its assertion against each captured error. A
//! match dismisses the error from default logging; when the filter names
//! notifiers, the error is routed to exactly those notifiers instead of being
//! dropped entirely.

use crate::assertion::{Assertion, EvaluationError};
use crate::config::ErrorFilterSettings;
use crate::context::{CapturedError, ErrorContext};
use crate::factory::{AssertionFactory, ConfigurationError};
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error};

/// What should happen to an error after filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "notifiers", rename_all = "snake_case")]
pub enum FilterDecision {
    /// Log and notify as usual.
    Log,
    /// Drop from logging and every notifier.
    Dismiss,
    /// Drop from default logging; deliver only to these notifiers.
    Route(BTreeSet<String>),
}

/// A captured error travelling through the filtering step
#[derive(Debug, Clone)]
pub struct FilteringArgs {
    exception: Arc<CapturedError>,
    context: Value,
    decision: FilterDecision,
}

impl FilteringArgs {
    pub fn new(exception: CapturedError, context: Value) -> Self {
        Self {
            exception: Arc::new(exception),
            context,
            decision: FilterDecision::Log,
        }
    }

    pub fn exception(&self) -> &CapturedError {
        &self.exception
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn dismiss(&mut self) {
        self.decision = FilterDecision::Dismiss;
    }

    pub fn route_to(&mut self, notifiers: BTreeSet<String>) {
        self.decision = FilterDecision::Route(notifiers);
    }

    /// Whether default logging should skip this error.
    pub fn is_dismissed(&self) -> bool {
        self.decision != FilterDecision::Log
    }

    /// Whether the notifier called `name` should still receive this error.
    pub fn should_notify(&self, name: &str) -> bool {
        match &self.decision {
            FilterDecision::Log => true,
            FilterDecision::Dismiss => false,
            FilterDecision::Route(notifiers) => notifiers.contains(name),
        }
    }

    pub fn decision(&self) -> &FilterDecision {
        &self.decision
    }

    /// The read-only root that filter rules are evaluated against.
    fn evaluation_context(&self) -> Value {
        ErrorContext::new(self.exception.clone(), self.context.clone()).into_value()
    }
}

/// A root assertion plus the notifiers matching errors are routed to
#[derive(Debug, Clone)]
pub struct ErrorFilter {
    assertion: Assertion,
    notifiers: BTreeSet<String>,
}

impl ErrorFilter {
    pub fn new<I, S>(assertion: Assertion, notifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assertion,
            notifiers: notifiers
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(
        settings: &ErrorFilterSettings,
        factory: &AssertionFactory,
    ) -> Result<Self, ConfigurationError> {
        let assertion = factory.create(&settings.test)?;
        Ok(Self::new(assertion, settings.notifiers.iter().cloned()))
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }

    pub fn notifiers(&self) -> &BTreeSet<String> {
        &self.notifiers
    }

    /// Test `args` and record the resulting decision on it.
    pub fn test(&self, args: &mut FilteringArgs) -> Result<bool, EvaluationError> {
        let matched = self.assertion.test(&args.evaluation_context())?;
        if matched {
            if self.notifiers.is_empty() {
                args.dismiss();
            } else {
                args.route_to(self.notifiers.clone());
            }
        }
        debug!(
            error_type = %args.exception.type_name,
            matched,
            decision = ?args.decision,
            "error filter evaluated"
        );
        Ok(matched)
    }
}

/// The error-capture hook's view of filtering.
///
/// Evaluation failures are traced and handed back unchanged so the caller
/// still sees, and can still log, the error it captured.
#[derive(Debug, Clone, Default)]
pub struct ErrorFilterHook {
    filter: Option<Arc<ErrorFilter>>,
}

impl ErrorFilterHook {
    pub fn new(filter: ErrorFilter) -> Self {
        Self {
            filter: Some(Arc::new(filter)),
        }
    }

    /// A hook that never filters anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn on_filtering(&self, args: &mut FilteringArgs) -> Result<(), EvaluationError> {
        let Some(filter) = &self.filter else {
            return Ok(());
        };
        filter.test(args).map(|_| ()).inspect_err(|err| {
            error!(
                error_type = %args.exception().type_name,
                message = %args.exception().message,
                %err,
                "error filter failed"
            );
        })
    }
}
