//! Query predicates for browsing logged errors
//!
//! Each predicate is a `<property> <operator> <value>` string. All predicates
//! must hold for an entry to match; an optional free-text search is applied
//! afterwards.
//!
//! # Operators
//!
//! ```text
//! =     equals               (case-insensitive)
//! !=    not equals
//! ~     contains
//! !~    does not contain
//! ```
//!
//! # Properties
//!
//! `application`, `host`, `type`, `source`, `message`, `detail`, `user`,
//! `status-code` and `date-time`. Dates are written `YYYY-MM-DD` or
//! `YYYY-MM-DD HH:MM:SS`.
//!
//! # Examples
//!
//! ```text
//! status-code = 404
//! type ~ Sql
//! date-time = 2024-03-01
//! message !~ "thread was being aborted"
//! ```

pub mod error;
pub mod matcher;
pub mod parser;
pub mod record;

pub use error::QueryParseError;
pub use matcher::{AccessorRegistry, PropertyType, compare_date_time, compare_string};
pub use parser::{DateGranularity, DateLiteral, QueryCondition, QueryFilter};
pub use record::LoggedError;

/// Predicates combined with AND, plus free-text search.
///
/// Predicates are parsed and matched against the same [`AccessorRegistry`].
#[derive(Debug, Clone)]
pub struct RecordQuery<'r> {
    filters: Vec<QueryFilter>,
    search: Option<String>,
    registry: &'r AccessorRegistry,
}

impl Default for RecordQuery<'static> {
    fn default() -> Self {
        Self::with_registry(AccessorRegistry::standard())
    }
}

impl RecordQuery<'static> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every predicate; the first malformed one fails the whole query.
    pub fn parse_all<S: AsRef<str>>(predicates: &[S]) -> Result<Self, QueryParseError> {
        Self::parse_all_with(predicates, AccessorRegistry::standard())
    }
}

impl<'r> RecordQuery<'r> {
    pub fn with_registry(registry: &'r AccessorRegistry) -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            registry,
        }
    }

    pub fn parse_all_with<S: AsRef<str>>(
        predicates: &[S],
        registry: &'r AccessorRegistry,
    ) -> Result<Self, QueryParseError> {
        let mut query = Self::with_registry(registry);
        for predicate in predicates {
            query
                .filters
                .push(QueryFilter::parse_with(predicate.as_ref(), registry)?);
        }
        Ok(query)
    }

    pub fn registry(&self) -> &'r AccessorRegistry {
        self.registry
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_search(mut self, text: Option<&str>) -> Self {
        self.search = text.map(str::to_string);
        self
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.search.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, entry: &LoggedError) -> bool {
        self.filters
            .iter()
            .all(|filter| self.registry.matches(filter, entry))
            && self
                .search
                .as_deref()
                .is_none_or(|text| self.registry.search(entry, text))
    }

    pub fn apply<'a>(&self, entries: &'a [LoggedError]) -> Vec<&'a LoggedError> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status_code: i64, message: &str) -> LoggedError {
        LoggedError {
            status_code,
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let query = RecordQuery::parse_all(&["status-code = 500", "message ~ timeout"]).unwrap();
        assert!(query.matches(&entry(500, "Request Timeout")));
        assert!(!query.matches(&entry(500, "null reference")));
        assert!(!query.matches(&entry(404, "timeout")));
    }

    #[test]
    fn test_search_runs_after_predicates() {
        let query = RecordQuery::parse_all(&["status-code != 404"])
            .unwrap()
            .with_search(Some("DEADLOCK"));
        assert!(query.matches(&entry(500, "Transaction deadlock victim")));
        assert!(!query.matches(&entry(404, "deadlock")));
        assert!(!query.matches(&entry(500, "timeout")));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = RecordQuery::new().with_search(Some(""));
        assert!(query.is_empty());
        assert!(query.matches(&entry(200, "")));
    }

    fn message_only(e: &LoggedError) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed(&e.message)
    }

    #[test]
    fn test_queries_match_with_their_own_registry() {
        let registry = AccessorRegistry::new().with_string("message", message_only);
        let query = RecordQuery::parse_all_with(&["message ~ deadlock"], &registry).unwrap();
        assert!(std::ptr::eq(query.registry(), &registry));
        assert!(query.matches(&entry(500, "deadlock victim")));
        assert!(RecordQuery::parse_all_with(&["status-code = 500"], &registry).is_err());
    }

    #[test]
    fn test_one_bad_predicate_fails_the_query() {
        assert!(RecordQuery::parse_all(&["status-code = 1", "bogus"]).is_err());
    }
}
