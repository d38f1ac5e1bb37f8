use super::parser::{DateGranularity, DateLiteral, QueryCondition, QueryFilter};
use super::record::LoggedError;
use chrono::{NaiveDateTime, Timelike};
use std::borrow::Cow;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    DateTime,
}

pub type StringAccessor = fn(&LoggedError) -> Cow<'_, str>;
pub type DateTimeAccessor = fn(&LoggedError) -> NaiveDateTime;

/// Property name → accessor over a [`LoggedError`]
#[derive(Debug, Clone, Default)]
pub struct AccessorRegistry {
    strings: Vec<(&'static str, StringAccessor)>,
    date_times: Vec<(&'static str, DateTimeAccessor)>,
}

impl AccessorRegistry {
    /// An empty registry; properties are added with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> &'static AccessorRegistry {
        static STANDARD: LazyLock<AccessorRegistry> = LazyLock::new(|| {
            AccessorRegistry::new()
                .with_string("application", application)
                .with_string("host", host)
                .with_string("type", type_name)
                .with_string("source", source)
                .with_string("message", message)
                .with_string("detail", detail)
                .with_string("user", user)
                .with_string("status-code", status_code)
                .with_date_time("date-time", time)
        });
        &STANDARD
    }

    /// Add or replace a string property.
    pub fn with_string(mut self, name: &'static str, accessor: StringAccessor) -> Self {
        self.strings.retain(|(existing, _)| *existing != name);
        self.strings.push((name, accessor));
        self
    }

    /// Add or replace a date-time property.
    pub fn with_date_time(mut self, name: &'static str, accessor: DateTimeAccessor) -> Self {
        self.date_times.retain(|(existing, _)| *existing != name);
        self.date_times.push((name, accessor));
        self
    }

    pub fn property_type(&self, property: &str) -> Option<PropertyType> {
        if self.string_accessor(property).is_some() {
            Some(PropertyType::String)
        } else if self.date_time_accessor(property).is_some() {
            Some(PropertyType::DateTime)
        } else {
            None
        }
    }

    pub fn property_names(&self) -> Vec<&'static str> {
        self.strings
            .iter()
            .map(|(name, _)| *name)
            .chain(self.date_times.iter().map(|(name, _)| *name))
            .collect()
    }

    pub fn string_accessor(&self, property: &str) -> Option<StringAccessor> {
        self.strings
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, accessor)| *accessor)
    }

    pub fn date_time_accessor(&self, property: &str) -> Option<DateTimeAccessor> {
        self.date_times
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, accessor)| *accessor)
    }

    pub fn string_accessors(&self) -> impl Iterator<Item = StringAccessor> + '_ {
        self.strings.iter().map(|(_, accessor)| *accessor)
    }

    /// Whether `entry` satisfies `filter`. Unknown properties never match.
    pub fn matches(&self, filter: &QueryFilter, entry: &LoggedError) -> bool {
        match (filter.property_type, &filter.date) {
            (PropertyType::DateTime, Some(literal)) => self
                .date_time_accessor(&filter.property)
                .is_some_and(|get| compare_date_time(filter.condition, get(entry), literal)),
            (PropertyType::DateTime, None) => false,
            (PropertyType::String, _) => self
                .string_accessor(&filter.property)
                .is_some_and(|get| compare_string(filter.condition, &get(entry), &filter.value)),
        }
    }

    /// Case-insensitive substring search across every string property.
    pub fn search(&self, entry: &LoggedError, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        let needle = text.to_lowercase();
        self.string_accessors()
            .any(|get| get(entry).to_lowercase().contains(&needle))
    }
}

fn application(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.application)
}

fn host(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.host_name)
}

fn type_name(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.type_name)
}

fn source(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.source)
}

fn message(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.message)
}

fn detail(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.detail)
}

fn user(e: &LoggedError) -> Cow<'_, str> {
    Cow::Borrowed(&e.user)
}

fn status_code(e: &LoggedError) -> Cow<'_, str> {
    Cow::Owned(e.status_code.to_string())
}

fn time(e: &LoggedError) -> NaiveDateTime {
    e.time
}

/// String comparisons ignore case.
pub fn compare_string(condition: QueryCondition, actual: &str, expected: &str) -> bool {
    match condition {
        QueryCondition::Equals => actual.to_lowercase() == expected.to_lowercase(),
        QueryCondition::NotEquals => actual.to_lowercase() != expected.to_lowercase(),
        QueryCondition::Contains => actual.to_lowercase().contains(&expected.to_lowercase()),
        QueryCondition::DoesNotContain => {
            !actual.to_lowercase().contains(&expected.to_lowercase())
        }
    }
}

/// Equality compares at the literal's own precision; containment asks
/// whether `actual` falls on the literal's day.
pub fn compare_date_time(condition: QueryCondition, actual: NaiveDateTime, expected: &DateLiteral) -> bool {
    let same_day = actual.date() == expected.value.date();
    let equal = match expected.granularity {
        DateGranularity::Day => same_day,
        DateGranularity::Second => actual.with_nanosecond(0).unwrap_or(actual) == expected.value,
    };
    match condition {
        QueryCondition::Equals => equal,
        QueryCondition::NotEquals => !equal,
        QueryCondition::Contains => same_day,
        QueryCondition::DoesNotContain => !same_day,
    }
}
