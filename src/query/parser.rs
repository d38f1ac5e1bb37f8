use super::error::QueryParseError;
use super::matcher::{AccessorRegistry, PropertyType};
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

/// Conditions a predicate can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCondition {
    Equals,
    NotEquals,
    Contains,
    DoesNotContain,
}

impl FromStr for QueryCondition {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(QueryCondition::Equals),
            "!=" => Ok(QueryCondition::NotEquals),
            "~" => Ok(QueryCondition::Contains),
            "!~" => Ok(QueryCondition::DoesNotContain),
            _ => Err(QueryParseError::UnknownOperator(s.to_string())),
        }
    }
}

impl QueryCondition {
    pub fn symbol(&self) -> &'static str {
        match self {
            QueryCondition::Equals => "=",
            QueryCondition::NotEquals => "!=",
            QueryCondition::Contains => "~",
            QueryCondition::DoesNotContain => "!~",
        }
    }
}

/// Precision a date literal was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    Day,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLiteral {
    pub value: NaiveDateTime,
    pub granularity: DateGranularity,
}

impl FromStr for DateLiteral {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(value) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(DateLiteral {
                    value,
                    granularity: DateGranularity::Second,
                });
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|value| DateLiteral {
                value,
                granularity: DateGranularity::Day,
            })
            .ok_or_else(|| QueryParseError::InvalidDate(s.to_string()))
    }
}

/// A single `<property> <op> <value>` predicate (e.g. `status-code = 404`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub property: String,
    pub property_type: PropertyType,
    pub condition: QueryCondition,
    pub value: String,
    /// Parsed form of `value` for date-time properties.
    pub date: Option<DateLiteral>,
}

impl QueryFilter {
    /// Parse a predicate against the standard accessor registry
    pub fn parse(s: &str) -> Result<Self, QueryParseError> {
        Self::parse_with(s, AccessorRegistry::standard())
    }

    pub fn parse_with(s: &str, registry: &AccessorRegistry) -> Result<Self, QueryParseError> {
        let text = s.trim();
        let Some((property, rest)) = text.split_once(char::is_whitespace) else {
            return Err(QueryParseError::InvalidExpression(format!(
                "Expected '<property> <operator> <value>' format, got: {}",
                s
            )));
        };

        let rest = rest.trim_start();
        let (operator, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let condition: QueryCondition = operator.parse()?;

        let property_type =
            registry
                .property_type(property)
                .ok_or_else(|| QueryParseError::UnknownProperty {
                    property: property.to_string(),
                    valid: registry.property_names().join(", "),
                })?;

        let value = unquote(value.trim()).to_string();
        if value.is_empty() {
            return Err(QueryParseError::EmptyValue(property.to_string()));
        }

        let date = match property_type {
            PropertyType::DateTime => Some(value.parse::<DateLiteral>()?),
            PropertyType::String => None,
        };

        Ok(QueryFilter {
            property: property.to_string(),
            property_type,
            condition,
            value,
            date,
        })
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_predicate() {
        let filter = QueryFilter::parse("status-code = 404").unwrap();
        assert_eq!(filter.property, "status-code");
        assert_eq!(filter.condition, QueryCondition::Equals);
        assert_eq!(filter.value, "404");
        assert_eq!(filter.property_type, PropertyType::String);
        assert!(filter.date.is_none());
    }

    #[test]
    fn test_parse_every_operator() {
        for (op, condition) in [
            ("=", QueryCondition::Equals),
            ("!=", QueryCondition::NotEquals),
            ("~", QueryCondition::Contains),
            ("!~", QueryCondition::DoesNotContain),
        ] {
            let filter = QueryFilter::parse(&format!("message {op} time out")).unwrap();
            assert_eq!(filter.condition, condition);
            assert_eq!(filter.value, "time out");
            assert_eq!(condition.symbol(), op);
        }
    }

    #[test]
    fn test_parse_quoted_values() {
        let filter = QueryFilter::parse("user = 'DOMAIN\\bob smith'").unwrap();
        assert_eq!(filter.value, "DOMAIN\\bob smith");
    }

    #[test]
    fn test_parse_date_literals() {
        let day = QueryFilter::parse("date-time = 2024-03-01").unwrap();
        assert_eq!(day.property_type, PropertyType::DateTime);
        assert_eq!(day.date.unwrap().granularity, DateGranularity::Day);

        let second = QueryFilter::parse("date-time ~ \"2024-03-01 10:11:12\"").unwrap();
        assert_eq!(second.date.unwrap().granularity, DateGranularity::Second);

        assert_eq!(
            QueryFilter::parse("date-time = yesterday"),
            Err(QueryParseError::InvalidDate("yesterday".into()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            QueryFilter::parse("status-code"),
            Err(QueryParseError::InvalidExpression(_))
        ));
        assert!(matches!(
            QueryFilter::parse("colour = red"),
            Err(QueryParseError::UnknownProperty { .. })
        ));
        assert_eq!(
            QueryFilter::parse("message == x"),
            Err(QueryParseError::UnknownOperator("==".into()))
        );
        assert_eq!(
            QueryFilter::parse("message ="),
            Err(QueryParseError::EmptyValue("message".into()))
        );
    }
}
