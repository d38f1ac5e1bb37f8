use super::error::EvaluationError;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Runtime type codes a comparison literal may be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Empty,
    Object,
    DBNull,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    DateTime,
    String,
}

impl TypeCode {
    const ALL: [TypeCode; 18] = [
        TypeCode::Empty,
        TypeCode::Object,
        TypeCode::DBNull,
        TypeCode::Boolean,
        TypeCode::Char,
        TypeCode::SByte,
        TypeCode::Byte,
        TypeCode::Int16,
        TypeCode::UInt16,
        TypeCode::Int32,
        TypeCode::UInt32,
        TypeCode::Int64,
        TypeCode::UInt64,
        TypeCode::Single,
        TypeCode::Double,
        TypeCode::Decimal,
        TypeCode::DateTime,
        TypeCode::String,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TypeCode::Empty => "Empty",
            TypeCode::Object => "Object",
            TypeCode::DBNull => "DBNull",
            TypeCode::Boolean => "Boolean",
            TypeCode::Char => "Char",
            TypeCode::SByte => "SByte",
            TypeCode::Byte => "Byte",
            TypeCode::Int16 => "Int16",
            TypeCode::UInt16 => "UInt16",
            TypeCode::Int32 => "Int32",
            TypeCode::UInt32 => "UInt32",
            TypeCode::Int64 => "Int64",
            TypeCode::UInt64 => "UInt64",
            TypeCode::Single => "Single",
            TypeCode::Double => "Double",
            TypeCode::Decimal => "Decimal",
            TypeCode::DateTime => "DateTime",
            TypeCode::String => "String",
        }
    }

    pub fn is_comparable(&self) -> bool {
        !matches!(self, TypeCode::Empty | TypeCode::Object | TypeCode::DBNull)
    }

    fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            TypeCode::SByte => (i128::from(i8::MIN), i128::from(i8::MAX)),
            TypeCode::Byte => (0, i128::from(u8::MAX)),
            TypeCode::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            TypeCode::UInt16 => (0, i128::from(u16::MAX)),
            TypeCode::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            TypeCode::UInt32 => (0, i128::from(u32::MAX)),
            TypeCode::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            TypeCode::UInt64 => (0, i128::from(u64::MAX)),
            _ => return None,
        };
        Some(range)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown type code '{s}'"))
    }
}

/// A literal already converted to the representation of its type code
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Char(char),
    Int(i128),
    Float(f64),
    DateTime(NaiveDateTime),
    Str(String),
}

impl Literal {
    fn partial_cmp_same_kind(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => Some(a.cmp(b)),
            (Literal::Char(a), Literal::Char(b)) => Some(a.cmp(b)),
            (Literal::Int(a), Literal::Int(b)) => Some(a.cmp(b)),
            (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b),
            (Literal::DateTime(a), Literal::DateTime(b)) => Some(a.cmp(b)),
            (Literal::Str(a), Literal::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Comparison operand parsed once, when the assertion is built
#[derive(Debug, Clone, PartialEq)]
pub struct TypedLiteral {
    code: TypeCode,
    value: Literal,
}

impl TypedLiteral {
    pub fn parse(code: TypeCode, text: &str) -> Result<Self, EvaluationError> {
        if !code.is_comparable() {
            return Err(EvaluationError::NonComparableType(code));
        }
        let value = convert(code, &Value::from(text)).ok_or_else(|| {
            EvaluationError::InvalidLiteral {
                code,
                literal: text.to_string(),
            }
        })?;
        Ok(Self { code, value })
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }

    /// Order `actual` relative to this literal, or `None` if it cannot be
    /// converted to the literal's type.
    pub fn compare(&self, actual: &Value) -> Option<Ordering> {
        convert(self.code, actual)?.partial_cmp_same_kind(&self.value)
    }
}

/// Convert a runtime value to the representation of `code`.
fn convert(code: TypeCode, value: &Value) -> Option<Literal> {
    if let Some((min, max)) = code.integer_range() {
        let n = match value {
            Value::Int(i) => i128::from(*i),
            // Ties round to even, so 9.5 and 10.5 both become 10.
            Value::Float(f) if f.is_finite() => f.round_ties_even() as i128,
            Value::Bool(b) => i128::from(*b),
            Value::Str(s) => s.trim().parse::<i128>().ok()?,
            _ => return None,
        };
        return (min..=max).contains(&n).then_some(Literal::Int(n));
    }

    match code {
        TypeCode::Single | TypeCode::Double | TypeCode::Decimal => match value {
            Value::Int(i) => Some(Literal::Float(*i as f64)),
            Value::Float(f) => Some(Literal::Float(*f)),
            Value::Bool(b) => Some(Literal::Float(if *b { 1.0 } else { 0.0 })),
            Value::Str(s) => s.trim().parse::<f64>().ok().map(Literal::Float),
            _ => None,
        },
        TypeCode::Boolean => match value {
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Int(i) => Some(Literal::Bool(*i != 0)),
            Value::Float(f) => Some(Literal::Bool(*f != 0.0)),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Literal::Bool(true)),
                "false" => Some(Literal::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        TypeCode::Char => match value {
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Literal::Char(c)),
                    _ => None,
                }
            }
            Value::Int(i) => u32::try_from(*i)
                .ok()
                .and_then(char::from_u32)
                .map(Literal::Char),
            _ => None,
        },
        TypeCode::DateTime => match value {
            Value::DateTime(dt) => Some(Literal::DateTime(*dt)),
            Value::Str(s) => parse_datetime(s).map(Literal::DateTime),
            _ => None,
        },
        TypeCode::String => match value {
            Value::List(_) | Value::Object(_) | Value::Null => None,
            scalar => Some(Literal::Str(scalar.to_invariant_string())),
        },
        _ => None,
    }
}

/// Accepts ISO dates, date-times with `T` or space, and RFC 3339 stamps.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_names_are_case_insensitive() {
        assert_eq!("int32".parse::<TypeCode>(), Ok(TypeCode::Int32));
        assert_eq!(" DateTime ".parse::<TypeCode>(), Ok(TypeCode::DateTime));
        assert!("Int128".parse::<TypeCode>().is_err());
    }

    #[test]
    fn test_non_comparable_codes_are_rejected() {
        for code in [TypeCode::Empty, TypeCode::Object, TypeCode::DBNull] {
            assert_eq!(
                TypedLiteral::parse(code, "1"),
                Err(EvaluationError::NonComparableType(code))
            );
        }
    }

    #[test]
    fn test_literal_must_fit_its_type() {
        assert!(TypedLiteral::parse(TypeCode::Byte, "256").is_err());
        assert!(TypedLiteral::parse(TypeCode::Int32, "ten").is_err());
        assert!(TypedLiteral::parse(TypeCode::UInt64, "18446744073709551615").is_ok());
    }

    #[test]
    fn test_runtime_values_are_coerced_before_comparison() {
        let ten = TypedLiteral::parse(TypeCode::Int32, "10").unwrap();
        assert_eq!(ten.compare(&Value::Int(11)), Some(Ordering::Greater));
        assert_eq!(ten.compare(&Value::from(" 10 ")), Some(Ordering::Equal));
        assert_eq!(ten.compare(&Value::Float(9.0)), Some(Ordering::Less));
        assert_eq!(ten.compare(&Value::Int(i64::MAX)), None);
        assert_eq!(ten.compare(&Value::Null), None);
    }

    #[test]
    fn test_fractional_values_round_to_integer_codes() {
        let ten = TypedLiteral::parse(TypeCode::Int32, "10").unwrap();
        assert_eq!(ten.compare(&Value::Float(9.5)), Some(Ordering::Equal));
        assert_eq!(ten.compare(&Value::Float(10.5)), Some(Ordering::Equal));
        assert_eq!(ten.compare(&Value::Float(10.6)), Some(Ordering::Greater));
        assert_eq!(ten.compare(&Value::Float(9.4)), Some(Ordering::Less));

        let byte = TypedLiteral::parse(TypeCode::Byte, "255").unwrap();
        assert_eq!(byte.compare(&Value::Float(255.7)), None);
        assert_eq!(byte.compare(&Value::Float(f64::INFINITY)), None);
    }

    #[test]
    fn test_double_and_string_comparisons() {
        let half = TypedLiteral::parse(TypeCode::Double, "0.5").unwrap();
        assert_eq!(half.compare(&Value::Int(1)), Some(Ordering::Greater));
        assert_eq!(half.compare(&Value::Float(f64::NAN)), None);

        let text = TypedLiteral::parse(TypeCode::String, "404").unwrap();
        assert_eq!(text.compare(&Value::Int(404)), Some(Ordering::Equal));
    }

    #[test]
    fn test_datetime_literals() {
        let literal = TypedLiteral::parse(TypeCode::DateTime, "2024-05-01").unwrap();
        let later = parse_datetime("2024-05-01T08:00:00Z").unwrap();
        assert_eq!(literal.compare(&Value::DateTime(later)), Some(Ordering::Greater));
        assert_eq!(
            literal.compare(&Value::from("2024-04-30 23:59:59")),
            Some(Ordering::Less)
        );
    }
}
