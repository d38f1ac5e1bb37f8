use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability interface for anything a path expression can walk into.
///
/// Implementors expose named members and, optionally, an indexer. Returning
/// `None` means the member does not exist; a present-but-empty member is
/// `Some(Value::Null)`.
pub trait Navigable: fmt::Debug + Send + Sync {
    /// Runtime type name used by type assertions (e.g. "HttpException").
    fn type_name(&self) -> &str;

    /// Every other type name this object is assignable to, base types and
    /// interfaces alike.
    fn ancestry(&self) -> Vec<&str> {
        Vec::new()
    }

    fn get_named(&self, name: &str) -> Option<Value>;

    fn get_indexed(&self, _index: &Index) -> Option<Value> {
        None
    }

    /// Invariant string form used when a regex is applied to the object.
    fn display(&self) -> String {
        self.type_name().to_string()
    }
}

/// Index literal used by `[..]` and `(..)` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    Int(i64),
    Str(String),
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::Int(i) => write!(f, "{i}"),
            Index::Str(s) => write!(f, "'{s}'"),
        }
    }
}

/// A value read out of an evaluation context.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(NaiveDateTime),
    List(Arc<[Value]>),
    Object(Arc<dyn Navigable>),
}

impl Value {
    pub fn object(obj: impl Navigable + 'static) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name reported to type assertions and binding errors.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Int64",
            Value::Float(_) => "Double",
            Value::Str(_) => "String",
            Value::DateTime(_) => "DateTime",
            Value::List(_) => "Array",
            Value::Object(obj) => obj.type_name(),
        }
    }

    pub fn ancestry(&self) -> Vec<&str> {
        match self {
            Value::Object(obj) => obj.ancestry(),
            Value::List(_) => vec!["IEnumerable", "Object"],
            Value::Str(_) => vec!["IComparable", "IEnumerable", "Object"],
            Value::Null => Vec::new(),
            _ => vec!["IComparable", "ValueType", "Object"],
        }
    }

    /// Culture-invariant rendering.
    pub fn to_invariant_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_invariant_string)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(obj) => obj.display(),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::new("Object");
                for (key, value) in map {
                    record = record.with(key, Value::from_json(value));
                }
                Value::object(record)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Generic object with a fixed set of named members.
///
/// Used for JSON snapshots and in tests as a stand-in for arbitrary
/// context shapes. Members are also reachable through a string indexer.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: String,
    ancestry: Vec<String>,
    members: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ancestry: Vec::new(),
            members: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.ancestry.push(base.into());
        self
    }
}

impl Navigable for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn ancestry(&self) -> Vec<&str> {
        self.ancestry.iter().map(String::as_str).collect()
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        self.members.get(name).cloned()
    }

    fn get_indexed(&self, index: &Index) -> Option<Value> {
        match index {
            Index::Str(key) => self.members.get(key).cloned(),
            Index::Int(_) => None,
        }
    }
}
