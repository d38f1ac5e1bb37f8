//! Context shapes that filter rules can bind to
//!
//! Each shape implements [`Navigable`] explicitly, so path expressions such as
//! `Context.Request.ServerVariables['REMOTE_ADDR']` or
//! `BaseException.Message` resolve without any runtime reflection.

use crate::value::{Index, Navigable, Record, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Base types of the exception types the error hook commonly captures,
/// most derived first and not counting the `Exception` root.
const KNOWN_BASES: &[(&str, &[&str])] = &[
    ("HttpException", &["ExternalException", "SystemException"]),
    ("HttpUnhandledException", &["HttpException", "ExternalException", "SystemException"]),
    ("HttpRequestValidationException", &["HttpException", "ExternalException", "SystemException"]),
    ("ExternalException", &["SystemException"]),
    ("SqlException", &["DbException", "ExternalException", "SystemException"]),
    ("DbException", &["ExternalException", "SystemException"]),
    ("ArgumentNullException", &["ArgumentException", "SystemException"]),
    ("ArgumentOutOfRangeException", &["ArgumentException", "SystemException"]),
    ("ObjectDisposedException", &["InvalidOperationException", "SystemException"]),
    ("FileNotFoundException", &["IOException", "SystemException"]),
    ("DirectoryNotFoundException", &["IOException", "SystemException"]),
    ("ArgumentException", &["SystemException"]),
    ("InvalidOperationException", &["SystemException"]),
    ("NullReferenceException", &["SystemException"]),
    ("IndexOutOfRangeException", &["SystemException"]),
    ("InvalidCastException", &["SystemException"]),
    ("FormatException", &["SystemException"]),
    ("NotSupportedException", &["SystemException"]),
    ("NotImplementedException", &["SystemException"]),
    ("UnauthorizedAccessException", &["SystemException"]),
    ("ThreadAbortException", &["SystemException"]),
    ("TimeoutException", &["SystemException"]),
    ("IOException", &["SystemException"]),
];

/// Ancestry of an exception type, looked up by its unqualified name.
///
/// Unknown types derive directly from `Exception`.
pub fn ancestry_for(type_name: &str) -> Vec<String> {
    let short = type_name.rsplit('.').next().unwrap_or(type_name).trim();
    let bases = KNOWN_BASES
        .iter()
        .find(|(name, _)| *name == short)
        .map(|(_, bases)| *bases)
        .unwrap_or_default();
    bases
        .iter()
        .chain(&["Exception", "ISerializable", "Object"])
        .map(|name| name.to_string())
        .collect()
}

/// An exception captured by the error hook
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawCapturedError")]
pub struct CapturedError {
    pub type_name: String,
    /// Base types and interfaces, most derived first.
    pub ancestry: Vec<String>,
    pub message: String,
    pub source: String,
    pub stack_trace: String,
    pub http_status_code: Option<i64>,
    pub inner: Option<Box<CapturedError>>,
    pub data: NameValues,
}

/// Event JSON shape; a missing `ancestry` is derived from the type name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCapturedError {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    ancestry: Option<Vec<String>>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    stack_trace: String,
    #[serde(default)]
    http_status_code: Option<i64>,
    #[serde(default)]
    inner: Option<Box<CapturedError>>,
    #[serde(default)]
    data: NameValues,
}

impl From<RawCapturedError> for CapturedError {
    fn from(raw: RawCapturedError) -> Self {
        let ancestry = raw
            .ancestry
            .unwrap_or_else(|| ancestry_for(&raw.type_name));
        Self {
            type_name: raw.type_name,
            ancestry,
            message: raw.message,
            source: raw.source,
            stack_trace: raw.stack_trace,
            http_status_code: raw.http_status_code,
            inner: raw.inner,
            data: raw.data,
        }
    }
}

impl CapturedError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            ancestry: ancestry_for(&type_name),
            type_name,
            message: message.into(),
            source: String::new(),
            stack_trace: String::new(),
            http_status_code: None,
            inner: None,
            data: NameValues::default(),
        }
    }

    pub fn http(status_code: i64, message: impl Into<String>) -> Self {
        let mut error = Self::new("HttpException", message);
        error.http_status_code = Some(status_code);
        error
    }

    pub fn with_inner(mut self, inner: CapturedError) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// The innermost error of the chain.
    pub fn base_error(&self) -> &CapturedError {
        let mut current = self;
        while let Some(inner) = current.inner.as_deref() {
            current = inner;
        }
        current
    }

    /// Status code of the first HTTP error in the chain, or 0.
    pub fn http_status_code(&self) -> i64 {
        let mut current = Some(self);
        while let Some(error) = current {
            if let Some(code) = error.http_status_code {
                return code;
            }
            current = error.inner.as_deref();
        }
        0
    }
}

impl Navigable for CapturedError {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn ancestry(&self) -> Vec<&str> {
        self.ancestry.iter().map(String::as_str).collect()
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        let value = match name {
            "Message" => Value::from(self.message.as_str()),
            "Source" => Value::from(self.source.as_str()),
            "StackTrace" => Value::from(self.stack_trace.as_str()),
            "InnerException" => match &self.inner {
                Some(inner) => Value::object(inner.as_ref().clone()),
                None => Value::Null,
            },
            "Data" => Value::object(self.data.clone()),
            "HttpCode" if self.http_status_code.is_some() => {
                Value::from(self.http_status_code)
            }
            _ => return None,
        };
        Some(value)
    }

    fn display(&self) -> String {
        if self.message.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}: {}", self.type_name, self.message)
        }
    }
}

/// Ordered name/value collection with case-insensitive key lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct NameValues {
    entries: Vec<(String, String)>,
}

impl From<BTreeMap<String, String>> for NameValues {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl NameValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// All values stored under `name`, comma-joined.
    pub fn get(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .entries
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect();
        (!values.is_empty()).then(|| values.join(","))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Navigable for NameValues {
    fn type_name(&self) -> &str {
        "NameValueCollection"
    }

    fn ancestry(&self) -> Vec<&str> {
        vec!["IEnumerable", "Object"]
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        match name {
            "Count" => Some(Value::Int(self.entries.len() as i64)),
            "AllKeys" => Some(Value::List(
                self.entries
                    .iter()
                    .map(|(key, _)| Value::from(key.as_str()))
                    .collect(),
            )),
            _ => None,
        }
    }

    fn get_indexed(&self, index: &Index) -> Option<Value> {
        match index {
            Index::Str(key) => Some(Value::from(self.get(key))),
            Index::Int(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| self.entries.get(i))
                .map(|(_, value)| Value::from(value.as_str())),
        }
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Snapshot of the request that was being served when the error occurred
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestSnapshot {
    pub http_method: String,
    pub path: String,
    pub url: String,
    pub user_agent: String,
    pub user_host_address: String,
    pub is_local: bool,
    pub server_variables: NameValues,
    pub query_string: NameValues,
    pub form: NameValues,
    pub cookies: NameValues,
    pub headers: NameValues,
}

impl Navigable for RequestSnapshot {
    fn type_name(&self) -> &str {
        "HttpRequest"
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        let value = match name {
            "HttpMethod" => Value::from(self.http_method.as_str()),
            "Path" => Value::from(self.path.as_str()),
            "Url" | "RawUrl" => Value::from(self.url.as_str()),
            "UserAgent" => Value::from(self.user_agent.as_str()),
            "UserHostAddress" => Value::from(self.user_host_address.as_str()),
            "IsLocal" => Value::Bool(self.is_local),
            "ServerVariables" => Value::object(self.server_variables.clone()),
            "QueryString" => Value::object(self.query_string.clone()),
            "Form" => Value::object(self.form.clone()),
            "Cookies" => Value::object(self.cookies.clone()),
            "Headers" => Value::object(self.headers.clone()),
            _ => return None,
        };
        Some(value)
    }

    /// `Request['name']` searches query string, form, cookies, then server
    /// variables.
    fn get_indexed(&self, index: &Index) -> Option<Value> {
        let Index::Str(key) = index else {
            return None;
        };
        let found = [
            &self.query_string,
            &self.form,
            &self.cookies,
            &self.server_variables,
        ]
        .into_iter()
        .find_map(|collection| collection.get(key));
        Some(Value::from(found))
    }

    fn display(&self) -> String {
        format!("{} {}", self.http_method, self.url)
    }
}

/// Ambient request-like context accompanying a captured error
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestContext {
    pub request: RequestSnapshot,
    pub user: Option<String>,
    pub items: NameValues,
}

impl Navigable for RequestContext {
    fn type_name(&self) -> &str {
        "HttpContext"
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        let value = match name {
            "Request" => Value::object(self.request.clone()),
            "Items" => Value::object(self.items.clone()),
            "User" => match &self.user {
                Some(user) => {
                    let identity = Record::new("GenericIdentity")
                        .extends("IIdentity")
                        .with("Name", user.as_str())
                        .with("IsAuthenticated", !user.is_empty());
                    Value::object(
                        Record::new("GenericPrincipal")
                            .extends("IPrincipal")
                            .with("Identity", Value::object(identity)),
                    )
                }
                None => Value::Null,
            },
            _ => return None,
        };
        Some(value)
    }
}

/// The root every filter rule is evaluated against.
///
/// Exposes `Exception`, `BaseException`, `HttpStatusCode` (alias
/// `StatusCode`) and `Context`.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    exception: Arc<CapturedError>,
    context: Value,
}

impl ErrorContext {
    pub fn new(exception: Arc<CapturedError>, context: Value) -> Self {
        Self { exception, context }
    }

    pub fn exception(&self) -> &CapturedError {
        &self.exception
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl Navigable for ErrorContext {
    fn type_name(&self) -> &str {
        "ErrorFilterContext"
    }

    fn get_named(&self, name: &str) -> Option<Value> {
        let value = match name {
            "Exception" => Value::Object(self.exception.clone()),
            "BaseException" => Value::object(self.exception.base_error().clone()),
            "HttpStatusCode" | "StatusCode" => Value::Int(self.exception.http_status_code()),
            "Context" => self.context.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// An error event as read from disk: the exception plus optional request data
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorSnapshot {
    pub exception: CapturedError,
    #[serde(default)]
    pub context: Option<RequestContext>,
}

impl ErrorSnapshot {
    pub fn ambient(&self) -> Value {
        match &self.context {
            Some(context) => Value::object(context.clone()),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::eval;

    fn context() -> Value {
        let request = RequestSnapshot {
            http_method: "GET".into(),
            url: "/missing".into(),
            server_variables: NameValues::new().add("REMOTE_ADDR", "10.0.0.1"),
            form: NameValues::new().add("user", "alice").add("user", "bob"),
            ..Default::default()
        };
        let ambient = RequestContext {
            request,
            user: Some("carol".into()),
            items: NameValues::new(),
        };
        let error = CapturedError::http(404, "Not found")
            .with_inner(CapturedError::new("FileNotFoundException", "no file"));
        ErrorContext::new(Arc::new(error), Value::object(ambient)).into_value()
    }

    #[test]
    fn test_status_code_and_base_exception() {
        let ctx = context();
        assert!(matches!(eval(&ctx, "HttpStatusCode", true), Ok(Value::Int(404))));
        assert!(matches!(eval(&ctx, "StatusCode", true), Ok(Value::Int(404))));
        assert!(matches!(
            eval(&ctx, "BaseException.Message", true),
            Ok(Value::Str(s)) if s == "no file"
        ));
    }

    #[test]
    fn test_request_collections_are_indexable() {
        let ctx = context();
        assert!(matches!(
            eval(&ctx, "Context.Request.ServerVariables['remote_addr']", true),
            Ok(Value::Str(s)) if s == "10.0.0.1"
        ));
        assert!(matches!(
            eval(&ctx, "Context.Request.Form(\"user\")", true),
            Ok(Value::Str(s)) if s == "alice,bob"
        ));
        assert!(matches!(
            eval(&ctx, "Context.Request['user']", true),
            Ok(Value::Str(s)) if s == "alice,bob"
        ));
        assert!(matches!(
            eval(&ctx, "Context.Request.Form[1]", true),
            Ok(Value::Str(s)) if s == "bob"
        ));
        assert!(eval(&ctx, "Context.Request.Form['nope']", true).unwrap().is_null());
    }

    #[test]
    fn test_user_identity_is_reachable() {
        assert!(matches!(
            eval(&context(), "Context.User.Identity.Name", true),
            Ok(Value::Str(s)) if s == "carol"
        ));
    }

    #[test]
    fn test_non_http_errors_report_zero_status() {
        let error = CapturedError::new("InvalidOperationException", "boom");
        let ctx = ErrorContext::new(Arc::new(error), Value::Null).into_value();
        assert!(matches!(eval(&ctx, "HttpStatusCode", true), Ok(Value::Int(0))));
        assert!(eval(&ctx, "Context.Request", false).unwrap().is_null());
    }

    #[test]
    fn test_snapshot_deserializes_from_json() {
        let snapshot: ErrorSnapshot = serde_json::from_value(serde_json::json!({
            "exception": {"type": "HttpException", "message": "x", "httpStatusCode": 500},
            "context": {"request": {"path": "/a", "form": {"k": "v"}}}
        }))
        .unwrap();
        assert_eq!(snapshot.exception.http_status_code(), 500);
        assert_eq!(snapshot.exception.ancestry, CapturedError::http(500, "x").ancestry);
        assert!(!snapshot.ambient().is_null());
    }

    #[test]
    fn test_ancestry_follows_the_type_name() {
        let sql = ancestry_for("System.Data.SqlClient.SqlException");
        assert_eq!(&sql[..3], ["DbException", "ExternalException", "SystemException"]);
        assert_eq!(ancestry_for("Exception"), ["Exception", "ISerializable", "Object"]);
        assert_eq!(ancestry_for("MyApp.OrderRejected")[0], "Exception");

        let explicit: CapturedError = serde_json::from_value(serde_json::json!({
            "type": "HttpException",
            "ancestry": ["CustomBase", "Object"]
        }))
        .unwrap();
        assert_eq!(explicit.ancestry, ["CustomBase", "Object"]);
    }
}
