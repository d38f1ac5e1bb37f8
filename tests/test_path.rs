use error_sieve::path::{BindingError, PathError, PathExpression, compile, eval};
use error_sieve::{CapturedError, ErrorContext, NameValues, Record, RequestContext, Value};
use error_sieve::context::RequestSnapshot;
use std::sync::Arc;

fn error_context() -> Value {
    let request = RequestSnapshot {
        http_method: "POST".into(),
        url: "/orders/42".into(),
        server_variables: NameValues::new()
            .add("REMOTE_ADDR", "192.168.1.20")
            .add("HTTP_HOST", "shop.local"),
        query_string: NameValues::new().add("id", "42"),
        ..Default::default()
    };
    let ambient = RequestContext {
        request,
        user: Some("alice".into()),
        ..Default::default()
    };
    let exception = CapturedError::new("InvalidOperationException", "wrapper")
        .with_inner(CapturedError::http(404, "File does not exist."));
    ErrorContext::new(Arc::new(exception), Value::object(ambient)).into_value()
}

fn as_str(value: Value) -> String {
    match value {
        Value::Str(s) => s,
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_request_collections_are_indexable() {
    let root = error_context();
    assert_eq!(
        as_str(eval(&root, "Context.Request.ServerVariables['REMOTE_ADDR']", true).unwrap()),
        "192.168.1.20"
    );
    assert_eq!(
        as_str(eval(&root, "Context.Request.ServerVariables(\"http_host\")", true).unwrap()),
        "shop.local"
    );
    assert_eq!(as_str(eval(&root, "Context.Request['id']", true).unwrap()), "42");
}

#[test]
fn test_exception_chain_members() {
    let root = error_context();
    assert_eq!(
        as_str(eval(&root, "BaseException.Message", true).unwrap()),
        "File does not exist."
    );
    assert_eq!(
        as_str(eval(&root, "Exception.InnerException.Message", true).unwrap()),
        "File does not exist."
    );
    assert!(matches!(
        eval(&root, "HttpStatusCode", true).unwrap(),
        Value::Int(404)
    ));
    assert!(matches!(
        eval(&root, "Exception.Message.Length", true).unwrap(),
        Value::Int(7)
    ));
}

#[test]
fn test_principal_identity_is_reachable() {
    let root = error_context();
    assert_eq!(
        as_str(eval(&root, "Context.User.Identity.Name", true).unwrap()),
        "alice"
    );
    assert!(matches!(
        eval(&root, "Context.User.Identity.IsAuthenticated", true).unwrap(),
        Value::Bool(true)
    ));
}

#[test]
fn test_strict_and_lenient_missing_members() {
    let root = error_context();

    let err = eval(&root, "Exception.Nope", true).unwrap_err();
    assert!(matches!(
        err,
        PathError::Binding(BindingError::MissingMember { ref member, .. }) if member == "Nope"
    ));
    assert!(eval(&root, "Exception.Nope", false).unwrap().is_null());

    // Lenient lookups keep yielding null once a step produced null.
    assert!(eval(&root, "Exception.InnerException.InnerException.Message", false)
        .unwrap()
        .is_null());
    assert!(matches!(
        eval(&root, "Exception.InnerException.InnerException.Message", true),
        Err(PathError::Binding(BindingError::NullReference { .. }))
    ));
}

#[test]
fn test_malformed_expressions_are_format_errors() {
    for text in ["a..b", "a[", "a['x]", "a[1 2]", "a b", "a.1", "a[]"] {
        assert!(
            matches!(eval(&Value::Null, text, false), Err(PathError::Format(_))),
            "expected format error for {text:?}"
        );
        assert!(PathExpression::parse(text, true).is_err());
    }
}

#[test]
fn test_compiled_path_is_reusable_across_roots() {
    let get_name = compile("Customer.Name", true).unwrap();
    let first = Value::object(
        Record::new("Order").with("Customer", Value::object(Record::new("Customer").with("Name", "Ann"))),
    );
    let second = Value::object(
        Record::new("Order").with("Customer", Value::object(Record::new("Customer").with("Name", "Bo"))),
    );

    assert_eq!(as_str(get_name(&first).unwrap()), "Ann");
    assert_eq!(as_str(get_name(&second).unwrap()), "Bo");
}

#[test]
fn test_list_indexing_and_counts() {
    let root = Value::object(Record::new("Batch").with(
        "Items",
        Value::List(vec![Value::from("a"), Value::from("b")].into()),
    ));
    assert_eq!(as_str(eval(&root, "Items[1]", true).unwrap()), "b");
    assert!(matches!(eval(&root, "Items.Count", true).unwrap(), Value::Int(2)));
    assert!(eval(&root, "Items[5]", false).unwrap().is_null());
    assert!(matches!(
        eval(&root, "Items[5]", true),
        Err(PathError::Binding(BindingError::MissingIndexer { .. }))
    ));
}
