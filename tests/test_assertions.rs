use chrono::NaiveDate;
use error_sieve::types::TypeRef;
use error_sieve::{
    Assertion, CapturedError, Comparator, ContextExpression, ErrorContext, EvaluationError, Record,
    TypeCode, Value,
};
use std::sync::Arc;

fn path(text: &str) -> ContextExpression {
    ContextExpression::path(text).unwrap()
}

fn context_for(exception: CapturedError) -> Value {
    let ambient = Record::new("Job")
        .with("Attempts", 3)
        .with("Ratio", 0.75)
        .with(
            "StartedAt",
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
        )
        .with("Queue", "critical");
    ErrorContext::new(Arc::new(exception), Value::object(ambient)).into_value()
}

fn not_found() -> Value {
    context_for(CapturedError::http(404, "The file '/favicon.ico' does not exist."))
}

#[test]
fn test_every_comparator_against_status_code() {
    let ctx = not_found();
    let cases = [
        (Comparator::Equal, "404", true),
        (Comparator::Equal, "500", false),
        (Comparator::Lesser, "500", true),
        (Comparator::LesserOrEqual, "404", true),
        (Comparator::Greater, "400", true),
        (Comparator::GreaterOrEqual, "405", false),
    ];
    for (comparator, literal, expected) in cases {
        let assertion =
            Assertion::comparison(path("HttpStatusCode"), comparator, TypeCode::Int32, literal)
                .unwrap();
        assert_eq!(
            assertion.test(&ctx).unwrap(),
            expected,
            "{comparator:?} {literal}"
        );
    }
}

#[test]
fn test_comparisons_coerce_context_values() {
    let ctx = not_found();
    let ratio = Assertion::comparison(
        path("Context.Ratio"),
        Comparator::Lesser,
        TypeCode::Double,
        "1.5",
    )
    .unwrap();
    assert!(ratio.test(&ctx).unwrap());

    let started = Assertion::comparison(
        path("Context.StartedAt"),
        Comparator::Greater,
        TypeCode::DateTime,
        "2024-03-01 08:00:00",
    )
    .unwrap();
    assert!(started.test(&ctx).unwrap());

    let queue = Assertion::comparison(
        path("Context.Queue"),
        Comparator::Equal,
        TypeCode::String,
        "critical",
    )
    .unwrap();
    assert!(queue.test(&ctx).unwrap());
}

#[test]
fn test_missing_values_never_compare() {
    let ctx = not_found();
    for comparator in [Comparator::Equal, Comparator::Lesser, Comparator::Greater] {
        let assertion =
            Assertion::comparison(path("Context.Nothing"), comparator, TypeCode::Int32, "0")
                .unwrap();
        assert!(!assertion.test(&ctx).unwrap());
    }
}

#[test]
fn test_literals_are_validated_at_construction() {
    assert_eq!(
        Assertion::comparison(path("x"), Comparator::Equal, TypeCode::Object, "1").unwrap_err(),
        EvaluationError::NonComparableType(TypeCode::Object)
    );
    assert!(matches!(
        Assertion::comparison(path("x"), Comparator::Equal, TypeCode::Byte, "300"),
        Err(EvaluationError::InvalidLiteral { .. })
    ));
    assert!(matches!(
        Assertion::comparison(path("x"), Comparator::Equal, TypeCode::DateTime, "soon"),
        Err(EvaluationError::InvalidLiteral { .. })
    ));
}

#[test]
fn test_type_checks_exact_and_compatible() {
    let ctx = not_found();

    assert!(Assertion::type_check(None, TypeRef::class("HttpException"), false)
        .test(&ctx)
        .unwrap());
    assert!(!Assertion::type_check(None, TypeRef::class("ExternalException"), false)
        .test(&ctx)
        .unwrap());
    assert!(Assertion::type_check(None, TypeRef::class("ExternalException"), true)
        .test(&ctx)
        .unwrap());
    assert!(Assertion::type_check(None, TypeRef::interface("ISerializable"), false)
        .test(&ctx)
        .unwrap());
    assert!(Assertion::type_check(Some(path("Context")), TypeRef::class("Object"), true)
        .test(&ctx)
        .unwrap());
    assert!(!Assertion::type_check(Some(path("Context.Nothing")), TypeRef::class("Object"), true)
        .test(&ctx)
        .unwrap());
}

#[test]
fn test_regex_matching() {
    let ctx = not_found();
    let favicon = Assertion::regex(path("Exception.Message"), r"favicon\.ico", false).unwrap();
    assert!(favicon.test(&ctx).unwrap());

    let shouting = Assertion::regex(path("Exception.Message"), "FAVICON", true).unwrap();
    assert!(!shouting.test(&ctx).unwrap());
    let relaxed = Assertion::regex(path("Exception.Message"), "FAVICON", false).unwrap();
    assert!(relaxed.test(&ctx).unwrap());

    let status = Assertion::regex(path("HttpStatusCode"), "^4\\d\\d$", false).unwrap();
    assert!(status.test(&ctx).unwrap());

    assert!(Assertion::regex(path("x"), "(", false).is_err());
    assert!(!Assertion::regex(path("Exception.Message"), "", false)
        .unwrap()
        .test(&ctx)
        .unwrap());
}

#[test]
fn test_logical_combinations() {
    let ctx = not_found();
    let is_404 =
        Assertion::comparison(path("HttpStatusCode"), Comparator::Equal, TypeCode::Int32, "404")
            .unwrap();
    let is_local = Assertion::comparison(
        path("Context.Queue"),
        Comparator::Equal,
        TypeCode::String,
        "local",
    )
    .unwrap();

    assert!(Assertion::any(vec![is_local.clone(), is_404.clone()]).test(&ctx).unwrap());
    assert!(!Assertion::all(vec![is_local.clone(), is_404.clone()]).test(&ctx).unwrap());
    assert!(Assertion::none_of(vec![is_local.clone()]).test(&ctx).unwrap());
    assert!(!Assertion::none_of(vec![is_local, is_404]).test(&ctx).unwrap());

    for empty in [
        Assertion::all(Vec::new()),
        Assertion::any(Vec::new()),
        Assertion::none_of(Vec::new()),
    ] {
        assert!(!empty.test(&ctx).unwrap());
    }
}

#[test]
fn test_short_circuit_skips_failing_children() {
    let ctx = not_found();
    let explodes = Assertion::is_null(ContextExpression::delegate(|_| {
        Err(EvaluationError::Expression("should not run".into()))
    }));

    assert!(Assertion::any(vec![Assertion::TRUE, explodes.clone()]).test(&ctx).unwrap());
    assert!(!Assertion::all(vec![Assertion::FALSE, explodes.clone()]).test(&ctx).unwrap());
    assert!(Assertion::all(vec![Assertion::TRUE, explodes]).test(&ctx).is_err());
}

#[test]
fn test_null_context_is_rejected() {
    assert_eq!(
        Assertion::TRUE.test(&Value::Null).unwrap_err(),
        EvaluationError::NullContext
    );
}

#[test]
fn test_delegate_expressions() {
    let ctx = not_found();
    let queue_len = ContextExpression::delegate(|ctx| {
        let queue = error_sieve::path::eval(ctx, "Context.Queue", false)
            .map_err(|e| EvaluationError::Expression(e.to_string()))?;
        Ok(Value::Int(queue.to_invariant_string().len() as i64))
    });
    let assertion =
        Assertion::comparison(queue_len, Comparator::Equal, TypeCode::Int64, "8").unwrap();
    assert!(assertion.test(&ctx).unwrap());
}
