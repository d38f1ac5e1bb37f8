//! Built-in rule vocabulary

use super::registry::{BoundArgs, BuilderRegistry, Param, ParamKind};
use super::error::ConfigurationError;
use crate::assertion::{Assertion, Comparator};

const BINDING: Param = Param::required("binding", ParamKind::ContextExpression);
const OPTIONAL_BINDING: Param = Param::optional("binding", ParamKind::ContextExpression);
const TYPE_CODE: Param = Param::required("type", ParamKind::TypeCode);
const VALUE: Param = Param::required("value", ParamKind::Text);
const TYPE_REF: Param = Param::required("type", ParamKind::TypeReference);

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry
        .register_node("assert_true", |_, _| Ok(Assertion::TRUE))
        .register_node("assert_false", |_, _| Ok(Assertion::FALSE))
        .register_node("assert_and", |factory, node| {
            Ok(Assertion::all(factory.create_children(node)?))
        })
        .register_node("assert_or", |factory, node| {
            Ok(Assertion::any(factory.create_children(node)?))
        })
        .register_node("assert_not", |factory, node| {
            Ok(Assertion::none_of(factory.create_children(node)?))
        })
        .register_params("assert_is_null", &[BINDING], |args| {
            Ok(Assertion::is_null(args.expression("binding")?))
        })
        .register_params("assert_is_not_null", &[BINDING], |args| {
            Ok(Assertion::not(Assertion::is_null(args.expression("binding")?)))
        })
        .register_params("assert_equal", &[BINDING, TYPE_CODE, VALUE], |args| {
            comparison(args, Comparator::Equal)
        })
        .register_params("assert_not_equal", &[BINDING, TYPE_CODE, VALUE], |args| {
            Ok(Assertion::not(comparison(args, Comparator::Equal)?))
        })
        .register_params("assert_lesser", &[BINDING, TYPE_CODE, VALUE], |args| {
            comparison(args, Comparator::Lesser)
        })
        .register_params(
            "assert_lesser_or_equal",
            &[BINDING, TYPE_CODE, VALUE],
            |args| comparison(args, Comparator::LesserOrEqual),
        )
        .register_params("assert_greater", &[BINDING, TYPE_CODE, VALUE], |args| {
            comparison(args, Comparator::Greater)
        })
        .register_params(
            "assert_greater_or_equal",
            &[BINDING, TYPE_CODE, VALUE],
            |args| comparison(args, Comparator::GreaterOrEqual),
        )
        .register_params("assert_is_type", &[OPTIONAL_BINDING, TYPE_REF], |args| {
            type_check(args, false)
        })
        .register_params(
            "assert_is_type_compatible",
            &[OPTIONAL_BINDING, TYPE_REF],
            |args| type_check(args, true),
        )
        .register_params(
            "assert_regex",
            &[
                BINDING,
                Param::optional("pattern", ParamKind::Text),
                Param::optional("caseSensitive", ParamKind::Bool),
            ],
            |args| {
                let binding = args.expression("binding")?;
                let pattern = args.text("pattern")?;
                let case_sensitive = args.flag("caseSensitive")?;
                Ok(Assertion::regex(binding, &pattern, case_sensitive)?)
            },
        );
}

fn comparison(args: &mut BoundArgs, comparator: Comparator) -> Result<Assertion, ConfigurationError> {
    let binding = args.expression("binding")?;
    let code = args.type_code("type")?;
    let value = args.text("value")?;
    Ok(Assertion::comparison(binding, comparator, code, &value)?)
}

fn type_check(args: &mut BoundArgs, by_compatibility: bool) -> Result<Assertion, ConfigurationError> {
    let binding = args.optional_expression("binding")?;
    let expected = args.type_ref("type")?;
    Ok(Assertion::type_check(binding, expected, by_compatibility))
}
