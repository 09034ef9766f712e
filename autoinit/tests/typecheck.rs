#![cfg(feature = "typecheck")]

use std::sync::Arc;

use autoinit::{
    InitError, ManagedAttribute, RecordType, TypeCheckError, TypeExpr, TypeValidator, Value, args,
};
use autoinit_testhelpers::{IPanic, test};

fn checked() -> ManagedAttribute {
    ManagedAttribute::builder().check_types(true).build().unwrap()
}

#[test]
fn annotated_fields_are_checked() -> Result<(), IPanic> {
    let ty = RecordType::builder("Typed")
        .attribute("parameter", checked())
        .attribute("ratio", checked())
        .attribute("flags", checked())
        .annotate("parameter", TypeExpr::Int)
        .annotate("ratio", TypeExpr::Float)
        .annotate("flags", TypeExpr::list(TypeExpr::Bool))
        .build()?;

    let record = ty.create(args![parameter = 1, ratio = 2, flags = vec![true, false]])?;
    assert_eq!(record.get("ratio")?, 2);

    let err = ty
        .create(args![parameter = "one", ratio = 1.5, flags = Vec::<bool>::new()])
        .unwrap_err();
    insta::assert_snapshot!(err, @"type of parameter must be int; got str instead");
    match err {
        InitError::TypeMismatch(TypeCheckError { name, expected, .. }) => {
            assert_eq!(name, "parameter");
            assert_eq!(expected, TypeExpr::Int);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = ty
        .create(args![parameter = 1, ratio = 1.5, flags = vec![Value::from(1)]])
        .unwrap_err();
    insta::assert_snapshot!(err, @"type of flags must be list[bool]; got list instead");
    Ok(())
}

#[test]
fn failed_check_leaves_value_untouched() -> Result<(), IPanic> {
    let ty = RecordType::builder("Typed")
        .attribute("parameter", checked())
        .annotate("parameter", TypeExpr::optional(TypeExpr::Int))
        .build()?;
    let mut record = ty.create(args![parameter = Value::None])?;
    record.set("parameter", 3)?;
    assert!(record.set("parameter", "3").is_err());
    assert_eq!(record.get("parameter")?, 3);
    Ok(())
}

#[test]
fn unchecked_fields_ignore_annotations() -> Result<(), IPanic> {
    let ty = RecordType::builder("Loose")
        .attribute("parameter", ManagedAttribute::new())
        .annotate("parameter", TypeExpr::Int)
        .build()?;
    let record = ty.create(args![parameter = "not an int"])?;
    assert_eq!(record.get("parameter")?, "not an int");
    Ok(())
}

#[test]
fn missing_annotation_is_a_configuration_error() -> Result<(), IPanic> {
    let ty = RecordType::builder("Unannotated")
        .attribute("parameter", checked())
        .build()?;
    let err = ty.create(args![parameter = 1]).unwrap_err();
    assert!(matches!(err, InitError::Configuration { .. }));
    insta::assert_snapshot!(err, @"Could not find 'annotation' for 'parameter' in 'Unannotated' with 'check_types' enabled");

    let attribute = ty.member("parameter").unwrap().attribute();
    assert!(attribute.annotation().is_err());
    Ok(())
}

#[test]
fn on_set_runs_before_the_check() -> Result<(), IPanic> {
    let ty = RecordType::builder("Coerced")
        .attribute(
            "count",
            ManagedAttribute::builder()
                .check_types(true)
                .on_set(|value| match value.as_str().and_then(|s| s.parse::<i64>().ok()) {
                    Some(n) => Value::from(n),
                    None => value,
                })
                .build()?,
        )
        .annotate("count", TypeExpr::Int)
        .build()?;

    let record = ty.create(args![count = "12"])?;
    assert_eq!(record.get("count")?, 12);
    assert!(ty.create(args![count = "twelve"]).is_err());
    Ok(())
}

#[test]
fn custom_validator_replaces_builtin() -> Result<(), IPanic> {
    let positive: Arc<dyn TypeValidator> = Arc::new(
        |name: &str, value: &Value, expected: &TypeExpr| -> Result<(), TypeCheckError> {
            match value.as_int() {
                Some(n) if n > 0 => Ok(()),
                _ => Err(TypeCheckError::new(name, value, expected)),
            }
        },
    );
    let ty = RecordType::builder("Positive")
        .attribute(
            "n",
            ManagedAttribute::builder()
                .check_types(true)
                .validator(positive)
                .build()?,
        )
        .annotate("n", TypeExpr::Int)
        .build()?;

    assert_eq!(ty.create(args![n = 3])?.get("n")?, 3);
    assert!(matches!(
        ty.create(args![n = -3]).unwrap_err(),
        InitError::TypeMismatch(_)
    ));
    Ok(())
}

#[test]
fn annotation_is_resolved_once() -> Result<(), IPanic> {
    let ty = RecordType::builder("Cached")
        .attribute("x", checked())
        .annotate("x", TypeExpr::Str)
        .build()?;
    let attribute = ty.member("x").unwrap().attribute();
    let first = attribute.annotation()?.map(|a| a as *const TypeExpr);
    let second = attribute.annotation()?.map(|a| a as *const TypeExpr);
    assert_eq!(first, second);
    assert_eq!(attribute.annotation()?, Some(&TypeExpr::Str));
    Ok(())
}
