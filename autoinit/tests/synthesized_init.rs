use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use autoinit::{
    ATTRIBUTE, AttributeKind, Descriptor, InitError, ManagedAttribute, Record, RecordType, Value,
    args,
};
use autoinit_testhelpers::{IPanic, test};

static PARAMS: AttributeKind = AttributeKind::new("Params", &ATTRIBUTE);
static OUTS: AttributeKind = AttributeKind::new("Outs", &ATTRIBUTE);

fn params() -> ManagedAttribute {
    ManagedAttribute::of_kind(&PARAMS).build().unwrap()
}

#[test]
fn plain_type_accepts_nothing() {
    let plain = RecordType::builder("ParentClsPlain").build().unwrap();
    plain.create(args![]).unwrap();

    let err = plain.create(args![parameter = 10]).unwrap_err();
    insta::assert_snapshot!(err, @"ParentClsPlain.__init__() got an unexpected keyword argument 'parameter'");
}

#[test]
fn child_of_plain_type() -> Result<(), IPanic> {
    let parent = RecordType::builder("ParentClsPlain").build()?;
    let child = RecordType::builder("ChildPlainCls")
        .extends(&parent)
        .attribute("parameter", params())
        .build()?;

    let err = child.create(args![]).unwrap_err();
    insta::assert_snapshot!(err, @"ChildPlainCls.__init__() missing 1 required keyword-only argument: 'parameter'");

    let err = child.create(args![10]).unwrap_err();
    insta::assert_snapshot!(err, @"ChildPlainCls.__init__() takes 1 positional argument but 2 were given");

    let err = child.create(args![q = 10]).unwrap_err();
    assert!(err.to_string().ends_with("__init__() got an unexpected keyword argument 'q'"));

    let err = child.create(args![parameter = 10, q = 10]).unwrap_err();
    assert!(matches!(err, InitError::UnexpectedField { ref field, .. } if field == "q"));

    let record = child.create(args![parameter = 10])?;
    assert_eq!(record.get("parameter")?, 10);
    Ok(())
}

#[test]
fn inherited_fields_are_synthesized_again() -> Result<(), IPanic> {
    let parent = RecordType::builder("ParentCls")
        .attribute("parameter", params())
        .build()?;
    let child = RecordType::builder("ChildCls").extends(&parent).build()?;

    let err = parent.create(args![]).unwrap_err();
    insta::assert_snapshot!(err, @"ParentCls.__init__() missing 1 required keyword-only argument: 'parameter'");
    let err = child.create(args![]).unwrap_err();
    insta::assert_snapshot!(err, @"ChildCls.__init__() missing 1 required keyword-only argument: 'parameter'");

    assert_eq!(child.create(args![parameter = 10])?.get("parameter")?, 10);
    assert!(child.synthesis().is_some());
    Ok(())
}

#[test]
fn missing_fields_are_named_in_order() -> Result<(), IPanic> {
    let ty = RecordType::builder("ABC")
        .attribute("a", ManagedAttribute::new())
        .attribute("b", ManagedAttribute::new())
        .attribute("c", ManagedAttribute::new())
        .build()?;

    let err = ty.create(args![b = 1]).unwrap_err();
    insta::assert_snapshot!(err, @"ABC.__init__() missing 2 required keyword-only arguments: 'a' and 'c'");

    match ty.create(args![]).unwrap_err() {
        InitError::MissingField { fields, .. } => assert_eq!(fields, ["a", "b", "c"]),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn defaults_fill_in() -> Result<(), IPanic> {
    let ty = RecordType::builder("SingleClsDefaults")
        .attribute("param1", ManagedAttribute::new())
        .attribute("param2", ManagedAttribute::with_default("World"))
        .build()?;

    let record = ty.create(args![param1 = "Hello"])?;
    assert_eq!(record.get("param1")?, "Hello");
    assert_eq!(record.get("param2")?, "World");
    // the default is written onto the record, not just read through
    assert_eq!(record.raw("param2"), Some(&Value::from("World")));

    let record = ty.create(args![param1 = "Lorem", param2 = "Ipsum"])?;
    assert_eq!(record.get("param2")?, "Ipsum");
    Ok(())
}

#[test]
fn none_default_is_optional() -> Result<(), IPanic> {
    let ty = RecordType::builder("DefaultIsNone")
        .attribute("parameter", ManagedAttribute::with_default(Value::None))
        .build()?;

    assert!(ty.create(args![])?.get("parameter")?.is_none());
    assert_eq!(ty.create(args![parameter = 42])?.get("parameter")?, 42);
    Ok(())
}

#[test]
fn only_configured_kinds_are_constructor_arguments() -> Result<(), IPanic> {
    let ty = RecordType::builder("OnlyParamsInInit")
        .init_kinds(&[&PARAMS])
        .attribute("parameter", params())
        .attribute("output", ManagedAttribute::of_kind(&OUTS).build()?)
        .build()?;

    let record = ty.create(args![parameter = 10])?;
    assert_eq!(record.get("parameter")?, 10);
    let err = record.get("output").unwrap_err();
    insta::assert_snapshot!(err, @"'OnlyParamsInInit.output' is not set");

    let err = ty.create(args![parameter = 10, output = 25]).unwrap_err();
    assert!(matches!(err, InitError::UnexpectedField { .. }));
    Ok(())
}

#[test]
fn positional_arguments_when_allowed() -> Result<(), IPanic> {
    let ty = RecordType::builder("AllowArgs")
        .allow_positional(true)
        .attribute("a", ManagedAttribute::new())
        .attribute("b", ManagedAttribute::new())
        .attribute("c", ManagedAttribute::with_default(42))
        .build()?;

    let get = |record: &Record| -> Result<Vec<Value>, InitError> {
        Ok(vec![record.get("a")?, record.get("b")?, record.get("c")?])
    };

    let record = ty.create(args![1, 2, 3])?;
    assert_eq!(get(&record)?, [Value::from(1), Value::from(2), Value::from(3)]);
    let record = ty.create(args![1, 2])?;
    assert_eq!(get(&record)?, [Value::from(1), Value::from(2), Value::from(42)]);
    let record = ty.create(args![1, 2; c = 3])?;
    assert_eq!(get(&record)?, [Value::from(1), Value::from(2), Value::from(3)]);
    let record = ty.create(args![a = 1, b = 2, c = 3])?;
    assert_eq!(get(&record)?, [Value::from(1), Value::from(2), Value::from(3)]);

    let err = ty.create(args![1]).unwrap_err();
    insta::assert_snapshot!(err, @"AllowArgs.__init__() missing 1 required keyword-only argument: 'b'");

    let err = ty.create(args![1, 2, 3, 4]).unwrap_err();
    insta::assert_snapshot!(err, @"AllowArgs.__init__() takes from 3 to 4 positional arguments but 5 were given");

    let err = ty.create(args![1, 2; a = 1]).unwrap_err();
    assert!(matches!(err, InitError::DuplicateArgument { ref field, .. } if field == "a"));
    insta::assert_snapshot!(err, @"AllowArgs.__init__() got multiple values for argument 'a'");
    Ok(())
}

#[test]
fn positional_flag_is_inherited() -> Result<(), IPanic> {
    let parent = RecordType::builder("Parent")
        .allow_positional(true)
        .attribute("a", ManagedAttribute::new())
        .build()?;
    let child = RecordType::builder("Child")
        .extends(&parent)
        .attribute("b", ManagedAttribute::new())
        .build()?;
    let strict = RecordType::builder("Strict")
        .extends(&parent)
        .allow_positional(false)
        .build()?;

    let record = child.create(args![1, 2])?;
    assert_eq!(record.get("b")?, 2);
    assert!(matches!(
        strict.create(args![1]).unwrap_err(),
        InitError::ArgumentCount { .. }
    ));
    Ok(())
}

/// Stamps every write with the next tick of a shared clock, ignoring the
/// value it was given.
struct Stamp {
    attribute: ManagedAttribute,
    clock: Arc<AtomicI64>,
}

impl Descriptor for Stamp {
    fn attribute(&self) -> &ManagedAttribute {
        &self.attribute
    }

    fn set(&self, record: &mut Record, _value: Value) -> Result<(), InitError> {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        self.attribute.write(record, Value::from(tick))
    }
}

#[test]
fn priority_fields_are_written_first() -> Result<(), IPanic> {
    let clock = Arc::new(AtomicI64::new(0));
    let stamp = || Stamp {
        attribute: ManagedAttribute::new(),
        clock: Arc::clone(&clock),
    };
    let ty = RecordType::builder("PriorityKwargs")
        .priority(["a", "c", "b"])
        .attribute("a", stamp())
        .attribute("b", stamp())
        .attribute("c", stamp())
        .attribute("d", stamp())
        .build()?;

    let record = ty.create(args![a = 1, b = 2, c = 3, d = 4])?;
    let tick = |name: &str| record.get(name).ok().and_then(|value| value.as_int());
    assert!(tick("a") < tick("c"));
    assert!(tick("c") < tick("b"));
    assert!(tick("b") < tick("d"));
    Ok(())
}

#[test]
fn post_init_runs_after_fields() -> Result<(), IPanic> {
    let ty = RecordType::builder("PostInit")
        .attribute("parameter", ManagedAttribute::new())
        .post_init(|record: &mut Record| -> Result<(), InitError> {
            let parameter = record.get("parameter")?;
            record.set("called", true)?;
            record.set("seen", parameter)
        })
        .build()?;
    let child = RecordType::builder("PostInitChild").extends(&ty).build()?;

    let record = ty.create(args![parameter = "Test"])?;
    assert_eq!(record.get("called")?, true);
    assert_eq!(record.get("seen")?, "Test");

    let record = child.create(args![parameter = "Test"])?;
    assert_eq!(record.get("called")?, true);
    Ok(())
}

#[test]
fn post_init_errors_propagate() {
    let ty = RecordType::builder("Failing")
        .post_init(|_: &mut Record| -> Result<(), InitError> {
            Err(InitError::custom("rejected"))
        })
        .build()
        .unwrap();
    assert_eq!(ty.create(args![]).unwrap_err(), InitError::custom("rejected"));
}

#[test]
fn create_matches_allocate_then_initialize() -> Result<(), IPanic> {
    let ty = RecordType::builder("Manual")
        .attribute("x", ManagedAttribute::with_default(1))
        .build()?;
    let mut record = ty.allocate();
    assert!(record.raw("x").is_none());
    ty.initialize(&mut record, args![x = 2])?;
    assert_eq!(record.get("x")?, 2);
    Ok(())
}
