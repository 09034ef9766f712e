use crate::{Discover, Record};

const READ_ERROR: &str = "<error>";

/// Render `record` as `Type(field=value, ...)`, or as an identity repr when
/// the type opts out. Never fails.
pub(crate) fn render(record: &Record) -> String {
    let ty = record.record_type();
    if !ty.config().use_repr() {
        return identity(record);
    }
    let Ok(attributes) = Discover::new()
        .kinds(ty.config().init_kinds())
        .of_instance(record)
        .run()
    else {
        return identity(record);
    };

    let fields: Vec<String> = attributes
        .into_iter()
        .filter(|attribute| attribute.use_in_repr())
        .map(|attribute| {
            let value = match record.get(attribute.name()) {
                Ok(value) => attribute.repr_value(&value),
                Err(_) => READ_ERROR.to_owned(),
            };
            format!("{}={value}", attribute.name())
        })
        .collect();
    format!("{}({})", ty.name(), fields.join(", "))
}

fn identity(record: &Record) -> String {
    format!("<{} object at {:#x}>", record.type_name(), record.id())
}

#[cfg(test)]
mod tests {
    use crate::{ManagedAttribute, RecordType, args};

    #[test]
    fn lists_fields_in_order() {
        let ty = RecordType::builder("ClsDefaultMixed")
            .attribute("param1", ManagedAttribute::new())
            .attribute("param2", ManagedAttribute::with_default("World"))
            .build()
            .unwrap();
        let record = ty.create(args![param1 = "Hello"]).unwrap();
        insta::assert_snapshot!(record.repr(), @"ClsDefaultMixed(param1='Hello', param2='World')");
    }

    #[test]
    fn unreadable_field_renders_placeholder() {
        let ty = RecordType::builder("Half")
            .attribute("param1", ManagedAttribute::new())
            .attribute("param2", ManagedAttribute::new())
            .build()
            .unwrap();
        let mut record = ty.allocate();
        record.set("param1", 1).unwrap();
        insta::assert_snapshot!(record.repr(), @"Half(param1=1, param2=<error>)");
    }

    #[test]
    fn identity_repr_when_disabled() {
        let ty = RecordType::builder("Opaque")
            .use_repr(false)
            .attribute("secret", ManagedAttribute::with_default(1))
            .build()
            .unwrap();
        let record = ty.create(args![]).unwrap();
        let repr = record.repr();
        assert!(repr.starts_with("<Opaque object at 0x"), "{repr}");
        assert!(repr.ends_with('>'));
        assert_eq!(repr, format!("{record}"));
    }
}
