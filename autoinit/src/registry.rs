use autoinit_value::Map;

use crate::{ATTRIBUTE, AttributeKind, InitError, ManagedAttribute, Record, RecordType};

/// Finds the managed attributes visible on a type or an instance.
///
/// Exactly one of [`Discover::of_type`] and [`Discover::of_instance`] must be
/// given. Without [`Discover::kind`] / [`Discover::kinds`] every attribute
/// matches.
///
/// ```
/// use autoinit::{ATTRIBUTE, AttributeKind, Discover, ManagedAttribute, RecordType};
///
/// static PARAMS: AttributeKind = AttributeKind::new("Params", &ATTRIBUTE);
///
/// let ty = RecordType::builder("Node")
///     .attribute("lr", ManagedAttribute::of_kind(&PARAMS).build()?)
///     .attribute("result", ManagedAttribute::with_default(0))
///     .build()?;
///
/// let params = Discover::new().kind(&PARAMS).of_type(&ty).run()?;
/// assert_eq!(params.len(), 1);
/// assert_eq!(params[0].name(), "lr");
/// # Ok::<(), autoinit::InitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Discover<'a> {
    kinds: Vec<&'a AttributeKind>,
    ty: Option<&'a RecordType>,
    instance: Option<&'a Record>,
}

impl<'a> Discover<'a> {
    /// A query matching every attribute kind, with no target yet.
    pub fn new() -> Self {
        Self {
            kinds: vec![&ATTRIBUTE],
            ty: None,
            instance: None,
        }
    }

    /// Only match attributes of `kind` (or kinds derived from it).
    pub fn kind(mut self, kind: &'a AttributeKind) -> Self {
        self.kinds = vec![kind];
        self
    }

    /// Only match attributes of any of `kinds`.
    pub fn kinds(mut self, kinds: &[&'a AttributeKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    /// Search the members of `ty`.
    pub fn of_type(mut self, ty: &'a RecordType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Search the members of `record`'s type.
    pub fn of_instance(mut self, record: &'a Record) -> Self {
        self.instance = Some(record);
        self
    }

    /// Run the query. Attributes come back in declaration order, ancestors first.
    pub fn run(self) -> Result<Vec<&'a ManagedAttribute>, InitError> {
        let ty: &'a RecordType = match (self.ty, self.instance) {
            (Some(ty), None) => ty,
            (None, Some(record)) => record.record_type().as_ref(),
            (None, None) => {
                return Err(InitError::configuration(
                    "attribute discovery needs either a type or an instance",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(InitError::configuration(
                    "attribute discovery takes a type or an instance, not both",
                ));
            }
        };

        let mut found = Vec::new();
        for (name, member) in ty.members() {
            let attribute = member.class_get().ok_or_else(|| InitError::Protocol {
                type_name: ty.name().to_owned(),
                member: name.clone(),
            })?;
            if attribute.kind().is_any(&self.kinds) {
                found.push(attribute);
            }
        }
        Ok(found)
    }
}

impl Default for Discover<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// The `{name: value}` map of every attribute of `kind` on `record`, read
/// through each member's descriptor.
pub fn get_dict(kind: &AttributeKind, record: &Record) -> Result<Map, InitError> {
    Discover::new()
        .kind(kind)
        .of_instance(record)
        .run()?
        .into_iter()
        .map(|attribute| {
            let name = attribute.name();
            Ok((name.to_owned(), record.get(name)?))
        })
        .collect()
}

impl AttributeKind {
    /// The `{name: value}` map of every attribute of this kind on `record`.
    pub fn get_dict(&self, record: &Record) -> Result<Map, InitError> {
        get_dict(self, record)
    }
}
