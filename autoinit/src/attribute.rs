//! Managed attributes: per-field get/set contracts with defaults, freezing,
//! type checking and write hooks.

use alloc::sync::Arc;
use core::fmt;
use std::sync::OnceLock;

use autoinit_value::{Map, TypeExpr, TypeValidator, Value, default_validator};
use indexmap::IndexMap;

use crate::{ATTRIBUTE, AttributeKind, InitError, Record, trace};

/// Renders a field value for [`Record::repr`].
pub type ReprFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Transforms an incoming value before it is stored.
pub type OnSetFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Declared field annotations of a record type.
pub type Annotations = IndexMap<String, TypeExpr>;

/// Process-unique identity of a declared record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(pub(crate) u64);

/// The type an attribute was declared on.
#[derive(Clone)]
pub struct Owner {
    pub(crate) key: TypeKey,
    pub(crate) name: Arc<str>,
    pub(crate) annotations: Arc<Annotations>,
}

impl Owner {
    /// Identity of the declaring type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Name of the declaring type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations declared directly on the owning type.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}

/// The descriptor protocol: how a member declared on a record type is read
/// and written.
///
/// [`ManagedAttribute`] implements it directly. Custom attributes wrap a
/// `ManagedAttribute` and override `get` / `set`; `class_get` must keep
/// returning the backing attribute, or discovery fails with
/// [`InitError::Protocol`].
pub trait Descriptor: Send + Sync {
    /// The attribute backing this descriptor.
    fn attribute(&self) -> &ManagedAttribute;

    /// Class-level access, without an instance. Returns the descriptor's
    /// attribute so the registry can inspect it.
    fn class_get(&self) -> Option<&ManagedAttribute> {
        Some(self.attribute())
    }

    /// Read the field from `record`.
    fn get(&self, record: &Record) -> Result<Value, InitError> {
        self.attribute().read(record)
    }

    /// Write the field on `record`.
    fn set(&self, record: &mut Record, value: Value) -> Result<(), InitError> {
        self.attribute().write(record, value)
    }
}

/// A field whose reads and writes are governed by a shared descriptor.
///
/// `name` and `owner` are bound once, when the attribute is declared on a
/// [`RecordType`](crate::RecordType). The same attribute can not be declared
/// under two names or on two types.
pub struct ManagedAttribute {
    kind: &'static AttributeKind,
    binding: OnceLock<(String, Owner)>,
    default: Option<Value>,
    use_in_repr: bool,
    repr_fn: Option<ReprFn>,
    check_types: bool,
    validator: Option<Arc<dyn TypeValidator>>,
    annotation: OnceLock<Option<TypeExpr>>,
    frozen: bool,
    metadata: Map,
    on_set: Option<OnSetFn>,
}

impl ManagedAttribute {
    /// A required attribute of the root kind with no options.
    pub fn new() -> Self {
        Self::from_builder(AttributeBuilder::new(&ATTRIBUTE))
    }

    /// An attribute of the root kind with a default value.
    pub fn with_default(default: impl Into<Value>) -> Self {
        Self::from_builder(AttributeBuilder::new(&ATTRIBUTE).default(default))
    }

    /// Start declaring an attribute of the root kind.
    pub fn builder() -> AttributeBuilder {
        AttributeBuilder::new(&ATTRIBUTE)
    }

    /// Start declaring an attribute of a custom kind.
    pub fn of_kind(kind: &'static AttributeKind) -> AttributeBuilder {
        AttributeBuilder::new(kind)
    }

    fn from_builder(builder: AttributeBuilder) -> Self {
        Self {
            kind: builder.kind,
            binding: OnceLock::new(),
            default: builder.default,
            use_in_repr: builder.use_in_repr,
            repr_fn: builder.repr_fn,
            check_types: builder.check_types,
            validator: builder.validator,
            annotation: OnceLock::new(),
            frozen: builder.frozen,
            metadata: builder.metadata,
            on_set: builder.on_set,
        }
    }

    /// The field name. Empty until the attribute is declared on a type.
    pub fn name(&self) -> &str {
        self.binding.get().map_or("", |(name, _)| name.as_str())
    }

    /// The declaring type, once bound.
    pub fn owner(&self) -> Option<&Owner> {
        self.binding.get().map(|(_, owner)| owner)
    }

    /// The attribute's kind.
    pub fn kind(&self) -> &'static AttributeKind {
        self.kind
    }

    /// The default value; `None` means the field is required.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the field appears in the record's repr.
    pub fn use_in_repr(&self) -> bool {
        self.use_in_repr
    }

    /// Whether writes are checked against the field's annotation.
    pub fn check_types(&self) -> bool {
        self.check_types
    }

    /// Whether the field accepts only one write per instance.
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Free-form metadata attached at declaration.
    pub fn metadata(&self) -> &Map {
        &self.metadata
    }

    /// Render a value of this field with its repr function.
    pub fn repr_value(&self, value: &Value) -> String {
        match &self.repr_fn {
            Some(repr_fn) => repr_fn(value),
            None => value.repr(),
        }
    }

    /// Whether the attribute can be bound to `owner` under `name`.
    ///
    /// Succeeds when the attribute is unbound or already bound to exactly
    /// this owner and name.
    pub(crate) fn check_bind(&self, owner: &Owner, name: &str) -> Result<(), InitError> {
        match self.binding.get() {
            Some((bound_name, bound_owner)) => conflict(bound_name, bound_owner, owner, name),
            None => Ok(()),
        }
    }

    /// Bind the attribute to its declaring type under `name`.
    ///
    /// Binding again with the same owner and name is a no-op.
    pub(crate) fn bind(&self, owner: &Owner, name: &str) -> Result<(), InitError> {
        let (bound_name, bound_owner) = self
            .binding
            .get_or_init(|| (name.to_owned(), owner.clone()));
        conflict(bound_name, bound_owner, owner, name)
    }

    /// The field's type annotation, resolved from the owning type's declared
    /// annotations on first use.
    ///
    /// Fails when type checking is enabled and the owner declares no
    /// annotation for this field.
    pub fn annotation(&self) -> Result<Option<&TypeExpr>, InitError> {
        if let Some(annotation) = self.annotation.get() {
            return Ok(annotation.as_ref());
        }
        let found = self
            .owner()
            .and_then(|owner| owner.annotations.get(self.name()))
            .cloned();
        if self.check_types && found.is_none() {
            let owner = self.owner().map_or("<unbound>", |owner| &*owner.name);
            return Err(InitError::configuration(format!(
                "Could not find 'annotation' for '{}' in '{owner}' with 'check_types' enabled",
                self.name()
            )));
        }
        if self.owner().is_none() {
            // nothing to cache before the attribute is declared
            return Ok(None);
        }
        Ok(self.annotation.get_or_init(|| found).as_ref())
    }

    /// Read the field from `record`, falling back to the default.
    pub fn read(&self, record: &Record) -> Result<Value, InitError> {
        match record.slot_value(self.name()).or(self.default.as_ref()) {
            Some(value) => Ok(value.clone()),
            None => Err(InitError::NotSet {
                type_name: record.type_name().to_owned(),
                field: self.name().to_owned(),
            }),
        }
    }

    /// Write the field on `record`.
    ///
    /// Applies `on_set`, validates against the annotation when type checking
    /// is enabled, stores the value and freezes the field if requested.
    pub fn write(&self, record: &mut Record, value: Value) -> Result<(), InitError> {
        let name = self.name();
        if record.is_frozen(name) {
            return Err(InitError::Frozen {
                field: name.to_owned(),
            });
        }
        let value = match &self.on_set {
            Some(on_set) => on_set(value),
            None => value,
        };
        if self.check_types {
            if let (Some(expected), Some(validator)) = (self.annotation()?, &self.validator) {
                validator.check(name, &value, expected)?;
            }
        }
        trace!("{}.{} <- {}", record.type_name(), name, value.repr());
        record.store(name, value, self.frozen);
        Ok(())
    }
}

impl Default for ManagedAttribute {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor for ManagedAttribute {
    fn attribute(&self) -> &ManagedAttribute {
        self
    }
}

impl fmt::Debug for ManagedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedAttribute")
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("owner", &self.owner().map(|owner| &*owner.name))
            .field("default", &self.default)
            .field("frozen", &self.frozen)
            .field("check_types", &self.check_types)
            .finish_non_exhaustive()
    }
}

fn conflict(bound_name: &str, bound_owner: &Owner, owner: &Owner, name: &str) -> Result<(), InitError> {
    if bound_name != name {
        return Err(InitError::configuration(format!(
            "attribute '{bound_name}' can not be bound again as '{name}'"
        )));
    }
    if bound_owner.key != owner.key {
        return Err(InitError::configuration(format!(
            "attribute '{name}' is declared on '{}' and can not be bound to '{}'",
            bound_owner.name, owner.name
        )));
    }
    Ok(())
}

/// Options for declaring a [`ManagedAttribute`].
pub struct AttributeBuilder {
    kind: &'static AttributeKind,
    default: Option<Value>,
    use_in_repr: bool,
    repr_fn: Option<ReprFn>,
    check_types: bool,
    validator: Option<Arc<dyn TypeValidator>>,
    frozen: bool,
    metadata: Map,
    on_set: Option<OnSetFn>,
}

impl AttributeBuilder {
    fn new(kind: &'static AttributeKind) -> Self {
        Self {
            kind,
            default: None,
            use_in_repr: true,
            repr_fn: None,
            check_types: false,
            validator: None,
            frozen: false,
            metadata: Map::new(),
            on_set: None,
        }
    }

    /// Value returned when the field was never written.
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Include the field in the record's repr (default: true).
    pub fn use_in_repr(mut self, use_in_repr: bool) -> Self {
        self.use_in_repr = use_in_repr;
        self
    }

    /// Render the field with `repr_fn` instead of [`Value::repr`].
    pub fn repr_with(mut self, repr_fn: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        self.repr_fn = Some(Arc::new(repr_fn));
        self
    }

    /// Check written values against the owning type's annotation for this field.
    pub fn check_types(mut self, check_types: bool) -> Self {
        self.check_types = check_types;
        self
    }

    /// Use `validator` instead of the built-in type checking backend.
    pub fn validator(mut self, validator: Arc<dyn TypeValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Allow a single write per instance.
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Attach a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Transform every incoming value before it is checked and stored.
    pub fn on_set(mut self, on_set: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.on_set = Some(Arc::new(on_set));
        self
    }

    /// Finish the declaration.
    ///
    /// Fails when type checking is requested but no validator is available.
    pub fn build(mut self) -> Result<ManagedAttribute, InitError> {
        if self.check_types && self.validator.is_none() {
            self.validator = default_validator();
            if self.validator.is_none() {
                return Err(InitError::configuration(
                    "type checking requires the `typecheck` feature or a custom validator",
                ));
            }
        }
        Ok(ManagedAttribute::from_builder(self))
    }
}
