//! Record type declarations.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use autoinit_value::TypeExpr;
use indexmap::IndexMap;

use crate::synth::{self, Signature, SynthesisPlan};
use crate::{
    ATTRIBUTE, Annotations, Args, AttributeKind, Descriptor, InitError, Owner, Record, TypeKey,
    debug, trace,
};

/// A hand-written constructor.
///
/// It receives the record being initialized, the call's arguments, and a
/// [`Super`] handle for invoking the ancestor constructor chain.
pub type InitFn = Arc<dyn Fn(&mut Record, Args, &Super<'_>) -> Result<(), InitError> + Send + Sync>;

/// Hook run by synthesized constructors once every field is written.
pub trait PostInit: Send + Sync {
    /// Called with the fully initialized record.
    fn post_init(&self, record: &mut Record) -> Result<(), InitError>;
}

impl<F> PostInit for F
where
    F: Fn(&mut Record) -> Result<(), InitError> + Send + Sync,
{
    fn post_init(&self, record: &mut Record) -> Result<(), InitError> {
        self(record)
    }
}

/// The constructor a type defines itself.
#[derive(Clone)]
pub(crate) enum Constructor {
    HandWritten(InitFn),
    Synthesized(Arc<SynthesisPlan>),
}

/// Type-level configuration read when constructors are synthesized.
#[derive(Clone)]
pub struct TypeConfig {
    init_kinds: Vec<&'static AttributeKind>,
    use_repr: bool,
    boundary: Option<Arc<RecordType>>,
    priority: Vec<String>,
    allow_positional: bool,
}

impl TypeConfig {
    /// Attribute kinds that become constructor arguments and repr fields.
    pub fn init_kinds(&self) -> &[&'static AttributeKind] {
        &self.init_kinds
    }

    /// Whether the record repr lists fields (otherwise it is identity-based).
    pub fn use_repr(&self) -> bool {
        self.use_repr
    }

    /// The ancestor whose constructor synthesized constructors delegate to.
    /// `None` is the root: a constructor that accepts no arguments.
    pub fn boundary(&self) -> Option<&Arc<RecordType>> {
        self.boundary.as_ref()
    }

    /// Fields written before the general binding pass, in this order.
    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// Whether synthesized constructors accept positional arguments.
    pub fn allow_positional(&self) -> bool {
        self.allow_positional
    }
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            init_kinds: vec![&ATTRIBUTE],
            use_repr: true,
            boundary: None,
            priority: Vec::new(),
            allow_positional: false,
        }
    }
}

impl fmt::Debug for TypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConfig")
            .field("init_kinds", &self.init_kinds)
            .field("use_repr", &self.use_repr)
            .field("boundary", &self.boundary.as_ref().map(|b| b.name()))
            .field("priority", &self.priority)
            .field("allow_positional", &self.allow_positional)
            .finish()
    }
}

/// A declared record type: its managed attributes, annotations,
/// configuration and constructor.
///
/// Types are immutable once built and shared through `Arc`.
pub struct RecordType {
    key: TypeKey,
    name: Arc<str>,
    parent: Option<Arc<RecordType>>,
    members: IndexMap<String, Arc<dyn Descriptor>>,
    own_annotations: Arc<Annotations>,
    annotations: Annotations,
    config: TypeConfig,
    init: Option<Constructor>,
    post_init: Option<Arc<dyn PostInit>>,
    signature: Option<Signature>,
}

impl RecordType {
    /// Start declaring a type.
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder::new(name.into())
    }

    /// Identity of this type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this one extends.
    pub fn parent(&self) -> Option<&Arc<RecordType>> {
        self.parent.as_ref()
    }

    /// This type followed by its ancestors, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &RecordType> {
        core::iter::successors(Some(self), |ty| ty.parent.as_deref())
    }

    /// Returns true if `other` is this type or one of its ancestors.
    pub fn is_subtype_of(&self, other: &RecordType) -> bool {
        self.ancestry().any(|ty| ty.key == other.key)
    }

    /// Every member visible on this type, ancestors' first, in declaration order.
    pub fn members(&self) -> &IndexMap<String, Arc<dyn Descriptor>> {
        &self.members
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&Arc<dyn Descriptor>> {
        self.members.get(name)
    }

    /// Annotations visible on this type, ancestors' first.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Type-level configuration.
    pub fn config(&self) -> &TypeConfig {
        &self.config
    }

    /// The synthesized constructor plan, if this type received one.
    pub fn synthesis(&self) -> Option<&SynthesisPlan> {
        match &self.init {
            Some(Constructor::Synthesized(plan)) => Some(plan),
            _ => None,
        }
    }

    /// The synthesized constructor's signature, if this type received one.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Returns true if this type defines a hand-written constructor itself.
    pub fn has_own_constructor(&self) -> bool {
        matches!(self.init, Some(Constructor::HandWritten(_)))
    }

    /// Returns true if constructing this type runs a synthesized constructor,
    /// its own or an inherited one.
    pub fn uses_synthesized_init(&self) -> bool {
        matches!(self.constructor(), Some(Constructor::Synthesized(_)))
    }

    /// The owner handle attributes declared on this type are bound to.
    pub fn owner(&self) -> Owner {
        Owner {
            key: self.key,
            name: Arc::clone(&self.name),
            annotations: Arc::clone(&self.own_annotations),
        }
    }

    /// Create an instance without running any constructor.
    pub fn allocate(self: &Arc<Self>) -> Record {
        Record::new(Arc::clone(self))
    }

    /// Create and initialize an instance.
    pub fn create(self: &Arc<Self>, args: Args) -> Result<Record, InitError> {
        let mut record = self.allocate();
        self.initialize(&mut record, args)?;
        Ok(record)
    }

    /// Run this type's constructor on `record`: its own, the nearest
    /// inherited one, or the root constructor.
    pub fn initialize(&self, record: &mut Record, args: Args) -> Result<(), InitError> {
        for ty in self.ancestry() {
            match &ty.init {
                Some(Constructor::HandWritten(init)) => {
                    trace!("{}: hand-written constructor of {}", record.type_name(), ty.name);
                    return init(record, args, &Super { of: ty });
                }
                Some(Constructor::Synthesized(plan)) => {
                    trace!("{}: synthesized constructor of {}", record.type_name(), ty.name);
                    return plan.call(record, args);
                }
                None => {}
            }
        }
        root_init(record, args)
    }

    /// The post-construction hook of this type or its nearest ancestor.
    pub(crate) fn post_init_hook(&self) -> Option<&Arc<dyn PostInit>> {
        self.ancestry().find_map(|ty| ty.post_init.as_ref())
    }

    fn constructor(&self) -> Option<&Constructor> {
        self.ancestry().find_map(|ty| ty.init.as_ref())
    }
}

/// The constructor at the top of every chain: accepts no arguments.
pub(crate) fn root_init(record: &mut Record, args: Args) -> Result<(), InitError> {
    let (positional, named) = args.into_parts();
    if let Some(name) = named.keys().next() {
        return Err(InitError::unexpected_keyword(record.type_name(), name));
    }
    if !positional.is_empty() {
        let synthesized = record.record_type().uses_synthesized_init();
        return Err(InitError::too_many_positional(
            positional.len(),
            record.type_name(),
            synthesized,
        ));
    }
    Ok(())
}

/// Handle given to hand-written constructors for calling up the chain.
pub struct Super<'a> {
    of: &'a RecordType,
}

impl Super<'_> {
    /// Run the parent type's constructor on `record`.
    pub fn init(&self, record: &mut Record, args: Args) -> Result<(), InitError> {
        match &self.of.parent {
            Some(parent) => parent.initialize(record, args),
            None => root_init(record, args),
        }
    }

    /// The type whose constructor is running.
    pub fn of(&self) -> &RecordType {
        self.of
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("synthesized", &self.synthesis().is_some())
            .finish_non_exhaustive()
    }
}

/// Declares a [`RecordType`].
///
/// ```
/// use autoinit::{ManagedAttribute, RecordType, args};
///
/// let greeting = RecordType::builder("Greeting")
///     .attribute("param1", ManagedAttribute::new())
///     .attribute("param2", ManagedAttribute::with_default("World"))
///     .build()?;
///
/// let record = greeting.create(args![param1 = "Hello"])?;
/// assert_eq!(record.repr(), "Greeting(param1='Hello', param2='World')");
/// # Ok::<(), autoinit::InitError>(())
/// ```
pub struct RecordTypeBuilder {
    name: String,
    parent: Option<Arc<RecordType>>,
    members: IndexMap<String, Arc<dyn Descriptor>>,
    annotations: Annotations,
    init_kinds: Option<Vec<&'static AttributeKind>>,
    use_repr: Option<bool>,
    boundary: Option<Arc<RecordType>>,
    priority: Option<Vec<String>>,
    allow_positional: Option<bool>,
    init: Option<InitFn>,
    post_init: Option<Arc<dyn PostInit>>,
}

impl RecordTypeBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            members: IndexMap::new(),
            annotations: Annotations::new(),
            init_kinds: None,
            use_repr: None,
            boundary: None,
            priority: None,
            allow_positional: None,
            init: None,
            post_init: None,
        }
    }

    /// Extend `parent`: inherit its members, annotations, configuration,
    /// constructor and post-init hook.
    pub fn extends(mut self, parent: &Arc<RecordType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Declare a managed attribute (or any descriptor) under `name`.
    pub fn attribute(self, name: impl Into<String>, descriptor: impl Descriptor + 'static) -> Self {
        self.descriptor(name, Arc::new(descriptor))
    }

    /// Declare an already shared descriptor under `name`.
    pub fn descriptor(mut self, name: impl Into<String>, descriptor: Arc<dyn Descriptor>) -> Self {
        self.members.insert(name.into(), descriptor);
        self
    }

    /// Declare the type of a field.
    pub fn annotate(mut self, name: impl Into<String>, annotation: TypeExpr) -> Self {
        self.annotations.insert(name.into(), annotation);
        self
    }

    /// Only attributes of these kinds become constructor arguments and repr fields.
    pub fn init_kinds(mut self, kinds: &[&'static AttributeKind]) -> Self {
        self.init_kinds = Some(kinds.to_vec());
        self
    }

    /// Enable or disable the field-listing repr.
    pub fn use_repr(mut self, use_repr: bool) -> Self {
        self.use_repr = Some(use_repr);
        self
    }

    /// Stop constructor synthesis at `boundary` and delegate to its constructor.
    pub fn boundary(mut self, boundary: &Arc<RecordType>) -> Self {
        self.boundary = Some(Arc::clone(boundary));
        self
    }

    /// Write these named arguments first, in this order.
    pub fn priority<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Accept positional arguments in the synthesized constructor.
    pub fn allow_positional(mut self, allow: bool) -> Self {
        self.allow_positional = Some(allow);
        self
    }

    /// Use a hand-written constructor; no constructor is synthesized.
    pub fn constructor<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut Record, Args, &Super<'_>) -> Result<(), InitError> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }

    /// Run `hook` at the end of synthesized construction.
    pub fn post_init(mut self, hook: impl PostInit + 'static) -> Self {
        self.post_init = Some(Arc::new(hook));
        self
    }

    /// Finish the declaration: bind attributes, resolve configuration and
    /// synthesize the constructor when applicable.
    pub fn build(self) -> Result<Arc<RecordType>, InitError> {
        static NEXT_KEY: AtomicU64 = AtomicU64::new(1);
        let key = TypeKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed));
        let name: Arc<str> = Arc::from(self.name);
        let own_annotations = Arc::new(self.annotations);

        let inherited = self
            .parent
            .as_ref()
            .map(|parent| parent.config.clone())
            .unwrap_or_default();
        let config = TypeConfig {
            init_kinds: self.init_kinds.unwrap_or(inherited.init_kinds),
            use_repr: self.use_repr.unwrap_or(inherited.use_repr),
            boundary: self.boundary.or(inherited.boundary),
            priority: self.priority.unwrap_or(inherited.priority),
            allow_positional: self.allow_positional.unwrap_or(inherited.allow_positional),
        };

        if let Some(boundary) = &config.boundary {
            let is_ancestor = self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.is_subtype_of(boundary));
            if !is_ancestor {
                return Err(InitError::configuration(format!(
                    "boundary '{}' is not an ancestor of '{name}'",
                    boundary.name()
                )));
            }
        }

        let owner = Owner {
            key,
            name: Arc::clone(&name),
            annotations: Arc::clone(&own_annotations),
        };
        for (index, (member_name, descriptor)) in self.members.iter().enumerate() {
            let attribute = descriptor.attribute();
            attribute.check_bind(&owner, member_name)?;
            if let Some((first, _)) = self.members.iter().take(index).find(|(_, earlier)| {
                core::ptr::eq(earlier.attribute(), attribute)
            }) {
                return Err(InitError::configuration(format!(
                    "attribute '{first}' can not be bound again as '{member_name}'"
                )));
            }
        }
        let own_names: Vec<String> = self.members.keys().cloned().collect();

        let (mut members, mut annotations) = match &self.parent {
            Some(parent) => (parent.members.clone(), parent.annotations.clone()),
            None => (IndexMap::new(), Annotations::new()),
        };
        members.extend(self.members);
        annotations.extend(own_annotations.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut ty = RecordType {
            key,
            name,
            parent: self.parent,
            members,
            own_annotations,
            annotations,
            config,
            init: self.init.map(Constructor::HandWritten),
            post_init: self.post_init,
            signature: None,
        };

        let synthesizes = ty.init.is_none()
            && match synth::blocking_ancestor(&ty) {
                Some(ancestor) => {
                    debug!(
                        "{}: keeping the hand-written constructor of {}",
                        ty.name,
                        ancestor.name()
                    );
                    false
                }
                None => true,
            };
        if synthesizes {
            for (member_name, member) in &ty.members {
                if member.class_get().is_none() {
                    return Err(InitError::Protocol {
                        type_name: ty.name.to_string(),
                        member: member_name.clone(),
                    });
                }
            }
        }

        // only a concurrent build sharing a descriptor can fail past this point
        for member_name in &own_names {
            if let Some(member) = ty.members.get(member_name) {
                member.attribute().bind(&owner, member_name)?;
            }
        }

        if synthesizes {
            debug!("{}: synthesizing constructor", ty.name);
            let (plan, signature) = synth::synthesize(&ty)?;
            ty.signature = Some(signature);
            ty.init = Some(Constructor::Synthesized(Arc::new(plan)));
        }

        Ok(Arc::new(ty))
    }
}
