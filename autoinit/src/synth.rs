//! Constructor synthesis.
//!
//! When a type is declared without a hand-written constructor, and no
//! ancestor below its boundary has one either, the type gets a synthesized
//! constructor that binds named (and optionally positional) arguments onto
//! its managed attributes.

use alloc::sync::Arc;
use core::fmt;

use autoinit_value::{Map, TypeExpr, Value};
use indexmap::IndexMap;

use crate::record_type::root_init;
use crate::{Args, Discover, InitError, Record, RecordType, diagnostics, trace};

/// Returns the nearest ancestor, below the boundary, whose hand-written
/// constructor prevents `ty` from receiving a synthesized one.
pub(crate) fn blocking_ancestor(ty: &RecordType) -> Option<&RecordType> {
    let boundary = ty.config().boundary().map(|boundary| boundary.key());
    ty.ancestry()
        .skip(1)
        .take_while(|ancestor| Some(ancestor.key()) != boundary)
        .find(|ancestor| ancestor.has_own_constructor())
}

/// Compute the constructor plan and signature for `ty`.
pub(crate) fn synthesize(ty: &RecordType) -> Result<(SynthesisPlan, Signature), InitError> {
    let config = ty.config();
    let attributes = Discover::new()
        .kinds(config.init_kinds())
        .of_type(ty)
        .run()?;

    let mut required = Vec::new();
    let mut defaulted = IndexMap::new();
    let mut parameters = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let name = attribute.name();
        match attribute.default_value() {
            Some(default) => {
                defaulted.insert(name.to_owned(), default.clone());
            }
            None => required.push(name.to_owned()),
        }
        parameters.push(Parameter {
            name: name.to_owned(),
            kind: ParameterKind::PositionalOrKeyword,
            annotation: ty.annotations().get(name).cloned(),
        });
    }

    let plan = SynthesisPlan {
        required,
        defaulted,
        priority: config.priority().to_vec(),
        boundary: config.boundary().cloned(),
        allow_positional: config.allow_positional(),
    };
    Ok((plan, Signature { parameters }))
}

/// Argument binding rules of a synthesized constructor.
///
/// Computed once, when the type is declared.
#[derive(Clone)]
pub struct SynthesisPlan {
    required: Vec<String>,
    defaulted: IndexMap<String, Value>,
    priority: Vec<String>,
    boundary: Option<Arc<RecordType>>,
    allow_positional: bool,
}

impl SynthesisPlan {
    /// Fields without a default, in discovery order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Fields with a default, and a private copy of each default.
    pub fn defaulted(&self) -> &IndexMap<String, Value> {
        &self.defaulted
    }

    /// Fields written before all others, in this order.
    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// The ancestor whose constructor receives leftover named arguments.
    pub fn boundary(&self) -> Option<&Arc<RecordType>> {
        self.boundary.as_ref()
    }

    /// Whether positional arguments are bound to fields.
    pub fn allow_positional(&self) -> bool {
        self.allow_positional
    }

    /// Run the synthesized constructor on `record`.
    ///
    /// Leftover named arguments are handed to the boundary constructor
    /// before missing fields are reported, and before any of this plan's
    /// fields are written.
    pub(crate) fn call(&self, record: &mut Record, args: Args) -> Result<(), InitError> {
        let ty = Arc::clone(record.record_type());
        let synthesized = ty.uses_synthesized_init();
        let (positional, mut named) = args.into_parts();

        let mut written: Vec<&str> = Vec::new();
        for name in &self.priority {
            if let Some(value) = named.shift_remove(name) {
                trace!("{}: priority write of {name}", ty.name());
                record.set(name, value)?;
                written.push(name);
            }
        }

        if !positional.is_empty() {
            self.bind_positional(positional, &mut named, &written, ty.name(), synthesized)?;
        }

        let mut missing = Vec::new();
        let mut resolved: Vec<(&str, Value)> = Vec::new();
        for name in self.required.iter().filter(|name| !written.contains(&name.as_str())) {
            match named.shift_remove(name) {
                Some(value) => resolved.push((name.as_str(), value)),
                None => missing.push(name.clone()),
            }
        }
        for (name, default) in self
            .defaulted
            .iter()
            .filter(|(name, _)| !written.contains(&name.as_str()))
        {
            let value = named.shift_remove(name).unwrap_or_else(|| default.clone());
            resolved.push((name.as_str(), value));
        }

        let rest = Args::from(named);
        match &self.boundary {
            Some(boundary) => {
                trace!("{}: delegating to {}", ty.name(), boundary.name());
                boundary.initialize(record, rest)?;
            }
            None => root_init(record, rest)?,
        }

        if !missing.is_empty() {
            return Err(InitError::missing_required(missing, ty.name(), synthesized));
        }

        for (name, value) in resolved {
            record.set(name, value)?;
        }

        if let Some(hook) = ty.post_init_hook() {
            hook.post_init(record)?;
        }
        Ok(())
    }

    fn bind_positional(
        &self,
        positional: Vec<Value>,
        named: &mut Map,
        written: &[&str],
        type_name: &str,
        synthesized: bool,
    ) -> Result<(), InitError> {
        if !self.allow_positional {
            return Err(InitError::too_many_positional(
                positional.len(),
                type_name,
                synthesized,
            ));
        }

        let unwritten = |name: &&String| !written.contains(&name.as_str());
        let required = self.required.iter().filter(unwritten).count();
        let targets: Vec<&String> = self
            .required
            .iter()
            .filter(unwritten)
            .chain(self.defaulted.keys().filter(unwritten))
            .collect();

        if positional.len() > targets.len() {
            return Err(InitError::ArgumentCount {
                message: diagnostics::positional_overflow(
                    positional.len(),
                    required,
                    targets.len(),
                    type_name,
                    synthesized,
                ),
            });
        }

        for (name, value) in targets.into_iter().zip(positional) {
            if named.contains_key(name) {
                return Err(InitError::DuplicateArgument {
                    field: name.clone(),
                    message: diagnostics::multiple_values(type_name, name, synthesized),
                });
            }
            named.insert(name.clone(), value);
        }
        Ok(())
    }
}

impl fmt::Debug for SynthesisPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisPlan")
            .field("required", &self.required)
            .field("defaulted", &self.defaulted)
            .field("priority", &self.priority)
            .field("boundary", &self.boundary.as_ref().map(|b| b.name()))
            .field("allow_positional", &self.allow_positional)
            .finish()
    }
}

/// How a constructor parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// By position or by name.
    PositionalOrKeyword,
}

/// A parameter of a synthesized constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    annotation: Option<TypeExpr>,
}

impl Parameter {
    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the parameter may be passed.
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// The declared field type, if any.
    pub fn annotation(&self) -> Option<&TypeExpr> {
        self.annotation.as_ref()
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.annotation {
            Some(annotation) => write!(f, "{}: {annotation}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// The formal signature of a synthesized constructor, one parameter per
/// field in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// The parameters, in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ATTRIBUTE, AttributeKind, ManagedAttribute, args};

    static PARAMS: AttributeKind = AttributeKind::new("Params", &ATTRIBUTE);
    static OUTS: AttributeKind = AttributeKind::new("Outs", &ATTRIBUTE);

    fn params() -> ManagedAttribute {
        ManagedAttribute::of_kind(&PARAMS).build().unwrap()
    }

    #[test]
    fn partitions_required_and_defaulted() {
        let ty = RecordType::builder("AllowArgs")
            .attribute("a", ManagedAttribute::new())
            .attribute("b", ManagedAttribute::new())
            .attribute("c", ManagedAttribute::with_default(42))
            .build()
            .unwrap();
        let plan = ty.synthesis().unwrap();
        assert_eq!(plan.required(), ["a", "b"]);
        assert_eq!(plan.defaulted().keys().collect::<Vec<_>>(), ["c"]);
        assert_eq!(plan.defaulted()["c"], 42);
        assert!(plan.boundary().is_none());
        assert!(!plan.allow_positional());
    }

    #[test]
    fn only_configured_kinds_are_arguments() {
        let ty = RecordType::builder("OnlyParamsInInit")
            .init_kinds(&[&PARAMS])
            .attribute("parameter", params())
            .attribute("output", ManagedAttribute::of_kind(&OUTS).build().unwrap())
            .build()
            .unwrap();
        assert_eq!(ty.synthesis().unwrap().required(), ["parameter"]);
        assert_eq!(ty.signature().unwrap().to_string(), "(parameter)");
    }

    #[test]
    fn signature_carries_annotations() {
        let ty = RecordType::builder("ParentCls")
            .attribute("parameter", params())
            .attribute("label", ManagedAttribute::with_default("x"))
            .annotate("parameter", TypeExpr::Int)
            .build()
            .unwrap();
        let signature = ty.signature().unwrap();
        assert_eq!(signature.to_string(), "(parameter: int, label)");
        let parameter = signature.parameter("parameter").unwrap();
        assert_eq!(parameter.kind(), ParameterKind::PositionalOrKeyword);
        assert_eq!(parameter.annotation(), Some(&TypeExpr::Int));
    }

    #[test]
    fn hand_written_parent_blocks_synthesis() {
        let parent = RecordType::builder("ParentClsInit")
            .constructor(|record, args, sup| {
                record.set("seen", true)?;
                sup.init(record, args)
            })
            .build()
            .unwrap();
        let child = RecordType::builder("Child")
            .extends(&parent)
            .attribute("text", ManagedAttribute::new())
            .build()
            .unwrap();
        assert!(child.synthesis().is_none());
        assert!(!child.uses_synthesized_init());

        let record = child.create(args![]).unwrap();
        assert_eq!(record.get("seen").unwrap(), true);
    }

    #[test]
    fn boundary_ancestor_does_not_block_synthesis() {
        let parent = RecordType::builder("Parent")
            .constructor(|_, _, _| Ok(()))
            .build()
            .unwrap();
        let child = RecordType::builder("Child")
            .extends(&parent)
            .boundary(&parent)
            .attribute("text", ManagedAttribute::new())
            .build()
            .unwrap();
        let plan = child.synthesis().unwrap();
        assert_eq!(plan.boundary().unwrap().name(), "Parent");
    }

    #[test]
    fn priority_fields_leave_the_positional_targets() {
        let ty = RecordType::builder("Prio")
            .allow_positional(true)
            .priority(["a"])
            .attribute("a", ManagedAttribute::new())
            .attribute("b", ManagedAttribute::new())
            .build()
            .unwrap();
        let record = ty.create(args![2; a = 1]).unwrap();
        assert_eq!(record.get("a").unwrap(), 1);
        assert_eq!(record.get("b").unwrap(), 2);
    }
}
