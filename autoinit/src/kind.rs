use core::fmt;

/// The kind of a managed attribute.
///
/// Kinds form a tree rooted at [`ATTRIBUTE`]. Declare your own as statics so
/// they have a stable identity:
///
/// ```
/// use autoinit::{ATTRIBUTE, AttributeKind};
///
/// static PARAMS: AttributeKind = AttributeKind::new("Params", &ATTRIBUTE);
/// static DEPS: AttributeKind = AttributeKind::new("Deps", &PARAMS);
///
/// assert!(DEPS.is(&PARAMS));
/// assert!(DEPS.is(&ATTRIBUTE));
/// assert!(!PARAMS.is(&DEPS));
/// ```
pub struct AttributeKind {
    name: &'static str,
    parent: Option<&'static AttributeKind>,
}

/// The root kind. Every attribute kind is an `ATTRIBUTE`.
pub static ATTRIBUTE: AttributeKind = AttributeKind {
    name: "Attribute",
    parent: None,
};

impl AttributeKind {
    /// Declare a kind derived from `parent`.
    pub const fn new(name: &'static str, parent: &'static AttributeKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// The kind's name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The kind this one derives from. `None` only for [`ATTRIBUTE`].
    pub fn parent(&self) -> Option<&'static AttributeKind> {
        self.parent
    }

    /// Returns true if this kind is `other` or derives from it.
    pub fn is(&self, other: &AttributeKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if core::ptr::eq(kind, other) {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// Returns true if this kind matches any of `kinds`.
    pub fn is_any(&self, kinds: &[&AttributeKind]) -> bool {
        kinds.iter().any(|kind| self.is(kind))
    }
}

impl fmt::Debug for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if let Some(parent) = self.parent {
            write!(f, "({parent:?})")?;
        }
        Ok(())
    }
}
