use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use autoinit_value::{Map, Value};
use indexmap::IndexMap;

use crate::{InitError, RecordType, repr};

/// Process-unique identity of a record, used by the identity repr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        InstanceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::LowerHex for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Stored value of a managed field, with its frozen flag kept inline.
#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    frozen: bool,
}

/// An instance of a [`RecordType`].
///
/// Managed fields are read and written through their descriptors with
/// [`Record::get`] / [`Record::set`]; names that are not managed fields are
/// stored as plain attributes.
pub struct Record {
    ty: Arc<RecordType>,
    id: InstanceId,
    slots: IndexMap<String, Slot>,
    plain: Map,
}

impl Record {
    pub(crate) fn new(ty: Arc<RecordType>) -> Self {
        Self {
            ty,
            id: InstanceId::next(),
            slots: IndexMap::new(),
            plain: Map::new(),
        }
    }

    /// The record's type.
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Name of the record's type.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// The record's identity.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Read an attribute. Managed fields go through their descriptor.
    pub fn get(&self, name: &str) -> Result<Value, InitError> {
        if let Some(member) = self.ty.member(name) {
            return member.get(self);
        }
        self.plain
            .get(name)
            .cloned()
            .ok_or_else(|| InitError::NoSuchAttribute {
                type_name: self.type_name().to_owned(),
                name: name.to_owned(),
            })
    }

    /// Write an attribute. Managed fields go through their descriptor.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), InitError> {
        let value = value.into();
        match self.ty.member(name).cloned() {
            Some(member) => member.set(self, value),
            None => {
                self.plain.insert(name.to_owned(), value);
                Ok(())
            }
        }
    }

    /// The value stored for a managed field, ignoring defaults.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.slot_value(name)
    }

    /// Plain (unmanaged) attributes set on this record.
    pub fn plain_attributes(&self) -> &Map {
        &self.plain
    }

    /// The canonical string form of this record.
    pub fn repr(&self) -> String {
        repr::render(self)
    }

    pub(crate) fn slot_value(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    pub(crate) fn is_frozen(&self, name: &str) -> bool {
        self.slots.get(name).is_some_and(|slot| slot.frozen)
    }

    pub(crate) fn store(&mut self, name: &str, value: Value, freeze: bool) {
        match self.slots.get_mut(name) {
            Some(slot) => {
                slot.value = value;
                slot.frozen |= freeze;
            }
            None => {
                self.slots.insert(
                    name.to_owned(),
                    Slot {
                        value,
                        frozen: freeze,
                    },
                );
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type", &self.type_name())
            .field("id", &self.id)
            .field("slots", &self.slots)
            .field("plain", &self.plain)
            .finish()
    }
}

/// Arguments passed to a constructor: positional values and named values,
/// both in call order.
///
/// Usually built with [`args!`](crate::args).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: Map,
}

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a named argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Positional arguments, in order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Named arguments, in order.
    pub fn named(&self) -> &Map {
        &self.named
    }

    /// Remove and return a named argument.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.named.shift_remove(name)
    }

    /// True if there are neither positional nor named arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Split into positional and named arguments.
    pub fn into_parts(self) -> (Vec<Value>, Map) {
        (self.positional, self.named)
    }

    /// Reassemble from positional and named arguments.
    pub fn from_parts(positional: Vec<Value>, named: Map) -> Self {
        Self { positional, named }
    }
}

impl From<Map> for Args {
    fn from(named: Map) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<Map>(),
        )
    }
}

/// Build constructor [`Args`].
///
/// Positional arguments come first, then `;`, then `name = value` pairs:
///
/// ```
/// use autoinit::args;
///
/// let a = args![1, 2; c = 3];
/// assert_eq!(a.positional().len(), 2);
/// assert_eq!(a.named()["c"], 3);
///
/// let b = args![name = "Test", text = "Hello"];
/// assert!(b.positional().is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($key:ident = $value:expr),+ $(,)?) => {
        $crate::Args::new()$(.kwarg(stringify!($key), $value))+
    };
    ($($pos:expr),+ $(; $($key:ident = $value:expr),+)?) => {
        $crate::Args::new()$(.arg($pos))+$($(.kwarg(stringify!($key), $value))+)?
    };
}
