use autoinit_value::TypeCheckError;

/// Errors raised while declaring record types, constructing records, or
/// reading and writing managed attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    /// A type or attribute was declared with an invalid configuration.
    Configuration {
        /// What is wrong.
        message: String,
    },

    /// A field was read before it was ever written and it has no default.
    NotSet {
        /// Name of the record's type.
        type_name: String,
        /// The field that was read.
        field: String,
    },

    /// A frozen field was written a second time.
    Frozen {
        /// The frozen field.
        field: String,
    },

    /// The type validator rejected a value.
    TypeMismatch(TypeCheckError),

    /// Positional arguments were given where none, or fewer, are accepted.
    ArgumentCount {
        /// Signature-style diagnostic.
        message: String,
    },

    /// A positional argument collided with a named argument for the same field.
    DuplicateArgument {
        /// The field given twice.
        field: String,
        /// Signature-style diagnostic.
        message: String,
    },

    /// Required fields were absent after all binding passes.
    MissingField {
        /// The missing fields, in declaration order.
        fields: Vec<String>,
        /// Signature-style diagnostic.
        message: String,
    },

    /// A named argument matched no managed field and no ancestor accepted it.
    UnexpectedField {
        /// The rejected argument name.
        field: String,
        /// Signature-style diagnostic.
        message: String,
    },

    /// A custom descriptor does not support class-level access.
    Protocol {
        /// The type being inspected.
        type_name: String,
        /// The member whose descriptor misbehaved.
        member: String,
    },

    /// A plain (unmanaged) attribute was read but never set.
    NoSuchAttribute {
        /// Name of the record's type.
        type_name: String,
        /// The missing attribute.
        name: String,
    },

    /// Raised by user code: hand-written constructors, hooks and descriptors.
    Custom(String),
}

impl InitError {
    /// Build a [`InitError::Custom`] from any message.
    pub fn custom(message: impl Into<String>) -> Self {
        InitError::Custom(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        InitError::Configuration {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InitError::Configuration { message } => f.write_str(message),
            InitError::NotSet { type_name, field } => {
                write!(f, "'{type_name}.{field}' is not set")
            }
            InitError::Frozen { field } => {
                write!(f, "Frozen attribute '{field}' can not be changed.")
            }
            InitError::TypeMismatch(err) => write!(f, "{err}"),
            InitError::ArgumentCount { message }
            | InitError::DuplicateArgument { message, .. }
            | InitError::MissingField { message, .. }
            | InitError::UnexpectedField { message, .. } => f.write_str(message),
            InitError::Protocol { type_name, member } => write!(
                f,
                "Trying to access '{type_name}.{member}' without an instance to retrieve \
                 the descriptor. Make sure the descriptor supports class-level access."
            ),
            InitError::NoSuchAttribute { type_name, name } => {
                write!(f, "'{type_name}' object has no attribute '{name}'")
            }
            InitError::Custom(message) => f.write_str(message),
        }
    }
}

impl core::error::Error for InitError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            InitError::TypeMismatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TypeCheckError> for InitError {
    fn from(err: TypeCheckError) -> Self {
        InitError::TypeMismatch(err)
    }
}
