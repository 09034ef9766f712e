use core::fmt;

/// A type annotation that a managed attribute can be checked against.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Accepts every value.
    Any,
    /// Only `Value::None`.
    None,
    /// Booleans.
    Bool,
    /// Integers.
    Int,
    /// Floats. Integers are accepted too.
    Float,
    /// Strings.
    Str,
    /// Anything that can be iterated: strings, lists and maps.
    Iterable,
    /// A list whose items all match the inner type.
    List(Box<TypeExpr>),
    /// A map whose values all match the inner type.
    Map(Box<TypeExpr>),
    /// Any one of the listed types.
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    /// `list[inner]`
    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    /// `dict[str, inner]`
    pub fn map(inner: TypeExpr) -> Self {
        TypeExpr::Map(Box::new(inner))
    }

    /// `a | b | ...`
    pub fn union(members: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Union(members.into_iter().collect())
    }

    /// `inner | None`
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Union(vec![inner, TypeExpr::None])
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Any => f.write_str("Any"),
            TypeExpr::None => f.write_str("None"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Str => f.write_str("str"),
            TypeExpr::Iterable => f.write_str("Iterable"),
            TypeExpr::List(inner) => write!(f, "list[{inner}]"),
            TypeExpr::Map(inner) => write!(f, "dict[str, {inner}]"),
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}
