//! Constructor argument diagnostics, phrased like the errors of a hand-written
//! signature.
//!
//! Every message names the constructor being called. When the record's own
//! type uses a synthesized constructor the prefix is `Type.__init__()`; when
//! the record's type has a hand-written constructor that forwards to a
//! synthesized ancestor, the prefix is `super(Type, self).__init__()`.

use crate::InitError;

fn callee(type_name: &str, synthesized: bool) -> String {
    if synthesized {
        format!("{type_name}.__init__()")
    } else {
        format!("super({type_name}, self).__init__()")
    }
}

fn quoted(name: &str) -> String {
    format!("'{name}'")
}

/// Render names as an English list: `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`.
pub fn english_list<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => quoted(only.as_ref()),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(|name| quoted(name.as_ref())).collect();
            format!("{} and {}", init.join(", "), quoted(last.as_ref()))
        }
    }
}

/// Positional arguments were passed to a constructor that takes none.
pub fn too_many_positional(count: usize, type_name: &str, synthesized: bool) -> String {
    format!(
        "{} takes 1 positional argument but {} were given",
        callee(type_name, synthesized),
        count + 1
    )
}

/// More positional arguments than fields were passed. `required` and
/// `total` count fields, not including the instance.
pub fn positional_overflow(
    count: usize,
    required: usize,
    total: usize,
    type_name: &str,
    synthesized: bool,
) -> String {
    let takes = if required == total {
        format!(
            "takes {} positional argument{}",
            total + 1,
            if total == 0 { "" } else { "s" }
        )
    } else {
        format!("takes from {} to {} positional arguments", required + 1, total + 1)
    };
    format!(
        "{} {takes} but {} were given",
        callee(type_name, synthesized),
        count + 1
    )
}

/// Required fields were not supplied.
pub fn missing_required<S: AsRef<str>>(names: &[S], type_name: &str, synthesized: bool) -> String {
    let plural = if names.len() == 1 { "" } else { "s" };
    format!(
        "{} missing {} required keyword-only argument{plural}: {}",
        callee(type_name, synthesized),
        names.len(),
        english_list(names)
    )
}

/// A named argument was accepted by nothing in the constructor chain.
pub fn unexpected_keyword(type_name: &str, name: &str) -> String {
    format!("{type_name}.__init__() got an unexpected keyword argument '{name}'")
}

/// A field was given both positionally and by name.
pub fn multiple_values(type_name: &str, name: &str, synthesized: bool) -> String {
    format!(
        "{} got multiple values for argument '{name}'",
        callee(type_name, synthesized)
    )
}

impl InitError {
    /// [`InitError::ArgumentCount`] for positional arguments where none are accepted.
    pub fn too_many_positional(count: usize, type_name: &str, synthesized: bool) -> Self {
        InitError::ArgumentCount {
            message: too_many_positional(count, type_name, synthesized),
        }
    }

    /// [`InitError::MissingField`] naming `fields` in order.
    pub fn missing_required(fields: Vec<String>, type_name: &str, synthesized: bool) -> Self {
        let message = missing_required(&fields, type_name, synthesized);
        InitError::MissingField { fields, message }
    }

    /// [`InitError::UnexpectedField`] for an argument nobody accepted.
    pub fn unexpected_keyword(type_name: &str, field: &str) -> Self {
        InitError::UnexpectedField {
            field: field.to_owned(),
            message: unexpected_keyword(type_name, field),
        }
    }
}
