//! Canonical string form of values, used as the default `repr_fn` of managed
//! attributes and when rendering records.

use core::fmt::{self, Write};

use crate::Value;

/// Display adapter that renders a [`Value`] in its canonical repr form.
pub struct Repr<'a>(&'a Value);

impl Value {
    /// Render this value in canonical repr form.
    ///
    /// Strings are quoted (`'Hello'`), null is `None`, booleans are `True` /
    /// `False`, lists are `[a, b]` and maps are `{'k': v}`.
    pub fn repr(&self) -> String {
        self.repr_display().to_string()
    }

    /// A [`Display`](fmt::Display) adapter for the canonical repr.
    pub fn repr_display(&self) -> Repr<'_> {
        Repr(self)
    }
}

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self.0)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::None => f.write_str("None"),
        Value::Bool(true) => f.write_str("True"),
        Value::Bool(false) => f.write_str("False"),
        Value::Int(i) => write!(f, "{i}"),
        Value::Float(x) => write_float(f, *x),
        Value::Str(s) => write_str_literal(f, s),
        Value::List(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, item)?;
            }
            f.write_char(']')
        }
        Value::Map(map) => {
            f.write_char('{')?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_str_literal(f, key)?;
                f.write_str(": ")?;
                write_value(f, item)?;
            }
            f.write_char('}')
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        // `{:?}` keeps the trailing `.0` on integral floats
        write!(f, "{x:?}")
    }
}

/// Quote with `'` unless the string contains `'` and no `"`.
fn write_str_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}
