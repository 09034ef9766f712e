/// Build a [`Value`](crate::Value) from a literal-like syntax.
///
/// Lists use brackets, maps use braces with string-literal keys, and `None`
/// is the null value. Anything else goes through `Value::from`; wrap
/// multi-token expressions such as `-1` in parentheses.
///
/// ```
/// use autoinit_value::{Value, value};
///
/// let v = value!({ "name": "box", "sizes": [1, 2, (-3)], "parent": None });
/// assert_eq!(v.repr(), "{'name': 'box', 'sizes': [1, 2, -3], 'parent': None}");
/// ```
#[macro_export]
macro_rules! value {
    (None) => {
        $crate::Value::None
    };
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(::std::vec![ $( $crate::value!($elem) ),* ])
    };
    ({ $($key:literal : $val:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Map::new();
        $( map.insert(::std::string::String::from($key), $crate::value!($val)); )*
        $crate::Value::Map(map)
    }};
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
