/// Convenient macro for constructing a [`Value`][crate::Value].
///
/// Maps use identifier or string literal keys and keep their insertion
/// order. `null`/`None` and `undefined` map to the matching variants, any
/// other expression is converted using [`Value::from`][crate::Value::from].
///
/// # Examples
///
/// ```
/// let v = waterpipe::value!{
///     name: "John Smith",
///     tags: ["a", "b"],
///     "first-login": null,
/// };
/// ```
#[macro_export]
macro_rules! value {
    () => {
        $crate::Value::Object($crate::value::Map::new())
    };
    ($($tt:tt)+) => {
        $crate::_value!($($tt)+)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! _value {
    //////////////////////////////////////////////////////////////////////////
    // TT muncher for parsing the inside of a list [...]. Produces a vec![...]
    // of the elements.
    //
    // Must be invoked as: _value!(@list [] $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    // Done.
    (@list [$($elems:expr,)*]) => {
        ::std::vec![$($elems,)*]
    };

    // Next element is a keyword.
    (@list [$($elems:expr,)*] null $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::Null,] $($($rest)*)?)
    };
    (@list [$($elems:expr,)*] None $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::Null,] $($($rest)*)?)
    };
    (@list [$($elems:expr,)*] undefined $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::Undefined,] $($($rest)*)?)
    };

    // Next element is an array.
    (@list [$($elems:expr,)*] [$($array:tt)*] $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!([$($array)*]),] $($($rest)*)?)
    };

    // Next element is a map.
    (@list [$($elems:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::_value!(@list [$($elems,)* $crate::_value!({$($map)*}),] $($($rest)*)?)
    };

    // Next element is an expression followed by comma.
    (@list [$($elems:expr,)*] $next:expr, $($rest:tt)*) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::from($next),] $($rest)*)
    };

    // Last element is an expression with no trailing comma.
    (@list [$($elems:expr,)*] $last:expr) => {
        $crate::_value!(@list [$($elems,)* $crate::Value::from($last),])
    };

    //////////////////////////////////////////////////////////////////////////
    // TT muncher for parsing the inside of a map {...}. Each entry is
    // inserted into the given map variable.
    //
    // Must be invoked as: _value!(@map $map $($tt)*)
    //////////////////////////////////////////////////////////////////////////

    // Done.
    (@map $map:ident) => {};

    // Identifier key.
    (@map $map:ident $key:ident : $($rest:tt)+) => {
        $crate::_value!(@entry $map (stringify!($key)) $($rest)+);
    };

    // String literal key.
    (@map $map:ident $key:literal : $($rest:tt)+) => {
        $crate::_value!(@entry $map ($key) $($rest)+);
    };

    // Value is a keyword.
    (@entry $map:ident ($key:expr) null $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::Null);
        $crate::_value!(@map $map $($($rest)*)?);
    };
    (@entry $map:ident ($key:expr) None $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::Null);
        $crate::_value!(@map $map $($($rest)*)?);
    };
    (@entry $map:ident ($key:expr) undefined $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::Undefined);
        $crate::_value!(@map $map $($($rest)*)?);
    };

    // Value is an array.
    (@entry $map:ident ($key:expr) [$($array:tt)*] $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::_value!([$($array)*]));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    // Value is a map.
    (@entry $map:ident ($key:expr) {$($inner:tt)*} $(, $($rest:tt)*)?) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::_value!({$($inner)*}));
        $crate::_value!(@map $map $($($rest)*)?);
    };

    // Value is an expression followed by comma.
    (@entry $map:ident ($key:expr) $value:expr, $($rest:tt)*) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::from($value));
        $crate::_value!(@map $map $($rest)*);
    };

    // Last value is an expression with no trailing comma.
    (@entry $map:ident ($key:expr) $value:expr) => {
        let _ = $map.insert(::std::string::String::from($key), $crate::Value::from($value));
    };

    //////////////////////////////////////////////////////////////////////////
    // The main implementation.
    //////////////////////////////////////////////////////////////////////////
    (null) => {
        $crate::Value::Null
    };

    (None) => {
        $crate::Value::Null
    };

    (undefined) => {
        $crate::Value::Undefined
    };

    ([]) => {
        $crate::Value::Array(::std::vec::Vec::new())
    };

    ([ $($tt:tt)+ ]) => {
        $crate::Value::Array($crate::_value!(@list [] $($tt)+))
    };

    ({}) => {
        $crate::Value::Object($crate::value::Map::new())
    };

    ({ $($tt:tt)+ }) => {
        $crate::Value::Object({
            let mut map = $crate::value::Map::new();
            $crate::_value!(@map map $($tt)+);
            map
        })
    };

    // Bare map contents without braces.
    ($key:ident : $($tt:tt)+) => {
        $crate::_value!({ $key : $($tt)+ })
    };

    ($key:literal : $($tt:tt)+) => {
        $crate::_value!({ $key : $($tt)+ })
    };

    // Default to `From` implementation.
    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::value::Map;
    use crate::Value;

    #[test]
    fn value_keywords() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(None), Value::Null);
        assert_eq!(value!(undefined), Value::Undefined);
    }

    #[test]
    fn value_list() {
        let v = value!(["testing...", null, {}, [], 1]);
        assert_eq!(
            v,
            Value::Array(vec![
                Value::from("testing..."),
                Value::Null,
                Value::Object(Map::new()),
                Value::Array(Vec::new()),
                Value::Number(1.0),
            ])
        )
    }

    #[test]
    fn value_map_keeps_order() {
        let v = value!({ z: 1, "a-b": [true], m: { x: undefined } });
        let Value::Object(map) = v else {
            panic!("expected object");
        };
        assert_eq!(map.keys().collect::<Vec<_>>(), ["z", "a-b", "m"]);
        assert_eq!(map["a-b"], Value::from(vec![true]));
    }

    #[test]
    fn value_bare_map() {
        let v = value! { x: "hello", y: String::from("world!") };
        let mut exp = Map::new();
        exp.insert("x".to_owned(), Value::from("hello"));
        exp.insert("y".to_owned(), Value::from("world!"));
        assert_eq!(v, Value::Object(exp));
    }
}
