/// Builds an attribute mapping.
///
/// Every value goes through `Into<Value>`, so strings, numbers, booleans,
/// callbacks and nested mappings can be mixed freely.
///
/// # Usage
///
/// ```ignore
/// let attrs = attrs! {
///     "id" => "main",
///     "key" => 3,
///     "className" => attrs! { "active" => true, "hidden" => false },
/// };
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Map::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Map::new();
        $(
            map.insert(::core::convert::Into::<String>::into($key), $crate::Value::from($value));
        )+
        map
    }};
}

/// Builds a [`Value::List`](crate::Value::List) from heterogeneous entries.
///
/// # Usage
///
/// ```ignore
/// let view = list!["div#app", attrs! {}, list!["hello", 42]];
/// ```
#[macro_export]
macro_rules! list {
    () => {
        $crate::Value::List(::std::vec::Vec::new())
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Value::List(::std::vec![$($crate::Value::from($item)),+])
    };
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn attrs_preserve_insertion_order() {
        let map = attrs! { "b" => 1, "a" => "x", "c" => true };
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(map["a"].as_str(), Some("x"));
    }

    #[test]
    fn list_converts_entries() {
        let Value::List(items) = list!["div", attrs! {}, list!["text", 1]] else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], Value::Map(ref map) if map.is_empty()));
        assert!(matches!(items[2], Value::List(ref children) if children.len() == 2));
    }
}
