//! `className` flattening.

use alloc::borrow::Cow;

use crate::{Value, value::format_number};

/// Flattens a `className` attribute value into a space separated string.
///
/// Strings are emitted verbatim and numbers in their string form. Mappings
/// emit the keys whose values are truthy, and sequences recurse left to
/// right. Empty tokens are dropped and duplicates are kept.
///
/// ```ignore
/// let value = list!["a", attrs! { "b" => true, "c" => false }, list!["d"]];
/// assert_eq!(flatten_class(&value), "a b d");
/// ```
#[must_use]
pub fn flatten_class(value: &Value) -> String {
    let mut tokens = Vec::new();
    collect(value, &mut tokens);
    tokens.join(" ")
}

fn collect<'a>(value: &'a Value, tokens: &mut Vec<Cow<'a, str>>) {
    match value {
        Value::String(text) if !text.is_empty() => tokens.push(Cow::Borrowed(text)),
        Value::Number(number) => tokens.push(Cow::Owned(format_number(*number))),
        Value::Map(entries) => tokens.extend(
            entries
                .iter()
                .filter(|(name, flag)| !name.is_empty() && flag.is_truthy())
                .map(|(name, _)| Cow::Borrowed(name.as_str())),
        ),
        Value::List(items) => {
            for item in items {
                collect(item, tokens);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_structures() {
        let value = list![
            "a",
            attrs! { "b" => true, "c" => false, "d" => 1 },
            list!["e", list!["f"]],
        ];
        assert_eq!(flatten_class(&value), "a b d e f");
    }

    #[test]
    fn keeps_duplicates_and_skips_empty() {
        let value = list!["a", "", "a", attrs! { "x" => "" }];
        assert_eq!(flatten_class(&value), "a a");
    }

    #[test]
    fn numbers_are_tokens() {
        assert_eq!(flatten_class(&Value::from(5)), "5");
        assert_eq!(flatten_class(&list![0, "a", 1.5]), "0 a 1.5");
    }

    #[test]
    fn plain_string_is_verbatim() {
        assert_eq!(flatten_class(&Value::from("one two")), "one two");
        assert_eq!(flatten_class(&Value::Null), "");
    }
}
