//! Builder output and attribute values.
//!
//! [`Value`] is the closed variant type application code uses to describe a
//! view: strings and numbers become text, sequences starting with a tag string
//! become elements, sequences starting with a [`ComponentRef`] resolve through a
//! component. The same type carries attribute values, where only the
//! primitive variants take part in equality.

use alloc::rc::Rc;
use core::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{ComponentRef, VNode};

/// Ordered string-keyed mapping used for attributes and component props.
pub type Map = IndexMap<String, Value>;

/// Opaque host handler assigned as a property, such as an event listener.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value])>);

impl Callback {
    /// Wraps a closure into a callback.
    pub fn new(f: impl Fn(&[Value]) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback with `args`.
    pub fn call(&self, args: &[Value]) {
        (self.0)(args);
    }

    /// Returns `true` if both callbacks point at the same closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Dynamically shaped builder output.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value; renders as an empty text node.
    #[default]
    Null,
    /// Boolean; renders as an empty text node.
    Bool(bool),
    /// Number; renders as its string form.
    Number(f64),
    /// String; renders as a text node, or names a tag in first position.
    String(String),
    /// Sequence: `[tag, attrs?, children?]`, `[component, attrs?, children?]` or a child list.
    List(Vec<Self>),
    /// Mapping, used for attributes and `className` flags.
    Map(Map),
    /// Reference to a function component.
    Component(ComponentRef),
    /// Host handler.
    Callback(Callback),
    /// An already canonical node, as handed to components in `children`.
    Node(Box<VNode>),
}

impl Value {
    /// Returns `true` for `Null`, `Bool`, `Number` and `String`.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_)
        )
    }

    /// Truthiness as the templating surface understands it.
    ///
    /// `Null`, `false`, `0`, `NaN` and the empty string are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(flag) => *flag,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::String(text) => !text.is_empty(),
            Self::List(_) | Self::Map(_) | Self::Component(_) | Self::Callback(_) | Self::Node(_) => {
                true
            }
        }
    }

    /// Strict equality used by the attribute diff.
    ///
    /// Non-primitive values never compare equal, not even to themselves.
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    /// Returns the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the number payload, if any.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// String form of a primitive; `None` for every other variant.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_owned()),
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Number(number) => Some(format_number(*number)),
            Self::String(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Builds `[tag, attrs, children]`.
    pub fn element(tag: impl Into<String>, attrs: Map, children: Vec<Self>) -> Self {
        Self::List(alloc::vec![
            Self::String(tag.into()),
            Self::Map(attrs),
            Self::List(children),
        ])
    }
}

/// Formats a number the way text nodes display it.
///
/// Integral values print without a fraction, non-finite values print as
/// `NaN`, `Infinity` or `-Infinity`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_owned();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if number == 0.0 {
        return "0".to_owned();
    }
    if number.fract() == 0.0 && number.abs() < 1e21 {
        return format!("{}", number as i128);
    }
    number.to_string()
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(f64::from(value))
                }
            }
        )*
    };
}

impl_from_number!(f32, i8, i16, i32, u8, u16, u32);

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl From<ComponentRef> for Value {
    fn from(value: ComponentRef) -> Self {
        Self::Component(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl From<VNode> for Value {
    fn from(value: VNode) -> Self {
        Self::Node(Box::new(value))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => {
                Self::Number(number.as_f64().unwrap_or(f64::NAN))
            }
            serde_json::Value::String(text) => Self::String(text),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => serializer.serialize_f64(*number),
            Self::String(text) => serializer.serialize_str(text),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Component(component) => {
                serializer.serialize_str(&format!("<component {}>", component.name()))
            }
            Self::Callback(_) => serializer.serialize_str("<callback>"),
            Self::Node(_) => serializer.serialize_str("<node>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_template_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Map(Map::new()).is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn numbers_print_like_text_nodes() {
        assert_eq!(format_number(123_456_789.0), "123456789");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn strict_equality_rejects_non_primitives() {
        assert!(Value::from("a").strict_eq(&Value::from("a")));
        assert!(!Value::from(1).strict_eq(&Value::from("1")));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));

        let map = Value::Map(Map::new());
        assert!(!map.strict_eq(&map.clone()));
        let callback = Value::Callback(Callback::new(|_| {}));
        assert!(!callback.strict_eq(&callback));
    }

    #[test]
    fn converts_json_documents() {
        let json = serde_json::json!(["div", {"id": "main"}, ["text", 3]]);
        let Value::List(items) = Value::from(json) else {
            panic!("expected a list");
        };
        assert_eq!(items[0].as_str(), Some("div"));
        assert!(matches!(&items[1], Value::Map(map) if map["id"].as_str() == Some("main")));
        assert!(matches!(&items[2], Value::List(children) if children[1].as_number() == Some(3.0)));
    }

    #[test]
    fn serializes_handles_as_placeholders() {
        let value = Value::List(vec![
            Value::from("a"),
            Value::Callback(Callback::new(|_| {})),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"["a","<callback>"]"#);
    }
}
