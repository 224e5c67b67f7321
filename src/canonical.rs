//! Builder output normalization.
//!
//! Turns a [`Value`] into a canonical [`VNode`]. Components are resolved on
//! the way: each one met gets a fresh instance whose first render is
//! canonicalized in its place.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use tidal_core::{
    ComponentRef, Dispatch, Error, InstanceId, Map, Props, Result, TagSpec, Updater, VNode, Value,
    flatten_class, value::format_number,
};
use tracing::trace;

use crate::registry::Registry;

/// Canonicalizes builder output without binding it to a runtime.
///
/// Components are resolved, but their instances are discarded right away,
/// so the updaters they received report stale.
///
/// # Errors
///
/// Returns the first malformed tag, attribute mapping, child sequence or node
/// met during the traversal.
pub fn canonicalize(view: impl Into<Value>) -> Result<VNode> {
    struct Detached;

    impl Dispatch for Detached {
        fn dispatch(&self, handle: &Rc<tidal_core::InstanceHandle>, _: Vec<Value>) -> Result<()> {
            Err(Error::stale(handle.origin()))
        }
    }

    let registry = RefCell::new(Registry::default());
    let sink: Weak<dyn Dispatch> = Weak::<Detached>::new();
    let mut canonicalizer = Canonicalizer::new(&registry, sink);
    let result = canonicalizer.canonicalize(view.into());
    let created = canonicalizer.into_created();
    let mut registry = registry.borrow_mut();
    for id in created {
        registry.invalidate(id);
    }
    result
}

pub(crate) struct Canonicalizer<'a> {
    registry: &'a RefCell<Registry>,
    sink: Weak<dyn Dispatch>,
    created: Vec<InstanceId>,
}

impl<'a> Canonicalizer<'a> {
    pub(crate) fn new(registry: &'a RefCell<Registry>, sink: Weak<dyn Dispatch>) -> Self {
        Self {
            registry,
            sink,
            created: Vec::new(),
        }
    }

    /// Instances created so far, in creation order.
    pub(crate) fn into_created(self) -> Vec<InstanceId> {
        self.created
    }

    pub(crate) fn canonicalize(&mut self, value: Value) -> Result<VNode> {
        match value {
            Value::Null | Value::Bool(_) => Ok(VNode::text("")),
            Value::Number(number) => Ok(VNode::text(format_number(number))),
            Value::String(text) => Ok(VNode::text(text)),
            Value::Node(node) => Ok(*node),
            Value::List(items) => self.sequence(items),
            culprit @ (Value::Map(_) | Value::Component(_) | Value::Callback(_)) => {
                Err(Error::MalformedNode { culprit })
            }
        }
    }

    fn sequence(&mut self, items: Vec<Value>) -> Result<VNode> {
        let mut entries = items.into_iter();
        match entries.next() {
            Some(Value::String(tag)) => {
                let attrs = attributes(entries.next())?;
                let children = children(entries.next())?;
                self.element(&tag, attrs, children)
            }
            Some(Value::Component(component)) => {
                let attrs = attributes(entries.next())?;
                let children = children(entries.next())?;
                self.component(&component, attrs, children)
            }
            head => Err(Error::MalformedNode {
                culprit: Value::List(head.into_iter().chain(entries).collect()),
            }),
        }
    }

    fn element(&mut self, tag: &str, attrs: Map, children: Vec<Value>) -> Result<VNode> {
        let spec = TagSpec::parse(tag)?;
        let attrs = merge(spec.id, &spec.classes, spec.style, attrs);
        let key = key_of(&attrs);
        let children = children
            .into_iter()
            .map(|child| self.canonicalize(child))
            .collect::<Result<Vec<_>>>()?;
        let mut node = VNode::element(spec.name, attrs, children);
        node.key = key;
        Ok(node)
    }

    fn component(
        &mut self,
        component: &ComponentRef,
        mut attrs: Map,
        children: Vec<Value>,
    ) -> Result<VNode> {
        let children = children
            .into_iter()
            .map(|child| self.canonicalize(child).map(Value::from))
            .collect::<Result<Vec<_>>>()?;
        let key = key_of(&attrs);
        attrs.insert("children".to_owned(), Value::List(children));

        let (id, handle) = self.registry.borrow_mut().allocate(component);
        self.created.push(id);
        trace!(instance = %id, component = component.name(), "creating component instance");

        let updater = Updater::new(handle, self.sink.clone());
        let renderer = Rc::new(RefCell::new(component.initialize(Props::new(attrs), updater)));
        self.registry.borrow_mut().install(id, renderer.clone());

        let output = renderer.borrow_mut().render(&[]);
        let mut node = self.canonicalize(output)?;
        node.components.insert(0, id);
        if node.key.is_none() {
            node.key = key;
        }
        Ok(node)
    }
}

fn attributes(entry: Option<Value>) -> Result<Map> {
    match entry {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Map(map)) => Ok(map),
        Some(culprit) => Err(Error::MalformedAttributes { culprit }),
    }
}

fn children(entry: Option<Value>) -> Result<Vec<Value>> {
    match entry {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::List(items)) => Ok(items),
        Some(culprit) => Err(Error::MalformedChildren { culprit }),
    }
}

fn key_of(attrs: &Map) -> Option<String> {
    match attrs.get("key")? {
        Value::String(key) => Some(key.clone()),
        Value::Number(number) => Some(format_number(*number)),
        _ => None,
    }
}

/// Folds the id, classes and style of a tag string into the attributes.
fn merge(id: Option<String>, classes: &[String], style: Option<String>, mut attrs: Map) -> Map {
    if let Some(id) = id {
        attrs.entry("id".to_owned()).or_insert(Value::String(id));
    }

    if let Some(current) = attrs.get_mut("className") {
        let mut class = flatten_class(current);
        append_classes(&mut class, classes);
        *current = Value::String(class);
    } else if !classes.is_empty() {
        let mut class = String::new();
        append_classes(&mut class, classes);
        attrs.insert("className".to_owned(), Value::String(class));
    }

    if let Some(style) = style {
        let current = attrs
            .get("style")
            .filter(|value| !matches!(value, Value::Null))
            .and_then(Value::to_text);
        let merged = match current {
            Some(current) => format!("{current};{style}"),
            None => style,
        };
        attrs.insert("style".to_owned(), Value::String(merged));
    }

    attrs
}

fn append_classes(class: &mut String, classes: &[String]) {
    for name in classes {
        if !class.is_empty() {
            class.push(' ');
        }
        class.push_str(name);
    }
}

#[cfg(test)]
mod tests {
    use tidal_core::{ErrorKind, VNodeKind, attrs, component, list};

    use super::*;

    fn element(node: &VNode) -> &tidal_core::Element {
        node.as_element().expect("expected an element")
    }

    #[test]
    fn primitives_become_text() {
        assert_eq!(canonicalize(Value::Null).unwrap().as_text(), Some(""));
        assert_eq!(canonicalize(true).unwrap().as_text(), Some(""));
        assert_eq!(canonicalize(false).unwrap().as_text(), Some(""));
        assert_eq!(canonicalize("test").unwrap().as_text(), Some("test"));
        assert_eq!(canonicalize(123_456_789).unwrap().as_text(), Some("123456789"));
    }

    #[test]
    fn sequences_become_elements() {
        let node = canonicalize(list!["test", attrs! { "id" => "x" }, list!["child"]]).unwrap();
        let element = element(&node);
        assert_eq!(element.tag, "test");
        assert_eq!(element.attrs["id"].as_str(), Some("x"));
        assert_eq!(element.children[0].as_text(), Some("child"));
    }

    #[test]
    fn attributes_and_children_may_be_omitted() {
        let node = canonicalize(list!["div"]).unwrap();
        assert!(element(&node).attrs.is_empty());
        assert!(element(&node).children.is_empty());

        let node = canonicalize(list!["div", Value::Null, Value::Null]).unwrap();
        assert!(element(&node).children.is_empty());
    }

    #[test]
    fn malformed_shapes_are_reported() {
        let cases = [
            (list![attrs! {}], ErrorKind::MalformedNode),
            (list![], ErrorKind::MalformedNode),
            (Value::Map(Map::new()), ErrorKind::MalformedNode),
            (list!["div", "test"], ErrorKind::MalformedAttributes),
            (list!["div", attrs! {}, "test"], ErrorKind::MalformedChildren),
            (list!["#nope"], ErrorKind::MalformedTag),
            (list!["div", attrs! {}, list![list!["a b"]]], ErrorKind::MalformedTag),
        ];
        for (value, kind) in cases {
            assert_eq!(canonicalize(value).unwrap_err().kind(), kind);
        }
    }

    #[test]
    fn malformed_attributes_carry_culprit() {
        let error = canonicalize(list!["div", "test"]).unwrap_err();
        assert!(matches!(error, Error::MalformedAttributes { culprit: Value::String(ref s) } if s == "test"));
    }

    #[test]
    fn tag_parts_merge_with_attributes() {
        let node = canonicalize(list![
            "test#tag-id.test4|height:2px;",
            attrs! {
                "id" => "attr-id",
                "className" => list!["test1", attrs! { "test2" => false, "test3" => true }, list!["test5"]],
                "style" => "width: 2px",
            },
        ])
        .unwrap();
        let attrs = &element(&node).attrs;
        assert_eq!(attrs["id"].as_str(), Some("attr-id"));
        assert_eq!(attrs["className"].as_str(), Some("test1 test3 test5 test4"));
        assert_eq!(attrs["style"].as_str(), Some("width: 2px;height:2px;"));
    }

    #[test]
    fn merged_keys_are_appended_in_order() {
        let node = canonicalize(list!["div#a.b|c:d", attrs! { "title" => "t" }]).unwrap();
        let keys: Vec<_> = element(&node).attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "id", "className", "style"]);
    }

    #[test]
    fn class_name_is_flattened_without_tag_classes() {
        let node = canonicalize(list!["div", attrs! { "className" => attrs! { "on" => true, "off" => Value::Null } }]).unwrap();
        assert_eq!(element(&node).attrs["className"].as_str(), Some("on"));
    }

    #[test]
    fn key_attribute_keys_the_node() {
        let node = canonicalize(list!["li", attrs! { "key" => "a" }]).unwrap();
        assert_eq!(node.key.as_deref(), Some("a"));
        let node = canonicalize(list!["li", attrs! { "key" => 7 }]).unwrap();
        assert_eq!(node.key.as_deref(), Some("7"));
    }

    #[test]
    fn components_receive_props_and_children() {
        let echo = component(|props, _| {
            let label = props.get("a").cloned().unwrap_or_default();
            let first = props.children().first().cloned().unwrap_or_default();
            move |_: &[Value]| list!["span", attrs! {}, list![label.clone(), first.clone()]]
        });
        let node = canonicalize(list![echo, attrs! { "a" => "test", "key" => "k" }, list!["child"]]).unwrap();
        assert_eq!(node.key.as_deref(), Some("k"));
        assert_eq!(node.components.len(), 1);
        let children = &element(&node).children;
        assert_eq!(children[0].as_text(), Some("test"));
        assert_eq!(children[1].as_text(), Some("child"));
    }

    #[test]
    fn nested_components_stack_outermost_first() {
        let inner = component(|props, _| {
            let c = props.get("c").cloned().unwrap_or_default();
            move |_: &[Value]| c.clone()
        });
        let outer = component(move |props, _| {
            let inner = inner.clone();
            let a = props.get("a").cloned().unwrap_or_default();
            move |_: &[Value]| list![inner.clone(), attrs! { "c" => a.clone() }]
        });
        let node = canonicalize(list![outer, attrs! { "a" => "test" }]).unwrap();
        assert!(matches!(node.kind, VNodeKind::Text(ref text) if text == "test"));
        assert_eq!(node.components.len(), 2);
        assert!(node.components[0] < node.components[1]);
    }

    #[test]
    fn detached_updaters_are_stale() {
        let captured = Rc::new(RefCell::new(None));
        let sink = captured.clone();
        let widget = component(move |_, updater| {
            *sink.borrow_mut() = Some(updater);
            |_: &[Value]| Value::Null
        });
        canonicalize(list![widget]).unwrap();
        let updater = captured.borrow_mut().take().unwrap();
        assert_eq!(
            updater.update(vec![]).unwrap_err().kind(),
            ErrorKind::StaleComponentUpdate
        );
    }
}
