//! Markup serialization.
//!
//! Properties are written as attributes: `className` becomes `class`, `key`
//! is omitted, `null`, `false` and non-primitive values are skipped and
//! `true` yields a bare attribute.

use std::fmt::Write;

use tidal_core::Value;

use crate::node::{Content, MemoryNode};

/// Properties that never show up as attributes.
const HIDDEN: &[&str] = &["key", "innerHTML", "nodeValue"];

pub(crate) fn write_node(out: &mut String, node: &MemoryNode) {
    let data = node.0.borrow();
    match &data.content {
        Content::Text { text } => escape_into(out, text, false),
        Content::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &data.properties {
                if HIDDEN.contains(&name.as_str()) {
                    continue;
                }
                write_attribute(out, attribute_name(name), value);
            }
            out.push('>');
            for child in &data.children {
                write_node(out, child);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn attribute_name(property: &str) -> &str {
    match property {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

fn write_attribute(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Bool(true) => {
            out.push(' ');
            out.push_str(name);
        }
        Value::String(_) | Value::Number(_) => {
            let Some(text) = value.to_text() else {
                return;
            };
            let _ = write!(out, " {name}=\"");
            escape_into(out, &text, true);
            out.push('"');
        }
        _ => {}
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
