//! Tag string grammar.
//!
//! A tag string names the element and may carry an id, classes and inline
//! style:
//!
//! ```text
//! [spaces] name [spaces] [#id] [spaces] [.class]* [spaces] [| style] [spaces]
//! ```
//!
//! `name` is `[A-Za-z0-9_]+`, `id` and every class are `[-A-Za-z0-9_]+`.
//! Whitespace after the pipe is skipped, the style is taken verbatim up to
//! the trailing spaces and must contain at least one character.

use crate::{Error, Result};

// ============================================================================
// Public API
// ============================================================================

/// Components of a parsed tag string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSpec {
    /// Element name.
    pub name: String,
    /// Id given with `#id`.
    pub id: Option<String>,
    /// Classes given with `.class`, in order.
    pub classes: Vec<String>,
    /// Inline style given after `|`.
    pub style: Option<String>,
}

impl TagSpec {
    /// Parses a tag string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTag`] if `tag` does not match the grammar.
    pub fn parse(tag: &str) -> Result<Self> {
        parse_tag(tag).ok_or_else(|| Error::malformed_tag(tag))
    }
}

// ============================================================================
// Scanner
// ============================================================================

/// Word characters accepted in names.
const fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Characters accepted in ids and classes.
const fn is_ident(b: u8) -> bool {
    is_word(b) || b == b'-'
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Consumes a run of bytes matching `accept`, returning it if non-empty.
    fn take_while(&mut self, accept: fn(u8) -> bool) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(accept) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.text[start..self.pos])
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }
}

fn parse_tag(tag: &str) -> Option<TagSpec> {
    let mut cursor = Cursor::new(tag);

    cursor.skip_spaces();
    let name = cursor.take_while(is_word)?.to_owned();
    cursor.skip_spaces();

    let id = if cursor.eat(b'#') {
        Some(cursor.take_while(is_ident)?.to_owned())
    } else {
        None
    };
    cursor.skip_spaces();

    let mut classes = Vec::new();
    while cursor.eat(b'.') {
        classes.push(cursor.take_while(is_ident)?.to_owned());
    }
    cursor.skip_spaces();

    let style = if cursor.eat(b'|') {
        let style = cursor.rest().trim_start().trim_end_matches(' ');
        if style.is_empty() {
            return None;
        }
        Some(style.to_owned())
    } else {
        if !cursor.rest().bytes().all(|b| b == b' ') {
            return None;
        }
        None
    };

    Some(TagSpec {
        name,
        id,
        classes,
        style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn parse(tag: &str) -> TagSpec {
        TagSpec::parse(tag).unwrap()
    }

    #[test]
    fn bare_name() {
        assert_eq!(
            parse("div"),
            TagSpec {
                name: "div".into(),
                ..TagSpec::default()
            }
        );
    }

    #[test]
    fn full_grammar() {
        let spec = parse("div#id.a.b|color:red;");
        assert_eq!(spec.name, "div");
        assert_eq!(spec.id.as_deref(), Some("id"));
        assert_eq!(spec.classes, ["a", "b"]);
        assert_eq!(spec.style.as_deref(), Some("color:red;"));
    }

    #[test]
    fn spaces_between_parts() {
        let spec = parse("  span  #main  .x-1.y_2  |  top: 0; left: 1px   ");
        assert_eq!(spec.name, "span");
        assert_eq!(spec.id.as_deref(), Some("main"));
        assert_eq!(spec.classes, ["x-1", "y_2"]);
        assert_eq!(spec.style.as_deref(), Some("top: 0; left: 1px"));
    }

    #[test]
    fn style_keeps_special_characters() {
        let spec = parse("p|background: url(a#b.c) | x");
        assert_eq!(spec.style.as_deref(), Some("background: url(a#b.c) | x"));
    }

    #[test]
    fn rejects_malformed_tags() {
        for tag in [
            "", "   ", "#id", ".cls", "div#", "div.", "div#a#b", "div.a .b", "div|", "div|   ",
            "div!", "di v", "div.a#b", "dív",
        ] {
            let error = TagSpec::parse(tag).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::MalformedTag, "tag {tag:?}");
        }
    }
}
