//! Error taxonomy shared by every stage of the view pipeline.
//!
//! All failures are programmer errors: they are reported synchronously to the
//! caller and never caught or retried internally.

use crate::{InstanceId, Value};

/// Convenient result alias used across the view pipeline.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Machine-checkable category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A tag string does not match the tag grammar.
    MalformedTag,
    /// The attributes entry of an element is not a mapping.
    MalformedAttributes,
    /// The children entry of an element is not a sequence.
    MalformedChildren,
    /// The builder output has no recognizable shape.
    MalformedNode,
    /// An update handle was used after its component lost its slot.
    StaleComponentUpdate,
    /// The rendering target is not a live element node.
    InvalidTarget,
}

/// Error produced while building, rendering or updating a view.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A tag string does not match `name[#id][.class]*[|style]`.
    #[error("view.build: tag `{tag}` cannot be parsed")]
    MalformedTag {
        /// The offending tag string.
        tag: String,
    },
    /// The attributes entry is present but is not a mapping.
    #[error("view.build: attributes are not a mapping: {culprit:?}")]
    MalformedAttributes {
        /// The offending attributes entry.
        culprit: Value,
    },
    /// The children entry is present but is not a sequence.
    #[error("view.build: children are not a sequence: {culprit:?}")]
    MalformedChildren {
        /// The offending children entry.
        culprit: Value,
    },
    /// The value is neither empty, text, a tag sequence nor a component sequence.
    #[error("view.build: value is not a valid node: {culprit:?}")]
    MalformedNode {
        /// The offending value.
        culprit: Value,
    },
    /// The component behind an update handle no longer owns a slot.
    #[error("view.dom: component {instance} has lost its identity and can no longer be updated")]
    StaleComponentUpdate {
        /// The instance the handle was created for.
        instance: InstanceId,
    },
    /// The rendering target is unusable.
    #[error("view.dom: invalid target: {reason}")]
    InvalidTarget {
        /// Why the target was rejected.
        reason: String,
    },
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedTag { .. } => ErrorKind::MalformedTag,
            Self::MalformedAttributes { .. } => ErrorKind::MalformedAttributes,
            Self::MalformedChildren { .. } => ErrorKind::MalformedChildren,
            Self::MalformedNode { .. } => ErrorKind::MalformedNode,
            Self::StaleComponentUpdate { .. } => ErrorKind::StaleComponentUpdate,
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
        }
    }

    pub(crate) fn malformed_tag(tag: &str) -> Self {
        Self::MalformedTag {
            tag: tag.to_owned(),
        }
    }

    /// Creates a [`ErrorKind::StaleComponentUpdate`] error for `instance`.
    #[must_use]
    pub const fn stale(instance: InstanceId) -> Self {
        Self::StaleComponentUpdate { instance }
    }

    /// Creates a [`ErrorKind::InvalidTarget`] error.
    #[must_use]
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Error::malformed_tag("#").kind(), ErrorKind::MalformedTag);
        assert_eq!(
            Error::stale(InstanceId::new(3)).kind(),
            ErrorKind::StaleComponentUpdate
        );
        assert_eq!(
            Error::invalid_target("text node").kind(),
            ErrorKind::InvalidTarget
        );
    }

    #[test]
    fn stale_message_mentions_identity() {
        let message = Error::stale(InstanceId::new(7)).to_string();
        assert!(message.starts_with("view.dom"));
        assert!(message.contains("identity"));
    }

    #[test]
    fn messages_carry_culprit() {
        let error = Error::MalformedAttributes {
            culprit: Value::from("test"),
        };
        assert!(error.to_string().contains("attributes"));
        assert!(error.to_string().contains("test"));
    }
}
