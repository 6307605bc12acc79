//! Errors raised by the layout engine.

use core::any::Any;

use alloc::string::{String, ToString};
use tideline_core::{Key, ValidationError};

use crate::layout::keys::ChildKey;

/// Errors that can occur while mounting or rendering a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The root of a layout must be a component.
    #[error("expected a component, not {found}")]
    NotAComponent {
        /// What was passed instead.
        found: &'static str,
    },
    /// Two siblings resolved to the same key.
    #[error("duplicate keys [{}] at '{path}'", join_keys(keys))]
    DuplicateKeys {
        /// The patch path of the parent, `/` for the root.
        path: String,
        /// Every key that occurred more than once.
        keys: Vec<ChildKey>,
    },
    /// A key that used to hold an element now holds a component.
    #[error(
        "failed to render layout at '{path}' with key {key} - prior element with this key wasn't a component"
    )]
    ElementBecameComponent {
        /// The patch path of the prior element.
        path: String,
        /// The reused key.
        key: ChildKey,
    },
    /// A key that used to hold a component now holds an element.
    #[error(
        "failed to render layout at '{path}' with key {key} - prior element with this key was a component"
    )]
    ComponentBecameElement {
        /// The patch path of the prior component.
        path: String,
        /// The reused key.
        key: ChildKey,
    },
    /// The rendered output failed the schema check.
    #[error(transparent)]
    InvalidVdom(#[from] ValidationError),
    /// Every handle able to schedule renders is gone.
    #[error("the render queue has been closed")]
    QueueClosed,
    /// A fragment could not be converted to JSON.
    #[error("failed to serialize vdom: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LayoutError {
    /// The explicit keys involved in a duplicate-key error.
    #[must_use]
    pub fn duplicate_keys(&self) -> Vec<Key> {
        match self {
            Self::DuplicateKeys { keys, .. } => {
                keys.iter().filter_map(|key| key.explicit().cloned()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn join_keys(keys: &[ChildKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_message_names_keys_and_path() {
        let error = LayoutError::DuplicateKeys {
            path: "/".to_string(),
            keys: vec![ChildKey::Explicit(Key::from("x"))],
        };
        assert_eq!(error.to_string(), "duplicate keys [\"x\"] at '/'");
        assert_eq!(error.duplicate_keys(), vec![Key::from("x")]);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(boxed.as_ref()), "Unknown panic");
    }
}
