//! Serialized fragments sent to the remote renderer.
//!
//! A [`VdomJson`] is what an element looks like after reconciliation: live handlers have
//! been swapped for their [`EventTarget`] descriptors and components have been replaced
//! by whatever they rendered.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ImportSource, Key};

/// The descriptor of an event handler as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTarget {
    /// The opaque id events for this handler must be delivered to.
    pub target: String,
    /// Whether the renderer should prevent the default action.
    #[serde(default)]
    pub prevent_default: bool,
    /// Whether the renderer should stop propagation.
    #[serde(default)]
    pub stop_propagation: bool,
}

/// One serialized child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VdomJsonChild {
    /// A text leaf.
    Text(String),
    /// A nested fragment.
    Element(VdomJson),
}

impl VdomJsonChild {
    /// Returns the nested fragment, if this child is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&VdomJson> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Returns the text, if this child is a text leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }
}

/// A serialized fragment.
///
/// Optional members are omitted from the JSON output entirely, so an element without
/// attributes serializes as `{"tagName": "div"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VdomJson {
    /// The element's tag name. Empty for error fragments.
    pub tag_name: String,
    /// The key the element was rendered with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    /// The error message of a failed render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The element's attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    /// The element's children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<VdomJsonChild>>,
    /// Event handler descriptors by event name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_handlers: Option<BTreeMap<String, EventTarget>>,
    /// The module implementing this element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_source: Option<ImportSource>,
}

impl VdomJson {
    /// Creates a fragment with only a tag name.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Self::default()
        }
    }

    /// Creates the fragment that stands in for a component whose render failed.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if this is the fragment of a failed render.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The children, or an empty slice if the fragment has none.
    #[must_use]
    pub fn child_list(&self) -> &[VdomJsonChild] {
        self.children.as_deref().unwrap_or_default()
    }

    /// The nested fragment at `index`, skipping nothing: text leaves count as positions.
    #[must_use]
    pub fn child_element(&self, index: usize) -> Option<&Self> {
        self.child_list().get(index).and_then(VdomJsonChild::as_element)
    }

    /// The target id bound to `event`, if any.
    #[must_use]
    pub fn target_of(&self, event: &str) -> Option<&str> {
        self.event_handlers
            .as_ref()?
            .get(event)
            .map(|handler| handler.target.as_str())
    }
}
