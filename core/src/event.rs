//! Events delivered from the remote renderer.

use alloc::{string::String, vec::Vec};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event that should be relayed to its handler by the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEvent {
    /// The target id of the event handler.
    pub target: String,
    /// The event arguments, in order.
    #[serde(default)]
    pub data: Vec<Value>,
}

impl LayoutEvent {
    /// Creates an event for the given target.
    ///
    /// # Arguments
    ///
    /// * `target` - The target id the renderer received with the element
    /// * `data` - The event arguments
    #[must_use]
    pub fn new(target: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            data,
        }
    }
}
