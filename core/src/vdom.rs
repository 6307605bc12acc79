//! The element tree a component renders into.
//!
//! [`VdomElement`] is the raw, not yet reconciled description of a node: it still holds
//! live event handlers and unrendered child components. The layout turns it into the
//! serializable [`VdomJson`](crate::VdomJson) fragment.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AnyComponent, Component, EventHandler, Key};

/// Where a custom element's implementation is loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// A module resolved by name by the renderer.
    Name,
    /// A module loaded from a URL, usually a CDN.
    Url,
}

/// Tells the renderer which module implements an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSource {
    /// The module name or URL.
    pub source: String,
    /// How [`ImportSource::source`] should be interpreted.
    pub source_type: SourceType,
    /// What to display while the module is being loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
    /// Whether the element must be unmounted before each update.
    #[serde(default)]
    pub unmount_before_update: bool,
}

impl ImportSource {
    /// Creates an import source without a fallback.
    #[must_use]
    pub fn new(source: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            source: source.into(),
            source_type,
            fallback: None,
            unmount_before_update: false,
        }
    }

    /// Sets the fallback displayed while loading.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<Value>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Requires the renderer to unmount the element before every update.
    #[must_use]
    pub const fn with_unmount_before_update(mut self, value: bool) -> Self {
        self.unmount_before_update = value;
        self
    }
}

/// One child of a [`VdomElement`].
///
/// Children are classified once, when they are added: anything that is neither an element
/// nor a component is stored as text.
#[derive(Debug, Clone)]
pub enum VdomChild {
    /// A nested element.
    Element(VdomElement),
    /// A component rendered in place.
    Component(AnyComponent),
    /// An opaque text leaf.
    Text(String),
}

impl VdomChild {
    /// Wraps a component into a child.
    pub fn component(component: impl Component) -> Self {
        Self::Component(component.into_any())
    }

    /// The key this child carries, if it set one.
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        match self {
            Self::Element(element) => element.key.clone(),
            Self::Component(component) => component.key(),
            Self::Text(_) => None,
        }
    }
}

impl From<VdomElement> for VdomChild {
    fn from(value: VdomElement) -> Self {
        Self::Element(value)
    }
}

impl From<AnyComponent> for VdomChild {
    fn from(value: AnyComponent) -> Self {
        Self::Component(value)
    }
}

impl From<String> for VdomChild {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for VdomChild {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

macro_rules! impl_text_child {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for VdomChild {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_text_child!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// A raw element: tag, attributes, children and event handlers.
///
/// # Example
///
/// ```rust
/// use tideline_core::{EventHandler, VdomElement};
///
/// let button = VdomElement::new("button")
///     .attribute("id", "save")
///     .on("onClick", EventHandler::sync(|_| Ok(())))
///     .child("Save")
///     .key("save");
/// assert_eq!(button.tag_name(), "button");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VdomElement {
    tag_name: String,
    key: Option<Key>,
    attributes: Option<Map<String, Value>>,
    children: Vec<VdomChild>,
    event_handlers: BTreeMap<String, EventHandler>,
    import_source: Option<ImportSource>,
}

impl VdomElement {
    /// Creates an element with the given tag name.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Self::default()
        }
    }

    /// Sets the element's key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets one attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replaces all attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<VdomChild>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VdomChild>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Appends a component child.
    #[must_use]
    pub fn component(self, component: impl Component) -> Self {
        self.child(VdomChild::component(component))
    }

    /// Binds a handler to an event.
    #[must_use]
    pub fn on(mut self, event: impl Into<String>, handler: EventHandler) -> Self {
        self.event_handlers.insert(event.into(), handler);
        self
    }

    /// Sets the module that implements this element.
    #[must_use]
    pub fn import_source(mut self, source: ImportSource) -> Self {
        self.import_source = Some(source);
        self
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// The element's own key.
    #[must_use]
    pub const fn element_key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// The element's children.
    #[must_use]
    pub fn child_nodes(&self) -> &[VdomChild] {
        &self.children
    }

    /// The element's handlers by event name.
    #[must_use]
    pub const fn event_handlers(&self) -> &BTreeMap<String, EventHandler> {
        &self.event_handlers
    }

    /// Splits the element into its parts.
    #[must_use]
    pub fn into_parts(self) -> VdomParts {
        VdomParts {
            tag_name: self.tag_name,
            key: self.key,
            attributes: self.attributes,
            children: self.children,
            event_handlers: self.event_handlers,
            import_source: self.import_source,
        }
    }
}

/// The fields of a [`VdomElement`], as produced by [`VdomElement::into_parts`].
#[derive(Debug)]
#[allow(missing_docs)]
pub struct VdomParts {
    pub tag_name: String,
    pub key: Option<Key>,
    pub attributes: Option<Map<String, Value>>,
    pub children: Vec<VdomChild>,
    pub event_handlers: BTreeMap<String, EventHandler>,
    pub import_source: Option<ImportSource>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component;

    #[test]
    fn primitives_become_text_children() {
        let element = VdomElement::new("p").child(1).child(true).child("x");
        let texts: Vec<_> = element
            .child_nodes()
            .iter()
            .map(|child| match child {
                VdomChild::Text(text) => text.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(texts, ["1", "true", "x"]);
    }

    #[test]
    fn child_keys_come_from_elements_and_components() {
        let element = VdomElement::new("div")
            .child(VdomElement::new("span").key("a"))
            .component(component("C", || Ok(VdomElement::new("i"))).key(2))
            .child("text");
        let keys: Vec<_> = element.child_nodes().iter().map(VdomChild::key).collect();
        assert_eq!(keys, [Some(Key::from("a")), Some(Key::Int(2)), None]);
    }

    #[test]
    fn import_source_serializes_in_camel_case() {
        let source = ImportSource::new("chart", SourceType::Name).with_unmount_before_update(true);
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"source": "chart", "sourceType": "NAME", "unmountBeforeUpdate": true})
        );
    }
}
