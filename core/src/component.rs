//! The component capability.
//!
//! A component is anything that can describe a piece of the tree on demand. The layout
//! engine calls [`Component::render`] whenever the component is first mounted and every
//! time it has been scheduled for a re-render, then reconciles the returned
//! [`VdomElement`] against what the component rendered last time.
//!
//! Components are shared through [`AnyComponent`] (a reference-counted trait object) so
//! the same instance can live inside an element tree and inside the engine's bookkeeping.

use alloc::rc::Rc;
use core::any::type_name;
use core::fmt;

use crate::{Key, VdomElement};

/// A type-erased, shared component.
pub type AnyComponent = Rc<dyn Component>;

/// Something that renders into a [`VdomElement`].
///
/// Identity across renders is decided by the component's position and [`Component::key`]:
/// a component rendered at the same key under the same parent keeps its life-cycle state
/// (and therefore its hook) even though a new instance is passed in.
pub trait Component: 'static {
    /// Produces the element this component currently stands for.
    ///
    /// # Errors
    ///
    /// Any error is caught by the layout, logged, and replaced by an error fragment.
    fn render(&self) -> anyhow::Result<VdomElement>;

    /// The key used to match this component against its previous render.
    fn key(&self) -> Option<Key> {
        None
    }

    /// A human readable name used in logs and in the layout's `Display` output.
    fn name(&self) -> &str {
        short_type_name(type_name::<Self>())
    }

    /// Wraps this component into an [`AnyComponent`].
    fn into_any(self) -> AnyComponent
    where
        Self: Sized,
    {
        Rc::new(self)
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("key", &self.key())
            .finish()
    }
}

fn short_type_name(name: &str) -> &str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

/// A component backed by a closure.
///
/// Created with [`component`].
pub struct ComponentFn<F> {
    name: &'static str,
    key: Option<Key>,
    render: F,
}

impl<F> fmt::Debug for ComponentFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFn")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<F> ComponentFn<F>
where
    F: Fn() -> anyhow::Result<VdomElement> + 'static,
{
    /// Sets the key of this component.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }
}

impl<F> Component for ComponentFn<F>
where
    F: Fn() -> anyhow::Result<VdomElement> + 'static,
{
    fn render(&self) -> anyhow::Result<VdomElement> {
        (self.render)()
    }

    fn key(&self) -> Option<Key> {
        self.key.clone()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Creates a named component from a render closure.
///
/// # Example
///
/// ```rust
/// use tideline_core::{Component, component, vdom};
///
/// let greeting = component("Greeting", || Ok(vdom!("p", ["hello"]))).key("greeting");
/// assert_eq!(greeting.name(), "Greeting");
/// ```
pub const fn component<F>(name: &'static str, render: F) -> ComponentFn<F>
where
    F: Fn() -> anyhow::Result<VdomElement> + 'static,
{
    ComponentFn {
        name,
        key: None,
        render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdom;

    struct Counter;

    impl Component for Counter {
        fn render(&self) -> anyhow::Result<VdomElement> {
            Ok(vdom!("div"))
        }
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Counter.name(), "Counter");
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
    }

    #[test]
    fn closure_component_carries_key() {
        let component = component("Item", || Ok(vdom!("li"))).key(4);
        assert_eq!(Component::key(&component), Some(Key::Int(4)));
        assert_eq!(component.render().unwrap().tag_name(), "li");
    }
}
