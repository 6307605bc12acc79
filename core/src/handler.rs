//! Event handlers attached to elements.
//!
//! An element names its handlers by event (`"onClick"`, `"onChange"`, ...). The layout
//! assigns every handler an opaque target id, ships `{target, preventDefault,
//! stopPropagation}` to the remote renderer, and routes incoming events for that target
//! back to the handler.
//!
//! - [`Handler`] - the object-safe trait behind every handler
//! - [`EventHandler`] - a shared handler plus its delivery flags and optional fixed target
//! - [`into_handler`] / [`into_sync_handler`] - adapt closures into handlers

use alloc::{rc::Rc, string::String, vec::Vec};
use core::{any::type_name, fmt::Debug, future::Future, marker::PhantomData};

use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;

/// Handler trait that processes the arguments of one delivered event.
///
/// Handlers run on the layout's execution context and may suspend; the returned future
/// owns everything it needs so delivery never borrows the layout.
pub trait Handler: 'static {
    /// Handles one event with its ordered arguments.
    fn handle(&self, data: Vec<Value>) -> LocalBoxFuture<'static, anyhow::Result<()>>;
}

impl Debug for dyn Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(type_name::<Self>())
    }
}

/// A shared handler with dynamic dispatch.
pub type SharedHandler = Rc<dyn Handler>;

/// Wrapper that converts an async function into a handler.
#[derive(Debug, Clone)]
pub struct IntoHandler<H, Fut> {
    h: H,
    _marker: PhantomData<Fut>,
}

impl<H, Fut> Handler for IntoHandler<H, Fut>
where
    H: Fn(Vec<Value>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    fn handle(&self, data: Vec<Value>) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        (self.h)(data).boxed_local()
    }
}

/// Converts an async function into a handler.
pub const fn into_handler<H, Fut>(h: H) -> IntoHandler<H, Fut>
where
    H: Fn(Vec<Value>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    IntoHandler {
        h,
        _marker: PhantomData,
    }
}

/// Wrapper that converts a synchronous function into a handler.
#[derive(Debug, Clone)]
pub struct IntoSyncHandler<H> {
    h: H,
}

impl<H> Handler for IntoSyncHandler<H>
where
    H: Fn(Vec<Value>) -> anyhow::Result<()> + 'static,
{
    fn handle(&self, data: Vec<Value>) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        futures::future::ready((self.h)(data)).boxed_local()
    }
}

/// Converts a synchronous function into a handler.
pub const fn into_sync_handler<H>(h: H) -> IntoSyncHandler<H>
where
    H: Fn(Vec<Value>) -> anyhow::Result<()> + 'static,
{
    IntoSyncHandler { h }
}

/// A handler bound to an element event, together with its delivery flags.
#[derive(Clone)]
pub struct EventHandler {
    function: SharedHandler,
    prevent_default: bool,
    stop_propagation: bool,
    target: Option<String>,
}

impl Debug for EventHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventHandler")
            .field("prevent_default", &self.prevent_default)
            .field("stop_propagation", &self.stop_propagation)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl EventHandler {
    /// Creates an event handler from any [`Handler`].
    pub fn from_handler(handler: impl Handler) -> Self {
        Self {
            function: Rc::new(handler),
            prevent_default: false,
            stop_propagation: false,
            target: None,
        }
    }

    /// Creates an event handler from an async function.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tideline_core::EventHandler;
    ///
    /// let handler = EventHandler::new(|data| async move {
    ///     assert!(data.is_empty());
    ///     Ok(())
    /// });
    /// assert!(!handler.prevent_default());
    /// ```
    pub fn new<H, Fut>(h: H) -> Self
    where
        H: Fn(Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self::from_handler(into_handler(h))
    }

    /// Creates an event handler from a synchronous function.
    pub fn sync<H>(h: H) -> Self
    where
        H: Fn(Vec<Value>) -> anyhow::Result<()> + 'static,
    {
        Self::from_handler(into_sync_handler(h))
    }

    /// Asks the renderer to prevent the browser's default action.
    #[must_use]
    pub const fn with_prevent_default(mut self, value: bool) -> Self {
        self.prevent_default = value;
        self
    }

    /// Asks the renderer to stop the event from propagating.
    #[must_use]
    pub const fn with_stop_propagation(mut self, value: bool) -> Self {
        self.stop_propagation = value;
        self
    }

    /// Pins the target id used the first time this handler is mounted.
    ///
    /// Without a fixed target the layout mints a fresh one.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Whether the renderer should prevent the default action.
    #[must_use]
    pub const fn prevent_default(&self) -> bool {
        self.prevent_default
    }

    /// Whether the renderer should stop propagation.
    #[must_use]
    pub const fn stop_propagation(&self) -> bool {
        self.stop_propagation
    }

    /// The fixed target id, if one was requested.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns `true` if both handlers share the same underlying function.
    #[must_use]
    pub fn same_function(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.function, &other.function)
    }

    /// Invokes the handler with the event arguments.
    pub fn call(&self, data: Vec<Value>) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        self.function.handle(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use futures::executor::block_on;

    #[test]
    fn sync_handler_receives_arguments() {
        let seen = Rc::new(Cell::new(0));
        let handler = EventHandler::sync({
            let seen = Rc::clone(&seen);
            move |data| {
                seen.set(data.len());
                Ok(())
            }
        });

        block_on(handler.call(vec![Value::from(1), Value::from("two")])).unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn flags_and_target_are_builder_options() {
        let handler = EventHandler::sync(|_| Ok(()))
            .with_prevent_default(true)
            .with_stop_propagation(true)
            .with_target("t1");

        assert!(handler.prevent_default());
        assert!(handler.stop_propagation());
        assert_eq!(handler.target(), Some("t1"));
    }

    #[test]
    fn clones_share_the_function() {
        let handler = EventHandler::new(|_| async { Ok(()) });
        let other = EventHandler::new(|_| async { Ok(()) });
        assert!(handler.same_function(&handler.clone()));
        assert!(!handler.same_function(&other));
    }
}
