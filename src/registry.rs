//! Mapping from target ids to the handlers currently mounted in the layout.

use std::collections::HashMap;

use tideline_core::EventHandler;

/// The live event handlers of a layout, by target id.
///
/// Lookups of unknown targets return `None`: an event may arrive for an element that
/// has already been unmounted.
#[derive(Debug, Default)]
pub struct EventRegistry {
    handlers: HashMap<String, EventHandler>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `target`, replacing any previous handler.
    pub fn insert(&mut self, target: impl Into<String>, handler: EventHandler) {
        self.handlers.insert(target.into(), handler);
    }

    /// Removes the handler registered under `target`, if any.
    pub fn remove(&mut self, target: &str) -> Option<EventHandler> {
        self.handlers.remove(target)
    }

    /// The handler registered under `target`.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&EventHandler> {
        self.handlers.get(target)
    }

    /// Whether a handler is registered under `target`.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.handlers.contains_key(target)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterates over the registered target ids.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrites_and_remove_is_idempotent() {
        let mut registry = EventRegistry::new();
        let first = EventHandler::sync(|_| Ok(()));
        let second = EventHandler::sync(|_| Ok(()));

        registry.insert("t1", first);
        registry.insert("t1", second.clone());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("t1").unwrap().same_function(&second));

        assert!(registry.remove("t1").is_some());
        assert!(registry.remove("t1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_targets_are_not_found() {
        let registry = EventRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(!registry.contains("missing"));
    }
}
