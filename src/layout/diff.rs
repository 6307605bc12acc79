//! Diffing a rendered element against the node it replaces.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use tideline_core::{AnyComponent, EventHandler, EventTarget, VdomChild, VdomElement};
use uuid::Uuid;

use super::Layout;
use super::keys::{ChildKey, ChildKind, ClassifiedChild, classify_children, duplicate_keys};
use super::state::{LifeCycleState, Model, ModelChild, ModelState, StateId};
use crate::error::LayoutError;

impl Layout {
    /// Fills `new` from `element`, reusing what it can from `old`.
    pub(super) fn render_model(
        &mut self,
        old: Option<StateId>,
        new: StateId,
        element: VdomElement,
    ) -> Result<(), LayoutError> {
        let parts = element.into_parts();
        if let Some(state) = self.states.get_mut(new) {
            state.model = Some(Model::element(
                parts.tag_name,
                parts.key,
                parts.attributes,
                parts.import_source,
            ));
        }

        self.render_event_handlers(old, new, parts.event_handlers);
        self.render_children(old, new, parts.children)
    }

    /// Assigns target ids to `handlers` and registers them.
    ///
    /// An event the old node already had keeps its target; a new event takes the
    /// handler's own target or a fresh one. Targets of events that disappeared are
    /// unregistered.
    fn render_event_handlers(
        &mut self,
        old: Option<StateId>,
        new: StateId,
        handlers: BTreeMap<String, EventHandler>,
    ) {
        let old_targets = old
            .and_then(|old| self.states.get(old))
            .map(|state| state.targets_by_event.clone())
            .unwrap_or_default();

        for (event, target) in &old_targets {
            if !handlers.contains_key(event) {
                self.event_handlers.remove(target);
            }
        }

        if handlers.is_empty() {
            return;
        }

        let mut targets = IndexMap::with_capacity(handlers.len());
        let mut descriptors = BTreeMap::new();
        for (event, handler) in handlers {
            let target = old_targets
                .get(&event)
                .cloned()
                .or_else(|| handler.target().map(str::to_string))
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

            descriptors.insert(
                event.clone(),
                EventTarget {
                    target: target.clone(),
                    prevent_default: handler.prevent_default(),
                    stop_propagation: handler.stop_propagation(),
                },
            );
            self.event_handlers.insert(target.clone(), handler);
            targets.insert(event, target);
        }

        if let Some(state) = self.states.get_mut(new) {
            state.targets_by_event = targets;
            state.model_mut().event_handlers = Some(descriptors);
        }
    }

    /// Matches the new children against the old node's children by key.
    fn render_children(
        &mut self,
        old: Option<StateId>,
        new: StateId,
        children: Vec<VdomChild>,
    ) -> Result<(), LayoutError> {
        let children = classify_children(children, self.config.index_as_default_key);
        let Some(new_state) = self.states.get(new) else {
            return Ok(());
        };
        let parent_path = new_state.patch_path.clone();

        let duplicates = duplicate_keys(&children);
        if !duplicates.is_empty() {
            return Err(LayoutError::DuplicateKeys {
                path: new_state.display_path(),
                keys: duplicates,
            });
        }

        if let Some(old) = old {
            self.unmount_stale_children(old, &children);
        }

        if children.is_empty() {
            return Ok(());
        }
        if let Some(state) = self.states.get_mut(new) {
            state.model_mut().children = Some(Vec::with_capacity(children.len()));
        }

        for (index, ClassifiedChild { key, kind }) in children.into_iter().enumerate() {
            // Text leaves are not key-tracked and never claim an old node.
            let old_child = match kind {
                ChildKind::Text(_) => None,
                ChildKind::Element(_) | ChildKind::Component(_) => old.and_then(|old| {
                    self.states
                        .get_mut(old)
                        .and_then(|state| state.children_by_key.shift_remove(&key))
                }),
            };

            match kind {
                ChildKind::Element(element) => {
                    self.render_element_child(old_child, new, &parent_path, index, key, element)?;
                }
                ChildKind::Component(component) => {
                    self.render_component_child(
                        old_child,
                        new,
                        &parent_path,
                        index,
                        key,
                        component,
                    )?;
                }
                ChildKind::Text(text) => {
                    if let Some(state) = self.states.get_mut(new) {
                        state
                            .model_mut()
                            .children
                            .get_or_insert_with(Vec::new)
                            .push(ModelChild::Text(text));
                    }
                }
            }
        }

        Ok(())
    }

    fn unmount_stale_children(&mut self, old: StateId, children: &[ClassifiedChild]) {
        let new_keys: HashSet<&ChildKey> = children
            .iter()
            .filter(|child| !matches!(child.kind, ChildKind::Text(_)))
            .map(|child| &child.key)
            .collect();
        let Some(old_state) = self.states.get_mut(old) else {
            return;
        };

        let stale_keys: Vec<ChildKey> = old_state
            .children_by_key
            .keys()
            .filter(|key| !new_keys.contains(key))
            .cloned()
            .collect();
        let stale: Vec<StateId> = stale_keys
            .iter()
            .filter_map(|key| old_state.children_by_key.shift_remove(key))
            .collect();

        self.unmount(stale);
    }

    fn render_element_child(
        &mut self,
        old_child: Option<StateId>,
        parent: StateId,
        parent_path: &str,
        index: usize,
        key: ChildKey,
        element: VdomElement,
    ) -> Result<(), LayoutError> {
        let component_path = old_child
            .and_then(|old_child| self.states.get(old_child))
            .filter(|state| state.life_cycle_state.is_some())
            .map(ModelState::display_path);
        if let (Some(old_child), Some(path)) = (old_child, component_path) {
            self.unmount(vec![old_child]);
            return Err(LayoutError::ComponentBecameElement { path, key });
        }

        let child = self.states.insert(ModelState::child(
            parent,
            parent_path,
            index,
            key.clone(),
            None,
        ));
        if let Some(state) = self.states.get_mut(parent) {
            state.children_by_key.insert(key, child);
            state
                .model_mut()
                .children
                .get_or_insert_with(Vec::new)
                .push(ModelChild::State(child));
        }

        let result = self.render_model(old_child, child, element);
        if let Some(old_child) = old_child {
            if result.is_err() {
                self.discard_leftovers(old_child);
            }
            self.states.remove(old_child);
        }
        result
    }

    fn render_component_child(
        &mut self,
        old_child: Option<StateId>,
        parent: StateId,
        parent_path: &str,
        index: usize,
        key: ChildKey,
        component: AnyComponent,
    ) -> Result<(), LayoutError> {
        let previous = old_child
            .and_then(|old_child| self.states.get(old_child))
            .map(|state| (state.life_cycle_state.clone(), state.display_path()));
        let life_cycle_state = match (old_child, previous) {
            (Some(_), Some((Some(previous), _))) => LifeCycleState {
                component,
                ..previous
            },
            (Some(old_child), Some((None, path))) => {
                self.unmount(vec![old_child]);
                return Err(LayoutError::ElementBecameComponent { path, key });
            }
            _ => self.new_life_cycle_state(component),
        };

        let child = self.states.insert(ModelState::child(
            parent,
            parent_path,
            index,
            key,
            Some(life_cycle_state),
        ));
        self.render_component(old_child, child);
        Ok(())
    }
}
