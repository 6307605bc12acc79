//! The model-state tree.
//!
//! Nodes live in a generational arena. A node refers to its parent by [`StateId`], which
//! is never an ownership edge: the parent owns its children through `children_by_key`,
//! and a retired or unmounted id simply stops resolving.

use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use slotmap::SlotMap;
use tideline_core::{AnyComponent, EventTarget, ImportSource, Key, VdomJson, VdomJsonChild};

use crate::hooks::{LifeCycleHook, LifeCycleStateId};
use crate::layout::keys::ChildKey;

slotmap::new_key_type! {
    /// Address of a node in the model-state arena.
    pub struct StateId;
}

/// The persistent record of a mounted component position.
///
/// `id` and `hook` survive every re-render of the position; `component` is replaced by
/// the instance passed in each time.
#[derive(Debug, Clone)]
pub(crate) struct LifeCycleState {
    pub(crate) id: LifeCycleStateId,
    pub(crate) hook: Rc<LifeCycleHook>,
    pub(crate) component: AnyComponent,
}

/// A child slot of a node's serialized model.
#[derive(Debug, Clone)]
pub(crate) enum ModelChild {
    Text(String),
    State(StateId),
}

/// The fragment of one node, with nested nodes held by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct Model {
    pub(crate) tag_name: String,
    pub(crate) key: Option<Key>,
    pub(crate) error: Option<String>,
    pub(crate) attributes: Option<Map<String, Value>>,
    pub(crate) children: Option<Vec<ModelChild>>,
    pub(crate) event_handlers: Option<BTreeMap<String, EventTarget>>,
    pub(crate) import_source: Option<ImportSource>,
}

impl Model {
    pub(crate) fn element(
        tag_name: String,
        key: Option<Key>,
        attributes: Option<Map<String, Value>>,
        import_source: Option<ImportSource>,
    ) -> Self {
        Self {
            tag_name,
            key,
            attributes,
            import_source,
            ..Self::default()
        }
    }

    pub(crate) fn error(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

/// A node binding one rendered element or component to its position in the tree.
#[derive(Debug)]
pub(crate) struct ModelState {
    pub(crate) parent: Option<StateId>,
    pub(crate) index: usize,
    pub(crate) key: Option<ChildKey>,
    pub(crate) model: Option<Model>,
    pub(crate) patch_path: String,
    pub(crate) children_by_key: IndexMap<ChildKey, StateId>,
    pub(crate) targets_by_event: IndexMap<String, String>,
    pub(crate) life_cycle_state: Option<LifeCycleState>,
}

impl ModelState {
    pub(crate) fn root(life_cycle_state: LifeCycleState) -> Self {
        Self {
            parent: None,
            index: 0,
            key: None,
            model: None,
            patch_path: String::new(),
            children_by_key: IndexMap::new(),
            targets_by_event: IndexMap::new(),
            life_cycle_state: Some(life_cycle_state),
        }
    }

    pub(crate) fn child(
        parent: StateId,
        parent_path: &str,
        index: usize,
        key: ChildKey,
        life_cycle_state: Option<LifeCycleState>,
    ) -> Self {
        Self {
            parent: Some(parent),
            index,
            key: Some(key),
            model: None,
            patch_path: format!("{parent_path}/children/{index}"),
            children_by_key: IndexMap::new(),
            targets_by_event: IndexMap::new(),
            life_cycle_state,
        }
    }

    /// A fresh node at the same position sharing only the life-cycle state.
    pub(crate) fn copy_for_render(&self) -> Self {
        Self {
            parent: self.parent,
            index: self.index,
            key: self.key.clone(),
            model: None,
            patch_path: self.patch_path.clone(),
            children_by_key: IndexMap::new(),
            targets_by_event: IndexMap::new(),
            life_cycle_state: self.life_cycle_state.clone(),
        }
    }

    pub(crate) fn model_mut(&mut self) -> &mut Model {
        self.model.get_or_insert_with(Model::default)
    }

    /// The path used in error messages, `/` for the root.
    pub(crate) fn display_path(&self) -> String {
        if self.patch_path.is_empty() {
            "/".to_string()
        } else {
            self.patch_path.clone()
        }
    }
}

/// Arena of model states.
#[derive(Debug, Default)]
pub(crate) struct ModelStates {
    nodes: SlotMap<StateId, ModelState>,
}

impl ModelStates {
    pub(crate) fn insert(&mut self, state: ModelState) -> StateId {
        self.nodes.insert(state)
    }

    pub(crate) fn get(&self, id: StateId) -> Option<&ModelState> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> Option<&mut ModelState> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: StateId) -> Option<ModelState> {
        self.nodes.remove(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Serializes the subtree rooted at `id`.
    ///
    /// Returns `None` if the node is gone or has not rendered yet.
    pub(crate) fn snapshot(&self, id: StateId) -> Option<VdomJson> {
        let model = self.nodes.get(id)?.model.as_ref()?;
        let children = model.children.as_ref().map(|children| {
            children
                .iter()
                .map(|child| match child {
                    ModelChild::Text(text) => VdomJsonChild::Text(text.clone()),
                    ModelChild::State(child) => {
                        VdomJsonChild::Element(self.snapshot(*child).unwrap_or_default())
                    }
                })
                .collect()
        });

        Some(VdomJson {
            tag_name: model.tag_name.clone(),
            key: model.key.clone(),
            error: model.error.clone(),
            attributes: model.attributes.clone(),
            children,
            event_handlers: model.event_handlers.clone(),
            import_source: model.import_source.clone(),
        })
    }

    /// Hooks of every component in the subtree rooted at `id`, children before parents.
    pub(crate) fn hooks_post_order(&self, id: StateId) -> Vec<Rc<LifeCycleHook>> {
        let mut hooks = Vec::new();
        self.collect_hooks(id, &mut hooks);
        hooks
    }

    fn collect_hooks(&self, id: StateId, hooks: &mut Vec<Rc<LifeCycleHook>>) {
        let Some(state) = self.nodes.get(id) else {
            return;
        };
        for child in state.children_by_key.values() {
            self.collect_hooks(*child, hooks);
        }
        if let Some(life_cycle_state) = &state.life_cycle_state {
            hooks.push(Rc::clone(&life_cycle_state.hook));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_resolves_nested_states() {
        let mut states = ModelStates::default();
        let mut parent = ModelState {
            parent: None,
            index: 0,
            key: None,
            model: Some(Model::element("div".to_string(), None, None, None)),
            patch_path: String::new(),
            children_by_key: IndexMap::new(),
            targets_by_event: IndexMap::new(),
            life_cycle_state: None,
        };
        parent.model_mut().children = Some(Vec::new());
        let parent_id = states.insert(parent);

        let mut child = ModelState::child(parent_id, "", 1, ChildKey::Index(1), None);
        child.model = Some(Model::element("span".to_string(), Some(Key::from("a")), None, None));
        assert_eq!(child.patch_path, "/children/1");
        let child_id = states.insert(child);

        let children = states.get_mut(parent_id).unwrap().model_mut().children.as_mut().unwrap();
        children.push(ModelChild::Text("hi".to_string()));
        children.push(ModelChild::State(child_id));

        let snapshot = states.snapshot(parent_id).unwrap();
        assert_eq!(
            serde_json::to_value(snapshot).unwrap(),
            serde_json::json!({"tagName": "div", "children": ["hi", {"tagName": "span", "key": "a"}]})
        );
    }

    #[test]
    fn unrendered_node_has_no_snapshot() {
        let mut states = ModelStates::default();
        let id = states.insert(ModelState::child(StateId::default(), "", 0, ChildKey::Index(0), None));
        assert!(states.snapshot(id).is_none());
        assert_eq!(states.get(id).unwrap().display_path(), "/children/0");
    }
}
