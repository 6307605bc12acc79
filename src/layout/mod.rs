//! The reconciliation engine.
//!
//! A [`Layout`] owns a tree of model states, one per rendered element or component, and
//! turns scheduled component re-renders into [`LayoutUpdate`]s. Each update re-renders
//! one component, diffs what it produced against what it produced last time, and
//! mutates the tree in place.
//!
//! # Lifecycle
//!
//! ```text
//! Layout::new(root)       mount: root state created, root scheduled
//!   render().await        wait for a scheduled component, re-render it -> LayoutUpdate
//!   deliver(event).await  route an event to its handler
//! drop(layout)            unmount the whole tree
//! ```
//!
//! Nodes are replaced rather than mutated: re-rendering a node builds a fresh node that
//! shares only the persistent life-cycle state, installs it in the parent's slot, and
//! retires the old one.

mod diff;
pub mod keys;
pub(crate) mod state;

use core::fmt;
use core::future::Future;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tideline_core::{AnyComponent, Component, LayoutEvent, VdomChild, VdomJson, validate_vdom_json};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, panic_message};
use crate::hooks::{LifeCycleHook, LifeCycleStateId, RenderTrigger};
use crate::patch::VdomJsonPatch;
use crate::registry::EventRegistry;
use crate::scheduler::{RenderQueue, RenderScheduler, render_queue};
use state::{LifeCycleState, Model, ModelChild, ModelState, ModelStates, StateId};

/// A change to the layout produced by [`Layout::render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutUpdate {
    /// `/` delimited path to the re-rendered node, empty for the root.
    pub path: String,
    /// The node's fragment before this render, absent on its first render.
    pub old: Option<VdomJson>,
    /// The node's fragment after this render.
    pub new: VdomJson,
}

/// Renders components into serialized fragments and routes events back to handlers.
///
/// # Example
///
/// ```rust
/// use futures::executor::block_on;
/// use tideline::{Layout, LayoutConfig};
/// use tideline_core::{component, vdom};
///
/// let mut layout = Layout::with_config(
///     component("Hello", || Ok(vdom!("p", ["hello"]))),
///     LayoutConfig::new(),
/// );
/// let update = block_on(layout.render()).unwrap();
/// assert_eq!(update.path, "");
/// assert!(update.old.is_none());
/// assert_eq!(update.new.tag_name, "p");
/// ```
pub struct Layout {
    root: AnyComponent,
    root_id: LifeCycleStateId,
    config: LayoutConfig,
    states: ModelStates,
    states_by_life_cycle_id: HashMap<LifeCycleStateId, StateId>,
    event_handlers: EventRegistry,
    scheduler: RenderScheduler<LifeCycleStateId>,
    queue: RenderQueue<LifeCycleStateId>,
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("nodes", &self.states.len())
            .field("components", &self.states_by_life_cycle_id.len())
            .field("event_handlers", &self.event_handlers.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Layout({})", self.root.name())
    }
}

impl Layout {
    /// Mounts `root` with the configuration read from the environment.
    pub fn new(root: impl Component) -> Self {
        Self::with_config(root, LayoutConfig::from_env())
    }

    /// Mounts `root` with an explicit configuration.
    pub fn with_config(root: impl Component, config: LayoutConfig) -> Self {
        Self::mount(root.into_any(), config)
    }

    /// Mounts an already shared component.
    ///
    /// The root state is created and scheduled; nothing renders until the first call to
    /// [`Layout::render`].
    #[must_use]
    pub fn mount(root: AnyComponent, config: LayoutConfig) -> Self {
        let (scheduler, queue) = render_queue();
        let life_cycle_state = new_life_cycle_state(&scheduler, Rc::clone(&root));
        let root_id = life_cycle_state.id;

        let mut states = ModelStates::default();
        let root_state = states.insert(ModelState::root(life_cycle_state));
        let states_by_life_cycle_id = HashMap::from([(root_id, root_state)]);
        scheduler.schedule(root_id);

        let layout = Self {
            root,
            root_id,
            config,
            states,
            states_by_life_cycle_id,
            event_handlers: EventRegistry::new(),
            scheduler,
            queue,
        };

        tracing::debug!(root = %layout, "Mounted layout");
        layout
    }

    /// The configuration this layout was mounted with.
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The identity of the root component.
    #[must_use]
    pub const fn root_id(&self) -> LifeCycleStateId {
        self.root_id
    }

    /// The current root fragment, absent before the first render.
    #[must_use]
    pub fn model(&self) -> Option<VdomJson> {
        self.states.snapshot(self.root_state()?)
    }

    /// Number of registered event handlers.
    #[must_use]
    pub fn event_target_count(&self) -> usize {
        self.event_handlers.len()
    }

    /// Whether a handler is registered under `target`.
    #[must_use]
    pub fn contains_target(&self, target: &str) -> bool {
        self.event_handlers.contains(target)
    }

    /// Number of mounted components, the root included.
    #[must_use]
    pub fn mounted_component_count(&self) -> usize {
        self.states_by_life_cycle_id.len()
    }

    /// Waits for the next scheduled component and re-renders it.
    ///
    /// Components that unmounted after being scheduled are skipped. When output
    /// verification is enabled the root fragment is validated after every render.
    ///
    /// # Errors
    ///
    /// [`LayoutError::InvalidVdom`] if verification is enabled and the root fragment is
    /// malformed, [`LayoutError::QueueClosed`] if the render queue was closed.
    pub async fn render(&mut self) -> Result<LayoutUpdate, LayoutError> {
        loop {
            let id = self.queue.next().await?;
            let Some(&state) = self.states_by_life_cycle_id.get(&id) else {
                tracing::info!(
                    "Did not render component with model state ID {id} - component already unmounted"
                );
                continue;
            };

            let update = self.create_layout_update(state);
            if self.config.check_vdom_spec {
                self.validate_root()?;
            }
            return Ok(update);
        }
    }

    /// Renders the next update and converts it into a JSON patch.
    ///
    /// # Errors
    ///
    /// Everything [`Layout::render`] returns, plus [`LayoutError::Serialize`].
    pub async fn render_json_patch(&mut self) -> Result<VdomJsonPatch, LayoutError> {
        let update = self.render().await?;
        VdomJsonPatch::from_update(&update)
    }

    /// Delivers an event to the handler registered under its target.
    ///
    /// The handler is resolved immediately; the returned future runs it and does not
    /// borrow the layout. Unknown targets are ignored, and handler errors and panics are
    /// logged rather than returned.
    pub fn deliver(&self, event: LayoutEvent) -> impl Future<Output = ()> + 'static {
        let handler = self.event_handlers.get(&event.target).cloned();
        let LayoutEvent { target, data } = event;

        async move {
            let Some(handler) = handler else {
                tracing::info!(
                    "Ignored event - handler {target:?} does not exist or its component unmounted"
                );
                return;
            };

            match AssertUnwindSafe(handler.call(data)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(
                        target_id = %target,
                        "Failed to execute event handler {handler:?}: {error:#}"
                    );
                }
                Err(payload) => {
                    tracing::error!(
                        target_id = %target,
                        "Failed to execute event handler {handler:?}: panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }

    fn root_state(&self) -> Option<StateId> {
        self.states_by_life_cycle_id.get(&self.root_id).copied()
    }

    fn validate_root(&self) -> Result<(), LayoutError> {
        let Some(model) = self.model() else {
            return Ok(());
        };
        validate_vdom_json(&serde_json::to_value(model)?)?;
        Ok(())
    }

    fn new_life_cycle_state(&self, component: AnyComponent) -> LifeCycleState {
        new_life_cycle_state(&self.scheduler, component)
    }

    fn create_layout_update(&mut self, old: StateId) -> LayoutUpdate {
        let old_model = self.states.snapshot(old);
        let Some(copy) = self.states.get(old).map(ModelState::copy_for_render) else {
            return LayoutUpdate {
                path: String::new(),
                old: old_model.clone(),
                new: old_model.unwrap_or_default(),
            };
        };
        let path = copy.patch_path.clone();
        let new = self.states.insert(copy);

        self.render_component(Some(old), new);

        for hook in self.states.hooks_post_order(new) {
            hook.component_did_render();
        }

        LayoutUpdate {
            path,
            old: old_model,
            new: self.states.snapshot(new).unwrap_or_default(),
        }
    }

    /// Renders the component of `new`, never failing: errors become an error fragment.
    fn render_component(&mut self, old: Option<StateId>, new: StateId) {
        let Some(life_cycle_state) = self
            .states
            .get(new)
            .and_then(|state| state.life_cycle_state.clone())
        else {
            return;
        };
        self.states_by_life_cycle_id.insert(life_cycle_state.id, new);

        let hook = &life_cycle_state.hook;
        hook.component_will_render();

        let rendered = {
            let _current = hook.enter();
            panic::catch_unwind(AssertUnwindSafe(|| life_cycle_state.component.render()))
        };
        let result = match rendered {
            Ok(Ok(element)) => self.render_model(old, new, element).map_err(anyhow::Error::from),
            Ok(Err(error)) => Err(error),
            Err(payload) => Err(anyhow::anyhow!(
                "panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        if let Err(error) = result {
            let message = format!("{error:#}");
            tracing::error!(
                id = %life_cycle_state.id,
                error = %message,
                "Failed to render {}",
                life_cycle_state.component.name()
            );
            self.discard_failed_render(old, new);
            let text = if self.config.debug_mode {
                message
            } else {
                String::new()
            };
            if let Some(state) = self.states.get_mut(new) {
                state.model = Some(Model::error(text));
            }
        }

        self.splice_into_parent(new);
        if let Some(old) = old {
            self.states.remove(old);
        }
    }

    /// Installs `new` in its parent's child map and serialized children.
    fn splice_into_parent(&mut self, new: StateId) {
        let Some((parent, index, key)) = self.states.get(new).and_then(|state| {
            state
                .parent
                .map(|parent| (parent, state.index, state.key.clone()))
        }) else {
            return;
        };
        let Some(parent) = self.states.get_mut(parent) else {
            return;
        };

        if let Some(key) = key {
            parent.children_by_key.insert(key, new);
        }
        let children = parent.model_mut().children.get_or_insert_with(Vec::new);
        if index < children.len() {
            children[index] = ModelChild::State(new);
        } else {
            children.push(ModelChild::State(new));
        }
    }

    /// Tears down everything a failed render of `new` left behind.
    fn discard_failed_render(&mut self, old: Option<StateId>, new: StateId) {
        self.discard_leftovers(new);
        if let Some(old) = old {
            self.discard_leftovers(old);
        }
    }

    /// Drops the event targets of `id` and unmounts the children it still holds.
    fn discard_leftovers(&mut self, id: StateId) {
        let Some(state) = self.states.get_mut(id) else {
            return;
        };
        let targets: Vec<String> = state.targets_by_event.drain(..).map(|(_, target)| target).collect();
        let children: Vec<StateId> = state.children_by_key.drain(..).map(|(_, child)| child).collect();

        for target in targets {
            self.event_handlers.remove(&target);
        }
        self.unmount(children);
    }

    /// Unmounts the given subtrees.
    ///
    /// Every node's event targets are removed from the registry, every component is
    /// removed from the identity index and told it will unmount, then its children are
    /// queued for the same treatment.
    fn unmount(&mut self, states: Vec<StateId>) {
        let mut to_unmount: Vec<StateId> = states.into_iter().rev().collect();

        while let Some(id) = to_unmount.pop() {
            let Some(state) = self.states.remove(id) else {
                continue;
            };

            for target in state.targets_by_event.values() {
                self.event_handlers.remove(target);
            }

            if let Some(life_cycle_state) = &state.life_cycle_state {
                if self.states_by_life_cycle_id.get(&life_cycle_state.id) == Some(&id) {
                    self.states_by_life_cycle_id.remove(&life_cycle_state.id);
                    life_cycle_state.hook.component_will_unmount();
                }
            }

            to_unmount.extend(state.children_by_key.values().copied());
        }
    }
}

fn new_life_cycle_state(
    scheduler: &RenderScheduler<LifeCycleStateId>,
    component: AnyComponent,
) -> LifeCycleState {
    let id = LifeCycleStateId::new();
    let trigger = RenderTrigger::new(id, scheduler.clone());
    LifeCycleState {
        id,
        hook: Rc::new(LifeCycleHook::new(trigger)),
        component,
    }
}

impl Drop for Layout {
    fn drop(&mut self) {
        if let Some(root) = self.root_state() {
            self.unmount(vec![root]);
        }
        self.event_handlers.clear();
        self.queue.close();
        tracing::debug!("Unmounted layout");
    }
}

impl TryFrom<VdomChild> for Layout {
    type Error = LayoutError;

    /// Mounts a child as root, rejecting anything that is not a component.
    fn try_from(value: VdomChild) -> Result<Self, Self::Error> {
        match value {
            VdomChild::Component(component) => Ok(Self::mount(component, LayoutConfig::from_env())),
            VdomChild::Element(_) => Err(LayoutError::NotAComponent { found: "an element" }),
            VdomChild::Text(_) => Err(LayoutError::NotAComponent { found: "a text node" }),
        }
    }
}
