//! The life-cycle hook handed to every mounted component.
//!
//! The layout creates one [`LifeCycleHook`] per component identity and keeps it for as
//! long as that identity stays mounted, no matter how many component instances pass
//! through it. State and effect primitives built on top of the layout attach themselves
//! to the hook returned by [`current_hook`] while a component renders.
//!
//! - [`RenderTrigger`] - `Send + Sync` handle that schedules a re-render of one identity
//! - [`LifeCycleHook`] - life-cycle notifications plus one-shot callbacks
//! - [`current_hook`] - the hook of the component currently rendering on this thread

use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::scheduler::RenderScheduler;

/// Stable identity of a mounted component position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifeCycleStateId(Uuid);

impl LifeCycleStateId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LifeCycleStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Schedules a re-render of one component identity.
///
/// Cloneable and usable from any thread; scheduling an identity that is already pending
/// does nothing.
#[derive(Debug, Clone)]
pub struct RenderTrigger {
    id: LifeCycleStateId,
    scheduler: RenderScheduler<LifeCycleStateId>,
}

impl RenderTrigger {
    pub(crate) const fn new(
        id: LifeCycleStateId,
        scheduler: RenderScheduler<LifeCycleStateId>,
    ) -> Self {
        Self { id, scheduler }
    }

    /// The identity this trigger schedules.
    #[must_use]
    pub const fn id(&self) -> LifeCycleStateId {
        self.id
    }

    /// Requests a re-render. Returns `true` if the identity was newly queued.
    pub fn schedule(&self) -> bool {
        self.scheduler.schedule(self.id)
    }
}

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct HookState {
    rendering: bool,
    render_later: bool,
    mounted: bool,
    render_count: usize,
    did_render: Vec<Callback>,
    will_unmount: Vec<Callback>,
}

/// Per-identity life-cycle hook.
pub struct LifeCycleHook {
    trigger: RenderTrigger,
    state: RefCell<HookState>,
}

impl fmt::Debug for LifeCycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LifeCycleHook")
            .field("id", &self.trigger.id)
            .field("mounted", &state.mounted)
            .field("render_count", &state.render_count)
            .finish_non_exhaustive()
    }
}

impl LifeCycleHook {
    /// Creates a hook that requests its re-renders through `trigger`.
    #[must_use]
    pub fn new(trigger: RenderTrigger) -> Self {
        Self {
            trigger,
            state: RefCell::new(HookState::default()),
        }
    }

    /// The identity of the component this hook belongs to.
    #[must_use]
    pub const fn id(&self) -> LifeCycleStateId {
        self.trigger.id
    }

    /// A handle that can request re-renders from another thread.
    #[must_use]
    pub fn trigger(&self) -> RenderTrigger {
        self.trigger.clone()
    }

    /// Requests a re-render of this component.
    ///
    /// A request made while the component is rendering is deferred until the render has
    /// completed, so a component never schedules the render that is already running.
    pub fn schedule_render(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.rendering {
                state.render_later = true;
                return;
            }
        }
        self.trigger.schedule();
    }

    /// Runs `callback` once, after the next render of this component has completed.
    pub fn on_did_render(&self, callback: impl FnOnce() + 'static) {
        self.state.borrow_mut().did_render.push(Box::new(callback));
    }

    /// Runs `callback` once, when this component unmounts.
    pub fn on_will_unmount(&self, callback: impl FnOnce() + 'static) {
        self.state.borrow_mut().will_unmount.push(Box::new(callback));
    }

    /// Number of completed renders.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.state.borrow().render_count
    }

    /// Whether the component has rendered and not yet unmounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    /// Called by the layout right before the component renders.
    pub fn component_will_render(&self) {
        let mut state = self.state.borrow_mut();
        state.rendering = true;
        state.mounted = true;
    }

    /// Called by the layout once the component and its whole subtree have rendered.
    pub fn component_did_render(&self) {
        let (callbacks, render_later) = {
            let mut state = self.state.borrow_mut();
            state.rendering = false;
            state.render_count += 1;
            (
                core::mem::take(&mut state.did_render),
                core::mem::take(&mut state.render_later),
            )
        };
        for callback in callbacks {
            callback();
        }
        if render_later {
            self.trigger.schedule();
        }
    }

    /// Called by the layout when the component unmounts.
    pub fn component_will_unmount(&self) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            state.mounted = false;
            state.rendering = false;
            state.did_render.clear();
            core::mem::take(&mut state.will_unmount)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Makes this the hook returned by [`current_hook`].
    pub fn set_current(self: &Rc<Self>) {
        CURRENT_HOOKS.with(|stack| stack.borrow_mut().push(Rc::clone(self)));
    }

    /// Restores the hook that was current before [`LifeCycleHook::set_current`].
    pub fn unset_current(&self) {
        CURRENT_HOOKS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.last().is_some_and(|hook| hook.id() == self.id()) {
                stack.pop();
            } else {
                tracing::warn!(id = %self.id(), "Unset a hook that was not current");
            }
        });
    }

    /// Sets this hook as current until the returned guard is dropped.
    #[must_use = "the hook is unset when the guard is dropped"]
    pub fn enter(self: &Rc<Self>) -> CurrentHookGuard {
        self.set_current();
        CurrentHookGuard {
            hook: Rc::clone(self),
        }
    }
}

thread_local! {
    static CURRENT_HOOKS: RefCell<Vec<Rc<LifeCycleHook>>> = const { RefCell::new(Vec::new()) };
}

/// Unsets the current hook on drop, including during unwinding.
#[derive(Debug)]
pub struct CurrentHookGuard {
    hook: Rc<LifeCycleHook>,
}

impl Drop for CurrentHookGuard {
    fn drop(&mut self) {
        self.hook.unset_current();
    }
}

/// The hook of the component currently rendering on this thread.
#[must_use]
pub fn current_hook() -> Option<Rc<LifeCycleHook>> {
    CURRENT_HOOKS.with(|stack| stack.borrow().last().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use futures::FutureExt;
    use futures::executor::block_on;

    use crate::scheduler::{RenderQueue, render_queue};

    fn hook() -> (Rc<LifeCycleHook>, RenderQueue<LifeCycleStateId>) {
        let (scheduler, queue) = render_queue();
        let trigger = RenderTrigger::new(LifeCycleStateId::new(), scheduler);
        (Rc::new(LifeCycleHook::new(trigger)), queue)
    }

    #[test]
    fn schedule_during_render_is_deferred() {
        let (hook, queue) = hook();
        hook.component_will_render();
        hook.schedule_render();
        assert!(queue.next().now_or_never().is_none());

        hook.component_did_render();
        assert_eq!(block_on(queue.next()).unwrap(), hook.id());
    }

    #[test]
    fn did_render_callbacks_run_once() {
        let (hook, _queue) = hook();
        let calls = Rc::new(Cell::new(0));
        hook.on_did_render({
            let calls = Rc::clone(&calls);
            move || calls.set(calls.get() + 1)
        });

        hook.component_will_render();
        hook.component_did_render();
        hook.component_will_render();
        hook.component_did_render();

        assert_eq!(calls.get(), 1);
        assert_eq!(hook.render_count(), 2);
    }

    #[test]
    fn unmount_runs_callbacks_and_clears_mounted() {
        let (hook, _queue) = hook();
        let unmounted = Rc::new(Cell::new(false));
        hook.on_will_unmount({
            let unmounted = Rc::clone(&unmounted);
            move || unmounted.set(true)
        });

        hook.component_will_render();
        assert!(hook.is_mounted());
        hook.component_will_unmount();
        assert!(!hook.is_mounted());
        assert!(unmounted.get());
    }

    #[test]
    fn guard_restores_previous_hook() {
        let (outer, _q1) = hook();
        let (inner, _q2) = hook();
        assert!(current_hook().is_none());
        {
            let _outer = outer.enter();
            {
                let _inner = inner.enter();
                assert_eq!(current_hook().unwrap().id(), inner.id());
            }
            assert_eq!(current_hook().unwrap().id(), outer.id());
        }
        assert!(current_hook().is_none());
    }

    #[test]
    fn trigger_works_across_threads() {
        let (hook, queue) = hook();
        let trigger = hook.trigger();
        std::thread::spawn(move || trigger.schedule()).join().unwrap();
        assert_eq!(block_on(queue.next()).unwrap(), hook.id());
    }
}
