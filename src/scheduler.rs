//! Deduplicating render queue.
//!
//! [`RenderScheduler`] is the producer side: cheap to clone, `Send + Sync`, and callable
//! from any thread. [`RenderQueue`] is the single consumer owned by the render loop.
//! An identity is pending from the moment it is first scheduled until the consumer takes
//! it; scheduling a pending identity again does nothing.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use async_channel::{Receiver, Sender};

use crate::LayoutError;

/// Creates a connected scheduler and queue.
#[must_use]
pub fn render_queue<T>() -> (RenderScheduler<T>, RenderQueue<T>)
where
    T: Eq + Hash + Clone,
{
    let (sender, receiver) = async_channel::unbounded();
    let pending = Arc::new(Mutex::new(HashSet::new()));
    (
        RenderScheduler {
            sender,
            pending: Arc::clone(&pending),
        },
        RenderQueue { receiver, pending },
    )
}

/// Producer handle of the render queue.
#[derive(Debug)]
pub struct RenderScheduler<T> {
    sender: Sender<T>,
    pending: Arc<Mutex<HashSet<T>>>,
}

impl<T> Clone for RenderScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T> RenderScheduler<T>
where
    T: Eq + Hash + Clone,
{
    /// Marks `identity` as pending. Never blocks.
    ///
    /// Returns `true` if the identity was newly queued and `false` if it was already
    /// pending or the queue has been closed.
    pub fn schedule(&self, identity: T) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.contains(&identity) {
            return false;
        }
        if self.sender.try_send(identity.clone()).is_err() {
            tracing::debug!("Render queue closed, dropping scheduled render");
            return false;
        }
        pending.insert(identity);
        true
    }

    /// Whether `identity` is waiting to be rendered.
    #[must_use]
    pub fn is_pending(&self, identity: &T) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identity)
    }

    /// Number of pending identities.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Consumer side of the render queue.
#[derive(Debug)]
pub struct RenderQueue<T> {
    receiver: Receiver<T>,
    pending: Arc<Mutex<HashSet<T>>>,
}

impl<T> RenderQueue<T>
where
    T: Eq + Hash + Clone,
{
    /// Waits for the next pending identity and removes it from the pending set.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::QueueClosed`] once every scheduler is gone and the queue is
    /// drained.
    pub async fn next(&self) -> Result<T, LayoutError> {
        let identity = self
            .receiver
            .recv()
            .await
            .map_err(|_| LayoutError::QueueClosed)?;
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&identity);
        Ok(identity)
    }

    /// Stops accepting new identities.
    pub fn close(&self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::executor::block_on;

    #[test]
    fn scheduling_twice_yields_one_entry() {
        let (scheduler, queue) = render_queue();
        assert!(scheduler.schedule(1));
        assert!(!scheduler.schedule(1));
        assert_eq!(scheduler.pending_count(), 1);

        assert_eq!(block_on(queue.next()).unwrap(), 1);
        assert!(queue.next().now_or_never().is_none());
    }

    #[test]
    fn identity_can_be_rescheduled_once_taken() {
        let (scheduler, queue) = render_queue();
        scheduler.schedule("a");
        assert_eq!(block_on(queue.next()).unwrap(), "a");
        assert!(!scheduler.is_pending(&"a"));
        assert!(scheduler.schedule("a"));
        assert_eq!(block_on(queue.next()).unwrap(), "a");
    }

    #[test]
    fn first_scheduling_order_is_kept() {
        let (scheduler, queue) = render_queue();
        for identity in [3, 1, 3, 2, 1] {
            scheduler.schedule(identity);
        }
        let order: Vec<_> = (0..3).map(|_| block_on(queue.next()).unwrap()).collect();
        assert_eq!(order, [3, 1, 2]);
    }

    #[test]
    fn schedules_from_other_threads() {
        let (scheduler, queue) = render_queue();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = scheduler.clone();
                std::thread::spawn(move || scheduler.schedule(7))
            })
            .collect();
        let queued = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|queued| *queued)
            .count();

        assert_eq!(queued, 1);
        assert_eq!(block_on(queue.next()).unwrap(), 7);
    }

    #[test]
    fn closed_queue_reports_error() {
        let (scheduler, queue) = render_queue::<u8>();
        queue.close();
        assert!(!scheduler.schedule(1));
        assert!(matches!(block_on(queue.next()), Err(LayoutError::QueueClosed)));
    }
}
