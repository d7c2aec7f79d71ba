//! Deferred work flushed at the render-settling point.
//!
//! Classification happens synchronously; every side effect it decides on is
//! queued here and applied when the host calls `CloakedStrip::settle`. Tasks
//! run in FIFO order, and tasks scheduled while flushing run in the same flush.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::model::ItemKey;

/// One unit of deferred work.
#[derive(Debug)]
pub enum Task<T, M> {
    /// Run a classification pass.
    Recompute,
    /// Deliver the on-screen set to the observer.
    SawObjects(Vec<Rc<T>>),
    /// Uncloak the item with this key, if it still exists.
    Uncloak(ItemKey),
    /// Cloak the item with this key, if it still exists.
    Cloak(ItemKey),
    /// Release a mount detached from its item by `cloak`.
    Unmount {
        /// Item the mount belonged to.
        key: ItemKey,
        /// The mount to release.
        handle: M,
    },
}

/// FIFO task queue with a de-duplicated recompute slot.
#[derive(Debug)]
pub struct RenderQueue<T, M> {
    tasks: VecDeque<Task<T, M>>,
    recompute_pending: bool,
}

impl<T, M> Default for RenderQueue<T, M> {
    fn default() -> Self {
        Self {
            tasks: VecDeque::new(),
            recompute_pending: false,
        }
    }
}

impl<T, M> RenderQueue<T, M> {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. Recompute requests go through [`Self::schedule_recompute`].
    pub fn schedule(&mut self, task: Task<T, M>) {
        if matches!(task, Task::Recompute) {
            self.schedule_recompute();
        } else {
            self.tasks.push_back(task);
        }
    }

    /// Schedule a recompute unless one is already pending.
    ///
    /// Returns `true` if a new recompute was queued.
    pub fn schedule_recompute(&mut self) -> bool {
        if self.recompute_pending {
            return false;
        }
        self.recompute_pending = true;
        self.tasks.push_back(Task::Recompute);
        true
    }

    /// Take the next task.
    pub fn pop(&mut self) -> Option<Task<T, M>> {
        let task = self.tasks.pop_front()?;
        if matches!(task, Task::Recompute) {
            self.recompute_pending = false;
        }
        Some(task)
    }

    /// Whether a recompute is waiting to run.
    pub fn recompute_pending(&self) -> bool {
        self.recompute_pending
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every task except pending unmounts, which are returned in order.
    pub fn drain_unmounts(&mut self) -> Vec<(ItemKey, M)> {
        self.recompute_pending = false;
        self.tasks
            .drain(..)
            .filter_map(|task| match task {
                Task::Unmount { key, handle } => Some((key, handle)),
                _ => None,
            })
            .collect()
    }
}
