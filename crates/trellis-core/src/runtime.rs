use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::lifecycle::AnyInstance;
use crate::platform::FlushScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn FlushScheduler>,
    // Components waiting for the next flush, in request order.
    pending: RefCell<Vec<Weak<dyn AnyInstance>>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn FlushScheduler>) -> Self {
        Self {
            scheduler,
            pending: RefCell::new(Vec::new()),
        }
    }

    fn enqueue(&self, instance: Weak<dyn AnyInstance>) {
        let first = {
            let mut pending = self.pending.borrow_mut();
            pending.push(instance);
            pending.len() == 1
        };
        if first {
            log::trace!("requesting flush");
            self.scheduler.schedule_flush();
        }
    }
}

/// Owns the queue of components marked dirty since the last flush.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn FlushScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Swaps the queue out so requests made during a flush land in a fresh one.
    pub(crate) fn take_pending(&self) -> Vec<Weak<dyn AnyInstance>> {
        std::mem::take(&mut *self.inner.pending.borrow_mut())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Scheduler that never asks for a flush; callers flush manually.
#[derive(Default)]
pub struct DefaultScheduler;

impl FlushScheduler for DefaultScheduler {
    fn schedule_flush(&self) {}
}

/// Weak reference to a [`Runtime`] held by component instances.
#[derive(Clone, Default)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    /// A handle with no runtime behind it. Update requests are dropped.
    pub(crate) fn detached() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&self, instance: Weak<dyn AnyInstance>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.enqueue(instance);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| !inner.pending.borrow().is_empty())
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
