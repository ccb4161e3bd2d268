//! Test harness for Trellis descriptor trees.
//!
//! [`TrellisTestRule`] owns a [`Renderer`] over a [`MemoryHost`] and a
//! scheduler that counts flush requests, so tests can drive renders, events
//! and flushes and then assert on the resulting host tree and mutation log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trellis_core::{
    Descriptor, Event, FlushScheduler, HostId, HostOp, HostTree, MemoryHost, PropValue,
    RenderError, RenderOptions, Renderer, Runtime,
};

/// Upper bound on flush rounds in [`TrellisTestRule::pump_until_idle`].
const MAX_PUMPS: usize = 100;

/// Scheduler that only counts how often a flush was requested.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl FlushScheduler for CountingScheduler {
    fn schedule_flush(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Headless harness for exercising descriptor trees in tests.
pub struct TrellisTestRule {
    renderer: Renderer<MemoryHost>,
    scheduler: Arc<CountingScheduler>,
    container: HostId,
    content: Option<Box<dyn FnMut() -> Descriptor>>,
    root: Option<HostId>,
}

impl TrellisTestRule {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        let scheduler = Arc::new(CountingScheduler::default());
        let mut host = MemoryHost::new();
        let container = host.create_root();
        let runtime = Runtime::new(scheduler.clone());
        Self {
            renderer: Renderer::with_options(host, runtime, options),
            scheduler,
            container,
            content: None,
            root: None,
        }
    }

    /// Installs `content` and renders it into the rule's container.
    pub fn set_content(
        &mut self,
        content: impl FnMut() -> Descriptor + 'static,
    ) -> Result<HostId, RenderError> {
        let mut content: Box<dyn FnMut() -> Descriptor> = Box::new(content);
        let root = self.renderer.render(content(), self.container)?;
        self.content = Some(content);
        self.root = Some(root);
        Ok(root)
    }

    /// Calls the installed content again and reconciles the result against
    /// the mounted tree. Does nothing without content.
    pub fn rerender(&mut self) -> Result<Option<HostId>, RenderError> {
        let Some(content) = self.content.as_mut() else {
            return Ok(None);
        };
        let root = self.renderer.render(content(), self.container)?;
        self.root = Some(root);
        Ok(Some(root))
    }

    /// Runs one flush. Returns how many components updated.
    pub fn flush(&mut self) -> Result<usize, RenderError> {
        let updated = self.renderer.flush()?;
        self.sync_root();
        Ok(updated)
    }

    /// Flushes until no component is waiting, including updates requested
    /// by the flushes themselves.
    pub fn pump_until_idle(&mut self) -> Result<usize, RenderError> {
        let mut total = 0;
        for round in 0..MAX_PUMPS {
            if !self.renderer.runtime().has_pending() {
                log::trace!("idle after {round} flush round(s)");
                return Ok(total);
            }
            total += self.flush()?;
        }
        panic!("pump_until_idle looped {MAX_PUMPS} times without settling");
    }

    /// Delivers `name` to `target` the way a native listener would.
    pub fn fire(&self, name: &str, target: HostId, detail: PropValue) -> Event {
        self.renderer.dispatch_event(name, target, detail)
    }

    pub fn click(&self, target: HostId) -> Event {
        self.fire("click", target, PropValue::Null)
    }

    /// Unmounts the installed content, keeping the rule reusable.
    pub fn unmount(&mut self) -> Result<bool, RenderError> {
        self.content = None;
        self.root = None;
        self.renderer.unmount(self.container)
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn container(&self) -> HostId {
        self.container
    }

    /// Root host node of the current content.
    pub fn root_id(&self) -> Option<HostId> {
        self.root
    }

    pub fn host(&self) -> &MemoryHost {
        self.renderer.host()
    }

    pub fn host_mut(&mut self) -> &mut MemoryHost {
        self.renderer.host_mut()
    }

    pub fn renderer(&mut self) -> &mut Renderer<MemoryHost> {
        &mut self.renderer
    }

    pub fn runtime(&self) -> &Runtime {
        self.renderer.runtime()
    }

    /// Number of flushes the runtime asked for so far.
    pub fn flush_requests(&self) -> usize {
        self.scheduler.requests()
    }

    /// Dump the container's tree as text for debugging.
    pub fn dump_tree(&self) -> String {
        self.host().dump_tree(Some(self.container))
    }

    pub fn text_content(&self) -> String {
        self.host().text_content(self.container)
    }

    /// Elements with `tag` under the container, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<HostId> {
        let mut found = Vec::new();
        self.collect(self.container, tag, &mut found);
        found
    }

    pub fn find(&self, tag: &str) -> Option<HostId> {
        self.find_all(tag).into_iter().next()
    }

    /// Mutations recorded since the last reset.
    pub fn mutation_count(&self) -> usize {
        self.host().mutation_count()
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.host_mut().take_ops()
    }

    pub fn reset_mutations(&mut self) {
        self.host_mut().reset_mutations();
    }

    /// Moves recorded since the last reset.
    pub fn move_count(&self) -> usize {
        self.host()
            .ops()
            .iter()
            .filter(|op| matches!(op, HostOp::Move { .. }))
            .count()
    }

    fn collect(&self, node: HostId, tag: &str, found: &mut Vec<HostId>) {
        for child in self.host().children(node) {
            if self.host().tag(child) == Some(tag) {
                found.push(child);
            }
            self.collect(child, tag, found);
        }
    }

    /// A flush can replace the root node; track the container's first child.
    fn sync_root(&mut self) {
        if self.root.is_some() {
            self.root = self.host().children(self.container).first().copied();
        }
    }
}

impl Default for TrellisTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// [`TrellisTestRule`].
pub fn run_test_rule<R>(f: impl FnOnce(&mut TrellisTestRule) -> R) -> R {
    let mut rule = TrellisTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
