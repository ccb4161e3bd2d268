//! Entry points that tie a host tree, the runtime and the event registry
//! together.

use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::descriptor::Descriptor;
use crate::events::{Event, EventRegistry};
use crate::host::HostTree;
use crate::props::PropValue;
use crate::reconcile::{self, Frame, RenderPass};
use crate::refs::ComponentRef;
use crate::runtime::Runtime;
use crate::{HostError, HostId, RenderError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Composite,
    Stateless,
}

/// What a [`LifecycleHook`] learns about a component.
#[derive(Clone, Debug)]
pub struct ComponentInfo {
    pub name: &'static str,
    pub kind: ComponentKind,
    pub host: Option<HostId>,
}

pub type LifecycleHook = Rc<dyn Fn(&ComponentInfo)>;

/// Observation hooks for tooling. All default to none.
#[derive(Clone, Default)]
pub struct RenderOptions {
    pub after_mount: Option<LifecycleHook>,
    pub after_update: Option<LifecycleHook>,
    pub before_unmount: Option<LifecycleHook>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after_mount(mut self, hook: impl Fn(&ComponentInfo) + 'static) -> Self {
        self.after_mount = Some(Rc::new(hook));
        self
    }

    pub fn after_update(mut self, hook: impl Fn(&ComponentInfo) + 'static) -> Self {
        self.after_update = Some(Rc::new(hook));
        self
    }

    pub fn before_unmount(mut self, hook: impl Fn(&ComponentInfo) + 'static) -> Self {
        self.before_unmount = Some(Rc::new(hook));
        self
    }
}

impl std::fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("after_mount", &self.after_mount.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("before_unmount", &self.before_unmount.is_some())
            .finish()
    }
}

/// Renders descriptor trees into containers of one host tree.
pub struct Renderer<H: HostTree> {
    host: H,
    runtime: Runtime,
    events: EventRegistry,
    options: RenderOptions,
    roots: HashMap<HostId, Descriptor>,
}

impl<H: HostTree> Renderer<H> {
    pub fn new(host: H, runtime: Runtime) -> Self {
        Self::with_options(host, runtime, RenderOptions::default())
    }

    pub fn with_options(host: H, runtime: Runtime, options: RenderOptions) -> Self {
        Self {
            host,
            runtime,
            events: EventRegistry::new(),
            options,
            roots: HashMap::default(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Descriptor tree currently mounted in `container`.
    pub fn root(&self, container: HostId) -> Option<&Descriptor> {
        self.roots.get(&container)
    }

    /// Mounts `descriptor` into `container`, or reconciles it against the tree
    /// already rendered there. Returns the root host node.
    ///
    /// On failure the container's record is dropped; the next render mounts
    /// afresh.
    pub fn render(
        &mut self,
        descriptor: impl Into<Descriptor>,
        container: HostId,
    ) -> Result<HostId, RenderError> {
        self.render_in(descriptor.into(), container, Frame::root())
    }

    /// Like [`Renderer::render`], but the tree sees the context `parent`
    /// passes to its own children.
    pub fn render_subtree(
        &mut self,
        parent: &ComponentRef,
        descriptor: impl Into<Descriptor>,
        container: HostId,
    ) -> Result<HostId, RenderError> {
        let instance = parent.instance().ok_or(HostError::Unmounted)?;
        let frame = Frame::root().with_context(instance.subtree_context());
        self.render_in(descriptor.into(), container, frame)
    }

    fn render_in(
        &mut self,
        mut next: Descriptor,
        container: HostId,
        frame: Frame,
    ) -> Result<HostId, RenderError> {
        let previous = self.roots.remove(&container);
        let updating = previous.is_some();
        let result = {
            let mut pass = RenderPass::new(
                &mut self.host,
                &mut self.events,
                self.runtime.handle(),
                &self.options,
            );
            render_root(&mut pass, previous, &mut next, container, &frame)
        };
        match result {
            Ok(root) => {
                log::debug!(
                    "{} container {container}, root {root}",
                    if updating { "updated" } else { "mounted" }
                );
                self.roots.insert(container, next);
                Ok(root)
            }
            Err(error) => {
                log::error!("render into container {container} failed: {error}");
                Err(error)
            }
        }
    }

    /// Like [`Renderer::render`], then runs `on_complete` with the root.
    pub fn render_with(
        &mut self,
        descriptor: impl Into<Descriptor>,
        container: HostId,
        on_complete: impl FnOnce(HostId),
    ) -> Result<HostId, RenderError> {
        let root = self.render(descriptor, container)?;
        on_complete(root);
        Ok(root)
    }

    /// Unmounts whatever was rendered into `container`. Returns `false` when
    /// nothing was.
    pub fn unmount(&mut self, container: HostId) -> Result<bool, RenderError> {
        let Some(mut root) = self.roots.remove(&container) else {
            return Ok(false);
        };
        let mut pass = RenderPass::new(
            &mut self.host,
            &mut self.events,
            self.runtime.handle(),
            &self.options,
        );
        reconcile::unmount(&mut root, Some(container), &mut pass)?;
        log::debug!("unmounted container {container}");
        Ok(true)
    }

    /// Discards existing content of `container`, last child first, and mounts
    /// `descriptor` fresh.
    pub fn hydrate(
        &mut self,
        descriptor: impl Into<Descriptor>,
        container: HostId,
    ) -> Result<HostId, RenderError> {
        self.unmount(container)?;
        for child in self.host.children(container).into_iter().rev() {
            self.host.remove_child(container, child)?;
        }
        self.render(descriptor, container)
    }

    /// Re-renders every component marked dirty since the last flush, most
    /// recent request first. Returns how many components updated.
    pub fn flush(&mut self) -> Result<usize, RenderError> {
        let mut queue = self.runtime.take_pending();
        if queue.is_empty() {
            return Ok(0);
        }
        let handle = self.runtime.handle();
        let mut pass = RenderPass::new(
            &mut self.host,
            &mut self.events,
            handle.clone(),
            &self.options,
        );
        let mut updated = 0;
        while let Some(entry) = queue.pop() {
            let Some(instance) = entry.upgrade() else {
                continue;
            };
            if !instance.is_mounted() || !instance.is_dirty() {
                continue;
            }
            if let Err(error) = instance.clone().update(&mut pass) {
                log::error!("update of {} failed: {error}", instance.name());
                for entry in queue {
                    handle.enqueue(entry);
                }
                return Err(error);
            }
            updated += 1;
        }
        log::debug!("flushed {updated} component update(s)");
        Ok(updated)
    }

    /// Re-renders `component` now, skipping [`crate::Component::should_update`].
    /// Pending state updates are folded in. Returns the component's root host node.
    pub fn force_update(&mut self, component: &ComponentRef) -> Result<HostId, RenderError> {
        self.force(component, None)
    }

    /// Like [`Renderer::force_update`]; `callback` runs once the update commits.
    pub fn force_update_with(
        &mut self,
        component: &ComponentRef,
        callback: impl FnOnce() + 'static,
    ) -> Result<HostId, RenderError> {
        self.force(component, Some(Box::new(callback)))
    }

    fn force(
        &mut self,
        component: &ComponentRef,
        callback: Option<Box<dyn FnOnce()>>,
    ) -> Result<HostId, RenderError> {
        let instance = component.instance().ok_or(HostError::Unmounted)?;
        let mut pass = RenderPass::new(
            &mut self.host,
            &mut self.events,
            self.runtime.handle(),
            &self.options,
        );
        let host = instance.force(&mut pass, callback).inspect_err(|error| {
            log::error!("forced update failed: {error}");
        })?;
        log::debug!("forced update of {}", component.name().unwrap_or("component"));
        Ok(host)
    }

    /// Delivers a native event fired on `target`, as a host listener installed
    /// by the event registry would.
    pub fn dispatch_event(&self, name: &str, target: HostId, detail: PropValue) -> Event {
        let event = Event::new(name, target, detail);
        self.events.dispatch(&self.host, &event);
        event
    }

    /// Current root host node of a mounted component.
    pub fn find_host(&self, component: &ComponentRef) -> Option<HostId> {
        component.host()
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

fn render_root(
    pass: &mut RenderPass<'_>,
    previous: Option<Descriptor>,
    next: &mut Descriptor,
    container: HostId,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let root = match previous {
        Some(mut previous) => reconcile::patch(&mut previous, next, container, pass, frame)?,
        None => {
            let root = reconcile::mount(next, pass, frame)?;
            pass.host.append_child(container, root)?;
            root
        }
    };
    pass.drain_mounted()?;
    Ok(root)
}
