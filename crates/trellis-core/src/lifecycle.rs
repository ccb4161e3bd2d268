//! Mount, update and unmount of stateful component instances.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::collections::map::HashMap;
use crate::component::{Component, Handle, Scope, StateUpdate};
use crate::descriptor::{self, Descriptor, HostSlot, Owner};
use crate::props::{Context, Props};
use crate::reconcile::{self, Frame, RenderPass};
use crate::refs::RefTarget;
use crate::renderer::{ComponentInfo, ComponentKind};
use crate::runtime::RuntimeHandle;
use crate::{ComponentError, HostError, HostId, RenderError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Unmounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
}

/// Type-erased view of an [`Instance`] used by the reconciler, the scheduler
/// and the error-boundary walk.
pub(crate) trait AnyInstance {
    fn name(&self) -> &'static str;

    fn mount(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        frame: &Frame,
        slot: HostSlot,
    ) -> Result<HostId, RenderError>;

    /// Parent-driven update with a fresh props object.
    fn receive(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        props: Rc<Props>,
        context: Context,
        parent: HostId,
    ) -> Result<HostId, RenderError>;

    /// Scheduler-driven update with the current props.
    fn update(self: Rc<Self>, pass: &mut RenderPass<'_>) -> Result<HostId, RenderError>;

    /// Immediate update that bypasses the update guard. `callback` runs after
    /// the commit.
    fn force(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        callback: Option<Box<dyn FnOnce()>>,
    ) -> Result<HostId, RenderError>;

    /// Context this instance hands to its rendered subtree.
    fn subtree_context(&self) -> Context;

    fn unmount(&self, pass: &mut RenderPass<'_>) -> Result<(), RenderError>;

    fn did_mount(&self) -> Result<(), RenderError>;

    fn catches_errors(&self) -> bool;

    fn did_catch(&self, error: &ComponentError);

    fn parent(&self) -> Option<Rc<dyn AnyInstance>>;

    fn is_dirty(&self) -> bool;

    fn is_mounted(&self) -> bool;

    fn host(&self) -> Option<HostId>;

    fn set_ref(&self, name: Rc<str>, target: RefTarget);

    fn clear_ref(&self, name: &str, target: &RefTarget);

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

pub(crate) struct Instance<C: Component> {
    this: Weak<Instance<C>>,
    pub(crate) component: RefCell<C>,
    pub(crate) props: RefCell<Rc<Props>>,
    pub(crate) state: RefCell<C::State>,
    context: RefCell<Context>,
    pending: RefCell<Vec<StateUpdate<C::State>>>,
    callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
    dirty: Cell<bool>,
    disabled: Cell<bool>,
    forced: Cell<bool>,
    phase: Cell<Phase>,
    svg: Cell<bool>,
    rendered: RefCell<Option<Descriptor>>,
    // Host slots of every component descriptor this instance is the root of,
    // outermost first; the last entry is this instance's own descriptor.
    slots: RefCell<SmallVec<[HostSlot; 2]>>,
    parent: Option<Owner>,
    refs: RefCell<HashMap<Rc<str>, RefTarget>>,
    runtime: RuntimeHandle,
}

pub(crate) fn instantiate<C: Component>(
    props: Rc<Props>,
    context: Context,
    runtime: &RuntimeHandle,
    parent: Option<Owner>,
) -> Rc<dyn AnyInstance> {
    Instance::<C>::new(props, context, runtime.clone(), parent)
}

pub(crate) fn render_detached<C: Component>(
    props: &Props,
    context: &Context,
) -> Result<(Descriptor, Context), ComponentError> {
    let instance = Instance::<C>::new(
        Rc::new(props.clone()),
        context.clone(),
        RuntimeHandle::detached(),
        None,
    );
    instance.with_scope(|scope| instance.component.borrow_mut().will_mount(scope))?;
    let state = instance.resolve_state(props);
    *instance.state.borrow_mut() = state;
    let rendered = instance.with_scope(|scope| instance.component.borrow().render(scope))?;
    Ok((rendered, instance.child_context()))
}

impl<C: Component> Instance<C> {
    fn new(
        props: Rc<Props>,
        context: Context,
        runtime: RuntimeHandle,
        parent: Option<Owner>,
    ) -> Rc<Self> {
        let component = C::create(&props, &context);
        let state = component.initial_state(&props);
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            component: RefCell::new(component),
            props: RefCell::new(props),
            state: RefCell::new(state),
            context: RefCell::new(context),
            pending: RefCell::new(Vec::new()),
            callbacks: RefCell::new(Vec::new()),
            dirty: Cell::new(true),
            disabled: Cell::new(true),
            forced: Cell::new(false),
            phase: Cell::new(Phase::Unmounted),
            svg: Cell::new(false),
            rendered: RefCell::new(None),
            slots: RefCell::new(SmallVec::new()),
            parent,
            refs: RefCell::new(HashMap::default()),
            runtime,
        })
    }

    fn handle(&self) -> Handle<C> {
        Handle {
            instance: self.this.clone(),
        }
    }

    fn owner(&self) -> Owner {
        let owner: Weak<dyn AnyInstance> = self.this.clone();
        owner
    }

    fn with_scope<R>(&self, f: impl FnOnce(&Scope<'_, C>) -> R) -> R {
        let props = self.props.borrow().clone();
        let context = self.context.borrow().clone();
        let state = self.state.borrow();
        let scope = Scope {
            props: &props,
            state: &*state,
            context: &context,
            handle: self.handle(),
        };
        f(&scope)
    }

    pub(crate) fn push_update(
        &self,
        update: StateUpdate<C::State>,
        callback: Option<Box<dyn FnOnce()>>,
    ) {
        self.pending.borrow_mut().push(update);
        if let Some(callback) = callback {
            self.callbacks.borrow_mut().push(callback);
        }
        if !self.disabled.get() {
            self.enqueue();
        }
    }

    pub(crate) fn request_forced_update(&self, callback: Option<Box<dyn FnOnce()>>) {
        if let Some(callback) = callback {
            self.callbacks.borrow_mut().push(callback);
        }
        self.forced.set(true);
        if !self.disabled.get() {
            self.enqueue();
        }
    }

    pub(crate) fn named_ref(&self, name: &str) -> Option<RefTarget> {
        self.refs.borrow().get(name).cloned()
    }

    fn enqueue(&self) {
        if self.dirty.replace(true) {
            return;
        }
        let weak: Weak<dyn AnyInstance> = self.this.clone();
        self.runtime.enqueue(weak);
    }

    /// Folds pending updates, oldest first, into a copy of the committed state.
    fn resolve_state(&self, props: &Props) -> C::State {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let committed = self.state.borrow();
        let mut next = committed.clone();
        for update in pending {
            match update {
                StateUpdate::Partial(apply) => apply(&mut next),
                StateUpdate::Derived(derive) => derive(&committed, props, &mut next),
            }
        }
        next
    }

    fn run_callbacks(&self) {
        loop {
            let callback = self.callbacks.borrow_mut().pop();
            match callback {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    fn child_context(&self) -> Context {
        let extra = self.with_scope(|scope| self.component.borrow().child_context(scope));
        let context = self.context.borrow().clone();
        match extra {
            Some(extra) => context.extended(&extra),
            None => context,
        }
    }

    fn child_frame(&self) -> Frame {
        Frame::component(
            self.child_context(),
            self.svg.get(),
            self.owner(),
            self.slots.borrow().clone(),
        )
    }

    fn route(&self, error: ComponentError) -> Result<(), RenderError> {
        let origin = self
            .this
            .upgrade()
            .map(|instance| instance as Rc<dyn AnyInstance>);
        route_error(origin, self.name(), error).into_result()
    }

    /// Renders and stamps this instance as owner of the output. A recovered
    /// failure renders nothing.
    fn render_output(&self) -> Result<Descriptor, RenderError> {
        let result = self.with_scope(|scope| self.component.borrow().render(scope));
        match result {
            Ok(mut rendered) => {
                reconcile::stamp_owner(&mut rendered, &self.owner());
                Ok(rendered)
            }
            Err(error) => {
                self.route(error)?;
                Ok(descriptor::void())
            }
        }
    }

    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            name: self.name(),
            kind: ComponentKind::Composite,
            host: AnyInstance::host(self),
        }
    }

    fn commit(
        &self,
        pass: &mut RenderPass<'_>,
        next_props: Rc<Props>,
        next_context: Context,
        parent: Option<HostId>,
    ) -> Result<HostId, RenderError> {
        let force = self.forced.replace(false);
        self.phase.set(Phase::Updating);
        let prev_props = self.props.borrow().clone();
        let prev_state = self.state.borrow().clone();
        let prev_context = self.context.borrow().clone();
        let next_state = self.resolve_state(&next_props);

        let skip = !force
            && !self.with_scope(|scope| {
                self.component
                    .borrow()
                    .should_update(&next_props, &next_state, &next_context, scope)
            });
        if !skip {
            let result = self.with_scope(|scope| {
                self.component
                    .borrow_mut()
                    .will_update(&next_props, &next_state, &next_context, scope)
            });
            if let Err(error) = result {
                self.route(error)?;
            }
        }

        *self.props.borrow_mut() = next_props;
        *self.state.borrow_mut() = next_state;
        *self.context.borrow_mut() = next_context;
        self.dirty.set(false);

        let host = if skip {
            AnyInstance::host(self).ok_or(HostError::Unmounted)?
        } else {
            let host = self.rerender(pass, parent)?;
            let result = self.with_scope(|scope| {
                self.component
                    .borrow_mut()
                    .did_update(&prev_props, &prev_state, &prev_context, scope)
            });
            if let Err(error) = result {
                self.route(error)?;
            }
            if let Some(hook) = pass.options.after_update.clone() {
                hook(&self.info());
            }
            host
        };

        self.phase.set(Phase::Mounted);
        self.run_callbacks();
        pass.drain_mounted()?;
        Ok(host)
    }

    fn rerender(
        &self,
        pass: &mut RenderPass<'_>,
        parent: Option<HostId>,
    ) -> Result<HostId, RenderError> {
        let mut next = self.render_output()?;
        let frame = self.child_frame();
        let previous = self.rendered.borrow_mut().take();
        let mut previous = previous.ok_or(HostError::Unmounted)?;
        let parent = match parent {
            Some(parent) => parent,
            None => {
                let current = previous.host().ok_or(HostError::Unmounted)?;
                pass.host
                    .parent(current)
                    .ok_or(HostError::Detached { id: current })?
            }
        };
        let host = reconcile::patch(&mut previous, &mut next, parent, pass, &frame)?;
        *self.rendered.borrow_mut() = Some(next);
        for slot in self.slots.borrow().iter() {
            slot.set(Some(host));
        }
        Ok(host)
    }
}

impl<C: Component> AnyInstance for Instance<C> {
    fn name(&self) -> &'static str {
        crate::component::ComponentType::of::<C>().name()
    }

    fn mount(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        frame: &Frame,
        slot: HostSlot,
    ) -> Result<HostId, RenderError> {
        self.phase.set(Phase::Mounting);
        self.svg.set(frame.svg);
        {
            let mut slots = self.slots.borrow_mut();
            slots.extend(frame.wrappers.iter().cloned());
            slots.push(slot);
        }

        let result = self.with_scope(|scope| self.component.borrow_mut().will_mount(scope));
        if let Err(error) = result {
            self.route(error)?;
        }
        let props = self.props.borrow().clone();
        let state = self.resolve_state(&props);
        *self.state.borrow_mut() = state;
        self.run_callbacks();
        self.dirty.set(false);

        let mut rendered = self.render_output()?;
        let frame = self.child_frame();
        let host = reconcile::mount(&mut rendered, pass, &frame)?;
        *self.rendered.borrow_mut() = Some(rendered);
        for slot in self.slots.borrow().iter() {
            slot.set(Some(host));
        }

        let queued: Rc<dyn AnyInstance> = self.clone();
        pass.mounted.push(queued);
        self.phase.set(Phase::Mounted);
        self.disabled.set(false);
        Ok(host)
    }

    fn receive(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        props: Rc<Props>,
        context: Context,
        parent: HostId,
    ) -> Result<HostId, RenderError> {
        let changed = !Rc::ptr_eq(&self.props.borrow(), &props);
        if changed {
            self.disabled.set(true);
            let result = self.with_scope(|scope| {
                self.component
                    .borrow_mut()
                    .will_receive_props(&props, &context, scope)
            });
            self.disabled.set(false);
            if let Err(error) = result {
                self.route(error)?;
            }
        }
        self.commit(pass, props, context, Some(parent))
    }

    fn update(self: Rc<Self>, pass: &mut RenderPass<'_>) -> Result<HostId, RenderError> {
        let props = self.props.borrow().clone();
        let context = self.context.borrow().clone();
        self.commit(pass, props, context, None)
    }

    fn force(
        self: Rc<Self>,
        pass: &mut RenderPass<'_>,
        callback: Option<Box<dyn FnOnce()>>,
    ) -> Result<HostId, RenderError> {
        if !self.is_mounted() {
            return Err(HostError::Unmounted.into());
        }
        if let Some(callback) = callback {
            self.callbacks.borrow_mut().push(callback);
        }
        self.forced.set(true);
        self.update(pass)
    }

    fn subtree_context(&self) -> Context {
        self.child_context()
    }

    fn unmount(&self, pass: &mut RenderPass<'_>) -> Result<(), RenderError> {
        self.phase.set(Phase::Unmounting);
        let result = self.with_scope(|scope| self.component.borrow_mut().will_unmount(scope));
        if let Err(error) = result {
            self.route(error)?;
        }
        self.disabled.set(true);
        let rendered = self.rendered.borrow_mut().take();
        if let Some(mut rendered) = rendered {
            reconcile::unmount(&mut rendered, None, pass)?;
        }
        self.phase.set(Phase::Unmounted);
        Ok(())
    }

    fn did_mount(&self) -> Result<(), RenderError> {
        if !self.is_mounted() {
            return Ok(());
        }
        let result = self.with_scope(|scope| self.component.borrow_mut().did_mount(scope));
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.route(error),
        }
    }

    fn catches_errors(&self) -> bool {
        self.component
            .try_borrow()
            .map(|component| component.catches_errors())
            .unwrap_or(false)
    }

    fn did_catch(&self, error: &ComponentError) {
        let was_disabled = self.disabled.replace(false);
        self.with_scope(|scope| match self.component.try_borrow_mut() {
            Ok(mut component) => component.did_catch(error, scope),
            Err(_) => log::warn!("{} is busy and cannot handle: {error}", self.name()),
        });
        self.disabled.set(was_disabled);
    }

    fn parent(&self) -> Option<Rc<dyn AnyInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn is_mounted(&self) -> bool {
        matches!(self.phase.get(), Phase::Mounted | Phase::Updating)
    }

    fn host(&self) -> Option<HostId> {
        self.slots.borrow().last().and_then(|slot| slot.get())
    }

    fn set_ref(&self, name: Rc<str>, target: RefTarget) {
        self.refs.borrow_mut().insert(name, target);
    }

    fn clear_ref(&self, name: &str, target: &RefTarget) {
        let mut refs = self.refs.borrow_mut();
        if refs.get(name).is_some_and(|current| current.same(target)) {
            refs.remove(name);
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

pub(crate) enum Recovery {
    Recovered,
    Unhandled(RenderError),
}

impl Recovery {
    pub(crate) fn into_result(self) -> Result<(), RenderError> {
        match self {
            Recovery::Recovered => Ok(()),
            Recovery::Unhandled(error) => Err(error),
        }
    }
}

/// Walks from `origin` up the ownership chain to the first error boundary.
pub(crate) fn route_error(
    origin: Option<Rc<dyn AnyInstance>>,
    component: &'static str,
    error: ComponentError,
) -> Recovery {
    let mut current = origin;
    while let Some(instance) = current {
        if instance.catches_errors() {
            log::warn!(
                "{} recovered from an error in {component}: {error}",
                instance.name()
            );
            instance.did_catch(&error);
            return Recovery::Recovered;
        }
        current = instance.parent();
    }
    log::error!("unhandled error in {component}: {error}");
    Recovery::Unhandled(RenderError::Unhandled { component, error })
}
