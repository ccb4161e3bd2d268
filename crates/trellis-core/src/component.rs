//! Stateful components: the user-facing trait, its render scope and handles.

use std::any::TypeId;
use std::rc::{Rc, Weak};

use crate::descriptor::Descriptor;
use crate::lifecycle::{self, AnyInstance, Instance};
use crate::props::{Context, Props};
use crate::refs::{ComponentRef, RefTarget};
use crate::runtime::RuntimeHandle;
use crate::{ComponentError, HostId};

/// A stateful component.
///
/// Hooks that can fail return [`ComponentError`]; the error is routed to the
/// nearest ancestor (or self) whose [`Component::catches_errors`] is true.
pub trait Component: Sized + 'static {
    type State: Clone + Default + 'static;

    fn create(props: &Props, context: &Context) -> Self;

    /// Props merged under the caller's props by [`crate::component`].
    fn default_props() -> Option<Props> {
        None
    }

    fn initial_state(&self, _props: &Props) -> Self::State {
        Self::State::default()
    }

    fn render(&self, scope: &Scope<'_, Self>) -> Result<Descriptor, ComponentError>;

    fn will_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        Ok(())
    }

    fn did_mount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Runs when the parent rerenders this component with a new props object.
    /// State updates requested here are folded into the same update.
    fn will_receive_props(
        &mut self,
        _next_props: &Props,
        _next_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> Result<(), ComponentError> {
        Ok(())
    }

    fn should_update(
        &self,
        _next_props: &Props,
        _next_state: &Self::State,
        _next_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> bool {
        true
    }

    fn will_update(
        &mut self,
        _next_props: &Props,
        _next_state: &Self::State,
        _next_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> Result<(), ComponentError> {
        Ok(())
    }

    fn did_update(
        &mut self,
        _prev_props: &Props,
        _prev_state: &Self::State,
        _prev_context: &Context,
        _scope: &Scope<'_, Self>,
    ) -> Result<(), ComponentError> {
        Ok(())
    }

    fn will_unmount(&mut self, _scope: &Scope<'_, Self>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Entries layered over the inherited context for this component's subtree.
    fn child_context(&self, _scope: &Scope<'_, Self>) -> Option<Props> {
        None
    }

    /// Whether this component is an error boundary.
    fn catches_errors(&self) -> bool {
        false
    }

    /// Called on an error boundary. State updates requested here are scheduled
    /// even while the boundary is still mounting.
    fn did_catch(&mut self, _error: &ComponentError, _scope: &Scope<'_, Self>) {}
}

/// Read-only view of a component while one of its hooks runs.
pub struct Scope<'a, C: Component> {
    pub(crate) props: &'a Props,
    pub(crate) state: &'a C::State,
    pub(crate) context: &'a Context,
    pub(crate) handle: Handle<C>,
}

impl<'a, C: Component> Scope<'a, C> {
    pub fn props(&self) -> &'a Props {
        self.props
    }

    pub fn state(&self) -> &'a C::State {
        self.state
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// Descriptors passed in through the `children` prop.
    pub fn children(&self) -> &'a [Descriptor] {
        self.props.children()
    }

    pub fn handle(&self) -> Handle<C> {
        self.handle.clone()
    }

    pub fn named_ref(&self, name: &str) -> Option<RefTarget> {
        self.handle.named_ref(name)
    }
}

/// Update guard of a pure component: re-render only when a prop changed
/// identity or the next state differs from the committed one.
pub fn shallow_should_update<C>(
    scope: &Scope<'_, C>,
    next_props: &Props,
    next_state: &C::State,
) -> bool
where
    C: Component,
    C::State: PartialEq,
{
    !scope.props().shallow_eq(next_props) || scope.state() != next_state
}

/// Expands to a [`Component::should_update`] that uses
/// [`shallow_should_update`]. Invoke it inside `impl Component for ...`.
#[macro_export]
macro_rules! pure_component {
    () => {
        fn should_update(
            &self,
            next_props: &$crate::Props,
            next_state: &Self::State,
            _next_context: &$crate::Context,
            scope: &$crate::Scope<'_, Self>,
        ) -> bool {
            $crate::component::shallow_should_update(scope, next_props, next_state)
        }
    };
}

pub(crate) enum StateUpdate<S> {
    /// Applied to the accumulating next state.
    Partial(Box<dyn FnOnce(&mut S)>),
    /// Receives the committed state and props, then writes into the next state.
    Derived(Box<dyn FnOnce(&S, &Props, &mut S)>),
}

/// Non-owning handle used to request updates from outside render, usually from
/// event handlers. All operations are no-ops once the component is dropped.
pub struct Handle<C: Component> {
    pub(crate) instance: Weak<Instance<C>>,
}

impl<C: Component> Clone for Handle<C> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
        }
    }
}

impl<C: Component> Handle<C> {
    pub fn set_state(&self, update: impl FnOnce(&mut C::State) + 'static) {
        if let Some(instance) = self.instance.upgrade() {
            instance.push_update(StateUpdate::Partial(Box::new(update)), None);
        }
    }

    /// Like [`Handle::set_state`]; `callback` runs once the update commits.
    pub fn set_state_with(
        &self,
        update: impl FnOnce(&mut C::State) + 'static,
        callback: impl FnOnce() + 'static,
    ) {
        if let Some(instance) = self.instance.upgrade() {
            instance.push_update(
                StateUpdate::Partial(Box::new(update)),
                Some(Box::new(callback)),
            );
        }
    }

    /// Queues an update computed from the committed state and props.
    pub fn update_state(&self, update: impl FnOnce(&C::State, &Props, &mut C::State) + 'static) {
        if let Some(instance) = self.instance.upgrade() {
            instance.push_update(StateUpdate::Derived(Box::new(update)), None);
        }
    }

    /// Schedules an update that bypasses [`Component::should_update`]. Use
    /// [`crate::Renderer::force_update`] to re-render immediately.
    pub fn force_update(&self) {
        if let Some(instance) = self.instance.upgrade() {
            instance.request_forced_update(None);
        }
    }

    /// Like [`Handle::force_update`]; `callback` runs once the update commits.
    pub fn force_update_with(&self, callback: impl FnOnce() + 'static) {
        if let Some(instance) = self.instance.upgrade() {
            instance.request_forced_update(Some(Box::new(callback)));
        }
    }

    /// Untyped reference to the instance, for [`crate::Renderer`] entry points.
    pub fn component_ref(&self) -> Option<ComponentRef> {
        let instance: Rc<dyn AnyInstance> = self.instance.upgrade()?;
        Some(ComponentRef::new(&instance))
    }

    pub fn is_mounted(&self) -> bool {
        self.instance
            .upgrade()
            .is_some_and(|instance| instance.is_mounted())
    }

    /// Host node at the root of this component's rendered output.
    pub fn host(&self) -> Option<HostId> {
        self.instance.upgrade().and_then(|instance| instance.host())
    }

    pub fn named_ref(&self, name: &str) -> Option<RefTarget> {
        self.instance
            .upgrade()
            .and_then(|instance| instance.named_ref(name))
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&C::State) -> R) -> Option<R> {
        let instance = self.instance.upgrade()?;
        let state = instance.state.try_borrow().ok()?;
        Some(f(&state))
    }

    pub fn with_props<R>(&self, f: impl FnOnce(&Props) -> R) -> Option<R> {
        let instance = self.instance.upgrade()?;
        let props = instance.props.try_borrow().ok()?.clone();
        Some(f(&props))
    }

    pub fn with_component<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        let instance = self.instance.upgrade()?;
        let component = instance.component.try_borrow().ok()?;
        Some(f(&component))
    }
}

type Instantiate =
    fn(Rc<Props>, Context, &RuntimeHandle, Option<Weak<dyn AnyInstance>>) -> Rc<dyn AnyInstance>;

type RenderDetached = fn(&Props, &Context) -> Result<(Descriptor, Context), ComponentError>;

/// Type identity of a component plus the monomorphized entry points the
/// reconciler needs to create it.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    pub(crate) instantiate: Instantiate,
    render_detached: RenderDetached,
}

impl ComponentType {
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: short_type_name(std::any::type_name::<C>()),
            instantiate: lifecycle::instantiate::<C>,
            render_detached: lifecycle::render_detached::<C>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Renders one level without a host or scheduler: construct, run
    /// `will_mount`, fold pending state, render. Returns the output and the
    /// context for its children.
    pub fn render_detached(
        &self,
        props: &Props,
        context: &Context,
    ) -> Result<(Descriptor, Context), ComponentError> {
        (self.render_detached)(props, context)
    }
}

impl std::fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
