//! References from descriptors to the host nodes and instances they produce.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{Component, Handle};
use crate::descriptor::Owner;
use crate::lifecycle::{AnyInstance, Instance};
use crate::HostId;

/// How a descriptor publishes its mounted target.
#[derive(Clone)]
pub enum NodeRef {
    /// Called with the target on mount and with `None` on unmount.
    Callback(Rc<dyn Fn(Option<&RefTarget>)>),
    /// Stored under this name on the component that rendered the descriptor.
    Named(Rc<str>),
}

impl NodeRef {
    pub fn callback(f: impl Fn(Option<&RefTarget>) + 'static) -> Self {
        NodeRef::Callback(Rc::new(f))
    }

    pub fn named(name: impl Into<Rc<str>>) -> Self {
        NodeRef::Named(name.into())
    }

    fn same(&self, other: &NodeRef) -> bool {
        match (self, other) {
            (NodeRef::Callback(a), NodeRef::Callback(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (NodeRef::Named(a), NodeRef::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Callback(_) => f.write_str("Callback(..)"),
            NodeRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum RefTarget {
    Host(HostId),
    Component(ComponentRef),
}

impl RefTarget {
    pub fn host_id(&self) -> Option<HostId> {
        match self {
            RefTarget::Host(id) => Some(*id),
            RefTarget::Component(_) => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentRef> {
        match self {
            RefTarget::Component(component) => Some(component),
            RefTarget::Host(_) => None,
        }
    }

    pub(crate) fn same(&self, other: &RefTarget) -> bool {
        match (self, other) {
            (RefTarget::Host(a), RefTarget::Host(b)) => a == b,
            (RefTarget::Component(a), RefTarget::Component(b)) => {
                Weak::ptr_eq(&a.instance, &b.instance)
            }
            _ => false,
        }
    }
}

/// Weak reference to a mounted component instance.
#[derive(Clone)]
pub struct ComponentRef {
    instance: Weak<dyn AnyInstance>,
}

impl ComponentRef {
    pub(crate) fn new(instance: &Rc<dyn AnyInstance>) -> Self {
        Self {
            instance: Rc::downgrade(instance),
        }
    }

    pub(crate) fn instance(&self) -> Option<Rc<dyn AnyInstance>> {
        self.instance.upgrade()
    }

    pub fn name(&self) -> Option<&'static str> {
        self.instance.upgrade().map(|instance| instance.name())
    }

    /// Host node at the root of the instance's rendered output.
    pub fn host(&self) -> Option<HostId> {
        self.instance.upgrade().and_then(|instance| instance.host())
    }

    pub fn is_mounted(&self) -> bool {
        self.instance
            .upgrade()
            .is_some_and(|instance| instance.is_mounted())
    }

    /// Typed handle to the instance, if it is a `C`.
    pub fn handle<C: Component>(&self) -> Option<Handle<C>> {
        let instance = self.instance.upgrade()?;
        let typed = instance.into_any().downcast::<Instance<C>>().ok()?;
        Some(Handle {
            instance: Rc::downgrade(&typed),
        })
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef")
            .field(&self.name().unwrap_or("<dropped>"))
            .finish()
    }
}

pub(crate) fn attach(node_ref: &NodeRef, target: RefTarget, owner: Option<&Owner>) {
    match node_ref {
        NodeRef::Callback(callback) => callback(Some(&target)),
        NodeRef::Named(name) => match owner.and_then(Weak::upgrade) {
            Some(owner) => owner.set_ref(name.clone(), target),
            None => log::warn!("ref {name} has no owning component"),
        },
    }
}

pub(crate) fn detach(node_ref: &NodeRef, target: &RefTarget, owner: Option<&Owner>) {
    match node_ref {
        NodeRef::Callback(callback) => callback(None),
        NodeRef::Named(name) => {
            if let Some(owner) = owner.and_then(Weak::upgrade) {
                owner.clear_ref(name, target);
            }
        }
    }
}

/// Rebinds `target` when the ref changed between two renders.
pub(crate) fn update(
    previous: Option<&NodeRef>,
    next: Option<&NodeRef>,
    target: RefTarget,
    previous_owner: Option<&Owner>,
    next_owner: Option<&Owner>,
) {
    let unchanged = match (previous, next) {
        (Some(a), Some(b)) => a.same(b),
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return;
    }
    if let Some(previous) = previous {
        detach(previous, &target, previous_owner);
    }
    if let Some(next) = next {
        attach(next, target, next_owner);
    }
}
