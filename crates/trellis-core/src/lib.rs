#![doc = r"Reconciliation and component lifecycle runtime for Trellis."]

pub extern crate self as trellis_core;

pub mod children;
mod collections;
pub mod component;
pub mod descriptor;
pub mod events;
pub mod host;
mod lifecycle;
pub mod memory_host;
pub mod platform;
pub mod props;
mod reconcile;
pub mod refs;
pub mod renderer;
pub mod runtime;

pub use component::{shallow_should_update, Component, ComponentType, Handle, Scope};
pub use descriptor::{
    component, element, portal, stateless, text, void, Children, CompositeDescriptor, Descriptor,
    DescriptorKind, ElementDescriptor, Key, PortalDescriptor, StatelessDescriptor, StatelessFn,
};
pub use events::{Event, EventRegistry};
pub use host::{HostTree, ListenerTarget, SVG_NAMESPACE, XLINK_NAMESPACE, XML_NAMESPACE};
pub use memory_host::{HostOp, MemoryHost};
pub use platform::FlushScheduler;
pub use props::{Context, EventHandler, PropValue, Props};
pub use refs::{ComponentRef, NodeRef, RefTarget};
pub use renderer::{ComponentInfo, ComponentKind, LifecycleHook, RenderOptions, Renderer};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};

/// Identifier of a node owned by a [`HostTree`].
pub type HostId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    Missing { id: HostId },
    NotAChild { parent: HostId, child: HostId },
    NotAnElement { id: HostId },
    ReadOnly { id: HostId, name: String },
    Detached { id: HostId },
    Unmounted,
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Missing { id } => write!(f, "host node {id} missing"),
            HostError::NotAChild { parent, child } => {
                write!(f, "host node {child} is not a child of {parent}")
            }
            HostError::NotAnElement { id } => write!(f, "host node {id} is not an element"),
            HostError::ReadOnly { id, name } => {
                write!(f, "property {name} of host node {id} is read-only")
            }
            HostError::Detached { id } => write!(f, "host node {id} has no parent"),
            HostError::Unmounted => write!(f, "descriptor is not mounted"),
        }
    }
}

impl std::error::Error for HostError {}

/// Failure raised by user component code: a render function or a lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentError {
    message: String,
}

impl ComponentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ComponentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ComponentError {}

impl From<&str> for ComponentError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ComponentError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Error that aborts a render, update or unmount pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A component error that no ancestor boundary recovered.
    Unhandled {
        component: &'static str,
        error: ComponentError,
    },
    Host(HostError),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Unhandled { component, error } => {
                write!(f, "unhandled error in {component}: {error}")
            }
            RenderError::Host(error) => write!(f, "host error: {error}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Unhandled { error, .. } => Some(error),
            RenderError::Host(error) => Some(error),
        }
    }
}

impl From<HostError> for RenderError {
    fn from(error: HostError) -> Self {
        RenderError::Host(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralError {
    NotExactlyOne { count: usize },
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructuralError::NotExactlyOne { count } => {
                write!(f, "expected exactly one child, found {count}")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod reconcile_tests;

#[cfg(test)]
#[path = "tests/keyed_tests.rs"]
mod keyed_tests;

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod lifecycle_tests;

#[cfg(test)]
#[path = "tests/event_tests.rs"]
mod event_tests;
