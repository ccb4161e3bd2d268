//! The immutable per-render description of a UI tree.
//!
//! A descriptor is built fresh on every render, mounted once, and from then on
//! its successor is diffed against it. Mount bookkeeping (host node, component
//! instance, rendered output) lives inside the descriptor and moves into the
//! successor during a patch. Cloning a descriptor yields an unmounted copy.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{Component, ComponentType};
use crate::lifecycle::AnyInstance;
use crate::props::{Context, EventHandler, PropValue, Props};
use crate::refs::NodeRef;
use crate::{ComponentError, HostId};

/// Shared cell holding the host node of a component descriptor.
///
/// The cell survives in-place patches so an instance can publish a new root
/// host to every component descriptor that wraps it.
pub(crate) type HostSlot = Rc<Cell<Option<HostId>>>;

pub(crate) type Owner = Weak<dyn AnyInstance>;

pub type StatelessFn = fn(&Props, &Context) -> Result<Descriptor, ComponentError>;

/// Optional guard for stateless components: `(previous, next) -> rerender?`.
pub type ShouldUpdateFn = fn(&Props, &Props) -> bool;

fn fresh_slot() -> HostSlot {
    Rc::new(Cell::new(None))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{value}"),
            Key::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value.into())
    }
}

/// Children of an element or portal.
///
/// `Single` and `Many` are diffed differently: two single children patch
/// directly, anything else is diffed as a sequence. `Empty` is an empty
/// sequence.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    Empty,
    Single(Box<Descriptor>),
    Many(Vec<Descriptor>),
}

impl Children {
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_slice(&self) -> &[Descriptor] {
        match self {
            Children::Empty => &[],
            Children::Single(child) => std::slice::from_ref(child.as_ref()),
            Children::Many(children) => children,
        }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Descriptor] {
        match self {
            Children::Empty => &mut [],
            Children::Single(child) => std::slice::from_mut(child.as_mut()),
            Children::Many(children) => children,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.as_slice().iter()
    }

    fn push(&mut self, child: Descriptor) {
        *self = match std::mem::take(self) {
            Children::Empty => Children::Single(Box::new(child)),
            Children::Single(first) => Children::Many(vec![*first, child]),
            Children::Many(mut children) => {
                children.push(child);
                Children::Many(children)
            }
        };
    }
}

impl From<Vec<Descriptor>> for Children {
    fn from(children: Vec<Descriptor>) -> Self {
        Children::Many(children)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    Element,
    Text,
    Composite,
    Stateless,
    Portal,
    Void,
}

pub enum Descriptor {
    Element(ElementDescriptor),
    Text(TextDescriptor),
    Composite(CompositeDescriptor),
    Stateless(StatelessDescriptor),
    Portal(PortalDescriptor),
    Void(VoidDescriptor),
}

impl Descriptor {
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Element(_) => DescriptorKind::Element,
            Descriptor::Text(_) => DescriptorKind::Text,
            Descriptor::Composite(_) => DescriptorKind::Composite,
            Descriptor::Stateless(_) => DescriptorKind::Stateless,
            Descriptor::Portal(_) => DescriptorKind::Portal,
            Descriptor::Void(_) => DescriptorKind::Void,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Descriptor::Element(element) => element.key.as_ref(),
            Descriptor::Composite(composite) => composite.key.as_ref(),
            Descriptor::Stateless(stateless) => stateless.key.as_ref(),
            Descriptor::Text(_) | Descriptor::Portal(_) | Descriptor::Void(_) => None,
        }
    }

    /// Host node currently backing this descriptor, `None` when unmounted.
    pub fn host(&self) -> Option<HostId> {
        match self {
            Descriptor::Element(element) => element.host,
            Descriptor::Text(text) => text.host,
            Descriptor::Composite(composite) => composite.host.get(),
            Descriptor::Stateless(stateless) => stateless.host.get(),
            Descriptor::Portal(portal) => portal.host,
            Descriptor::Void(void) => void.host,
        }
    }

    pub(crate) fn clear_host(&mut self) {
        match self {
            Descriptor::Element(element) => element.host = None,
            Descriptor::Text(text) => text.host = None,
            Descriptor::Composite(composite) => composite.host.set(None),
            Descriptor::Stateless(stateless) => stateless.host.set(None),
            Descriptor::Portal(portal) => portal.host = None,
            Descriptor::Void(void) => void.host = None,
        }
    }

    /// Whether `other` is the same logical node: equal type identity, variant
    /// and key. Same nodes are updated in place, anything else is replaced.
    pub fn is_same_node(&self, other: &Descriptor) -> bool {
        match (self, other) {
            (Descriptor::Element(a), Descriptor::Element(b)) => a.tag == b.tag && a.key == b.key,
            (Descriptor::Text(_), Descriptor::Text(_)) => true,
            (Descriptor::Composite(a), Descriptor::Composite(b)) => {
                a.component.id() == b.component.id() && a.key == b.key
            }
            (Descriptor::Stateless(a), Descriptor::Stateless(b)) => {
                a.render as usize == b.render as usize && a.key == b.key
            }
            (Descriptor::Portal(a), Descriptor::Portal(b)) => a.target == b.target,
            (Descriptor::Void(_), Descriptor::Void(_)) => true,
            _ => false,
        }
    }

    /// An unmounted copy with `props` merged over the existing properties.
    ///
    /// `key` and `children` entries are lifted out of `props` the way builders
    /// treat them. Text, portal and void descriptors are copied unchanged.
    pub fn cloned_with(&self, mut props: Props) -> Descriptor {
        let key = props.remove("key").and_then(|value| match value {
            PropValue::Int(value) => Some(Key::Int(value)),
            PropValue::Str(value) => Some(Key::Str(value)),
            _ => None,
        });
        let mut copy = self.clone();
        match &mut copy {
            Descriptor::Element(element) => {
                if let Some(PropValue::Nodes(nodes)) = props.remove("children") {
                    element.children = Children::Many(nodes.to_vec());
                }
                element.props.extend(&props);
                if key.is_some() {
                    element.key = key;
                }
            }
            Descriptor::Composite(composite) => {
                Rc::make_mut(&mut composite.props).extend(&props);
                if key.is_some() {
                    composite.key = key;
                }
            }
            Descriptor::Stateless(stateless) => {
                Rc::make_mut(&mut stateless.props).extend(&props);
                if key.is_some() {
                    stateless.key = key;
                }
            }
            Descriptor::Text(_) | Descriptor::Portal(_) | Descriptor::Void(_) => {}
        }
        copy
    }

    pub fn as_element(&self) -> Option<&ElementDescriptor> {
        match self {
            Descriptor::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Descriptor::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

impl Clone for Descriptor {
    fn clone(&self) -> Self {
        match self {
            Descriptor::Element(element) => Descriptor::Element(element.clone()),
            Descriptor::Text(text) => Descriptor::Text(text.clone()),
            Descriptor::Composite(composite) => Descriptor::Composite(composite.clone()),
            Descriptor::Stateless(stateless) => Descriptor::Stateless(stateless.clone()),
            Descriptor::Portal(portal) => Descriptor::Portal(portal.clone()),
            Descriptor::Void(_) => Descriptor::Void(VoidDescriptor::default()),
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Element(element) => f
                .debug_struct("Element")
                .field("tag", &element.tag)
                .field("key", &element.key)
                .field("props", &element.props)
                .field("children", &element.children.as_slice())
                .finish(),
            Descriptor::Text(text) => f.debug_tuple("Text").field(&text.text).finish(),
            Descriptor::Composite(composite) => f
                .debug_struct("Composite")
                .field("component", &composite.component.name())
                .field("key", &composite.key)
                .finish(),
            Descriptor::Stateless(stateless) => f
                .debug_struct("Stateless")
                .field("key", &stateless.key)
                .finish(),
            Descriptor::Portal(portal) => f
                .debug_struct("Portal")
                .field("target", &portal.target)
                .field("children", &portal.children.as_slice())
                .finish(),
            Descriptor::Void(_) => f.write_str("Void"),
        }
    }
}

pub struct ElementDescriptor {
    pub(crate) tag: Rc<str>,
    pub(crate) namespace: Option<Rc<str>>,
    pub(crate) props: Props,
    pub(crate) children: Children,
    pub(crate) key: Option<Key>,
    pub(crate) node_ref: Option<NodeRef>,
    pub(crate) owner: Option<Owner>,
    pub(crate) host: Option<HostId>,
    pub(crate) svg: bool,
}

impl ElementDescriptor {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn child_nodes(&self) -> &Children {
        &self.children
    }

    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Sets a property. `defaultValue` fills `value` unless one is already set.
    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        if name == "defaultValue" {
            if !self.props.contains("value") {
                self.props.set("value", value);
            }
            return self;
        }
        self.props.set(name, value);
        self
    }

    /// Binds an event handler, e.g. `on("onClick", ...)`.
    pub fn on(mut self, event: &str, handler: impl Fn(&crate::events::Event) + 'static) -> Self {
        let handler: EventHandler = Rc::new(handler);
        self.props.set(event, PropValue::Handler(handler));
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn node_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    pub fn namespace_uri(mut self, namespace: impl Into<Rc<str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn child(mut self, child: impl Into<Descriptor>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Replaces the children with a sequence, even when it holds one entry.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        self.children = Children::Many(children.into_iter().map(Into::into).collect());
        self
    }

    pub fn text(self, text: impl Into<Rc<str>>) -> Self {
        self.child(Descriptor::Text(TextDescriptor::new(text)))
    }
}

impl Clone for ElementDescriptor {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            namespace: self.namespace.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            key: self.key.clone(),
            node_ref: self.node_ref.clone(),
            owner: self.owner.clone(),
            host: None,
            svg: false,
        }
    }
}

pub struct TextDescriptor {
    pub(crate) text: Rc<str>,
    pub(crate) host: Option<HostId>,
}

impl TextDescriptor {
    fn new(text: impl Into<Rc<str>>) -> Self {
        Self {
            text: text.into(),
            host: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Clone for TextDescriptor {
    fn clone(&self) -> Self {
        Self::new(self.text.clone())
    }
}

pub struct CompositeDescriptor {
    pub(crate) component: ComponentType,
    pub(crate) props: Rc<Props>,
    pub(crate) key: Option<Key>,
    pub(crate) node_ref: Option<NodeRef>,
    pub(crate) owner: Option<Owner>,
    pub(crate) instance: Option<Rc<dyn AnyInstance>>,
    pub(crate) host: HostSlot,
}

impl CompositeDescriptor {
    pub fn component_type(&self) -> ComponentType {
        self.component
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn node_ref(mut self, node_ref: NodeRef) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let nodes = PropValue::nodes(children.into_iter().map(Into::into));
        Rc::make_mut(&mut self.props).set("children", nodes);
        self
    }
}

impl Clone for CompositeDescriptor {
    fn clone(&self) -> Self {
        Self {
            component: self.component,
            props: self.props.clone(),
            key: self.key.clone(),
            node_ref: self.node_ref.clone(),
            owner: self.owner.clone(),
            instance: None,
            host: fresh_slot(),
        }
    }
}

pub struct StatelessDescriptor {
    pub(crate) render: StatelessFn,
    pub(crate) should_update: Option<ShouldUpdateFn>,
    pub(crate) props: Rc<Props>,
    pub(crate) key: Option<Key>,
    pub(crate) rendered: Option<Box<Descriptor>>,
    pub(crate) host: HostSlot,
}

impl StatelessDescriptor {
    pub fn render_fn(&self) -> StatelessFn {
        self.render
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Skip rerendering when `guard(previous, next)` returns `false`.
    pub fn should_update(mut self, guard: ShouldUpdateFn) -> Self {
        self.should_update = Some(guard);
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descriptor>,
    {
        let nodes = PropValue::nodes(children.into_iter().map(Into::into));
        Rc::make_mut(&mut self.props).set("children", nodes);
        self
    }
}

impl Clone for StatelessDescriptor {
    fn clone(&self) -> Self {
        Self {
            render: self.render,
            should_update: self.should_update,
            props: self.props.clone(),
            key: self.key.clone(),
            rendered: None,
            host: fresh_slot(),
        }
    }
}

/// Children rendered into another host node instead of the parent.
pub struct PortalDescriptor {
    pub(crate) target: HostId,
    pub(crate) children: Children,
    pub(crate) host: Option<HostId>,
}

impl PortalDescriptor {
    pub fn target(&self) -> HostId {
        self.target
    }

    pub fn children(&self) -> &Children {
        &self.children
    }
}

impl Clone for PortalDescriptor {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            children: self.children.clone(),
            host: None,
        }
    }
}

#[derive(Default)]
pub struct VoidDescriptor {
    pub(crate) host: Option<HostId>,
}

impl From<ElementDescriptor> for Descriptor {
    fn from(element: ElementDescriptor) -> Self {
        Descriptor::Element(element)
    }
}

impl From<CompositeDescriptor> for Descriptor {
    fn from(composite: CompositeDescriptor) -> Self {
        Descriptor::Composite(composite)
    }
}

impl From<StatelessDescriptor> for Descriptor {
    fn from(stateless: StatelessDescriptor) -> Self {
        Descriptor::Stateless(stateless)
    }
}

impl From<&str> for Descriptor {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for Descriptor {
    fn from(value: String) -> Self {
        text(value)
    }
}

pub fn element(tag: impl Into<Rc<str>>) -> ElementDescriptor {
    ElementDescriptor {
        tag: tag.into(),
        namespace: None,
        props: Props::new(),
        children: Children::Empty,
        key: None,
        node_ref: None,
        owner: None,
        host: None,
        svg: false,
    }
}

pub fn text(value: impl Into<Rc<str>>) -> Descriptor {
    Descriptor::Text(TextDescriptor::new(value))
}

/// Describes a stateful component; missing props are filled from
/// [`Component::default_props`].
pub fn component<C: Component>(props: Props) -> CompositeDescriptor {
    let mut props = props;
    if let Some(defaults) = C::default_props() {
        for (name, value) in defaults.iter() {
            if !props.contains(name) {
                props.set(name, value.clone());
            }
        }
    }
    CompositeDescriptor {
        component: ComponentType::of::<C>(),
        props: Rc::new(props),
        key: None,
        node_ref: None,
        owner: None,
        instance: None,
        host: fresh_slot(),
    }
}

pub fn stateless(render: StatelessFn, props: Props) -> StatelessDescriptor {
    StatelessDescriptor {
        render,
        should_update: None,
        props: Rc::new(props),
        key: None,
        rendered: None,
        host: fresh_slot(),
    }
}

pub fn portal<I>(target: HostId, children: I) -> Descriptor
where
    I: IntoIterator,
    I::Item: Into<Descriptor>,
{
    Descriptor::Portal(PortalDescriptor {
        target,
        children: Children::Many(children.into_iter().map(Into::into).collect()),
        host: None,
    })
}

pub fn void() -> Descriptor {
    Descriptor::Void(VoidDescriptor::default())
}
