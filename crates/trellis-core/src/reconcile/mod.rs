//! Mounting, patching and unmounting of descriptor trees.

mod attributes;
mod keyed;

use std::rc::Rc;

use smallvec::SmallVec;

use crate::descriptor::{
    self, Children, CompositeDescriptor, Descriptor, ElementDescriptor, HostSlot, Owner,
    StatelessDescriptor,
};
use crate::events::EventRegistry;
use crate::host::{HostTree, SVG_NAMESPACE};
use crate::lifecycle::{self, AnyInstance};
use crate::props::{Context, PropValue, Props};
use crate::refs::{self, ComponentRef, RefTarget};
use crate::renderer::{ComponentInfo, ComponentKind, RenderOptions};
use crate::runtime::RuntimeHandle;
use crate::{HostError, HostId, RenderError};

#[cfg(test)]
pub(crate) use keyed::longest_increasing_subsequence;

const STATELESS: &str = "stateless component";

/// State shared by everything one top-level render, flush or unmount touches.
pub(crate) struct RenderPass<'a> {
    pub(crate) host: &'a mut dyn HostTree,
    pub(crate) events: &'a mut EventRegistry,
    pub(crate) runtime: RuntimeHandle,
    pub(crate) options: &'a RenderOptions,
    /// Instances waiting for `did_mount`, children ahead of their ancestors.
    pub(crate) mounted: Vec<Rc<dyn AnyInstance>>,
}

impl<'a> RenderPass<'a> {
    pub(crate) fn new(
        host: &'a mut dyn HostTree,
        events: &'a mut EventRegistry,
        runtime: RuntimeHandle,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            host,
            events,
            runtime,
            options,
            mounted: Vec::new(),
        }
    }

    pub(crate) fn drain_mounted(&mut self) -> Result<(), RenderError> {
        let queue = std::mem::take(&mut self.mounted);
        for instance in queue {
            instance.did_mount()?;
        }
        Ok(())
    }

    fn hook(&self, hook: Option<&crate::renderer::LifecycleHook>, info: ComponentInfo) {
        if let Some(hook) = hook {
            hook(&info);
        }
    }
}

/// Per-subtree inputs that flow down from the nearest component.
#[derive(Clone, Default)]
pub(crate) struct Frame {
    pub(crate) context: Context,
    pub(crate) svg: bool,
    pub(crate) owner: Option<Owner>,
    /// Host slots of the component descriptors whose rendered root is the
    /// subtree about to be mounted.
    pub(crate) wrappers: SmallVec<[HostSlot; 2]>,
}

impl Frame {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    pub(crate) fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub(crate) fn component(
        context: Context,
        svg: bool,
        owner: Owner,
        wrappers: SmallVec<[HostSlot; 2]>,
    ) -> Self {
        Self {
            context,
            svg,
            owner: Some(owner),
            wrappers,
        }
    }

    fn element(&self, svg: bool) -> Self {
        Self {
            context: self.context.clone(),
            svg,
            owner: self.owner.clone(),
            wrappers: SmallVec::new(),
        }
    }

    fn wrapped(&self, slot: HostSlot) -> Self {
        let mut frame = self.clone();
        frame.wrappers.push(slot);
        frame
    }
}

/// Records `owner` on every element and composite in `descriptor` that has
/// none yet, so named refs resolve against the component that created them.
pub(crate) fn stamp_owner(descriptor: &mut Descriptor, owner: &Owner) {
    match descriptor {
        Descriptor::Element(element) => {
            if element.owner.is_none() {
                element.owner = Some(owner.clone());
            }
            for child in element.children.as_mut_slice() {
                stamp_owner(child, owner);
            }
        }
        Descriptor::Composite(composite) => {
            if composite.owner.is_none() {
                composite.owner = Some(owner.clone());
            }
            stamp_passed_children(&mut composite.props, owner);
        }
        Descriptor::Stateless(stateless) => stamp_passed_children(&mut stateless.props, owner),
        Descriptor::Portal(portal) => {
            for child in portal.children.as_mut_slice() {
                stamp_owner(child, owner);
            }
        }
        Descriptor::Text(_) | Descriptor::Void(_) => {}
    }
}

fn stamp_passed_children(props: &mut Rc<Props>, owner: &Owner) {
    let Some(props) = Rc::get_mut(props) else {
        return;
    };
    if let Some(PropValue::Nodes(nodes)) = props.get_mut("children") {
        if let Some(nodes) = Rc::get_mut(nodes) {
            for node in nodes.iter_mut() {
                stamp_owner(node, owner);
            }
        }
    }
}

/// Creates host nodes for `descriptor` and returns its root. The root is not
/// attached; the caller inserts it.
pub(crate) fn mount(
    descriptor: &mut Descriptor,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    match descriptor {
        Descriptor::Element(element) => mount_element(element, pass, frame),
        Descriptor::Text(text) => {
            let id = pass.host.create_text(&text.text);
            text.host = Some(id);
            Ok(id)
        }
        Descriptor::Void(void) => {
            let id = pass.host.create_placeholder();
            void.host = Some(id);
            Ok(id)
        }
        Descriptor::Portal(portal) => {
            let child_frame = frame.element(false);
            for child in portal.children.as_mut_slice() {
                let child_host = mount(child, pass, &child_frame)?;
                pass.host.append_child(portal.target, child_host)?;
            }
            let id = pass.host.create_placeholder();
            portal.host = Some(id);
            Ok(id)
        }
        Descriptor::Composite(composite) => mount_composite(composite, pass, frame),
        Descriptor::Stateless(stateless) => mount_stateless(stateless, pass, frame),
    }
}

fn mount_element(
    element: &mut ElementDescriptor,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let svg = frame.svg || &*element.tag == "svg";
    let namespace = match (&element.namespace, svg) {
        (Some(namespace), _) => Some(&**namespace),
        (None, true) => Some(SVG_NAMESPACE),
        (None, false) => None,
    };
    let id = pass.host.create_element(&element.tag, namespace);
    element.host = Some(id);
    element.svg = svg;

    let child_frame = frame.element(svg);
    for child in element.children.as_mut_slice() {
        let child_host = mount(child, pass, &child_frame)?;
        pass.host.append_child(id, child_host)?;
    }
    attributes::mount_props(element, id, pass)?;
    if let Some(node_ref) = &element.node_ref {
        refs::attach(node_ref, RefTarget::Host(id), element.owner.as_ref());
    }
    Ok(id)
}

fn mount_composite(
    composite: &mut CompositeDescriptor,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let instance = (composite.component.instantiate)(
        composite.props.clone(),
        frame.context.clone(),
        &pass.runtime,
        frame.owner.clone(),
    );
    composite.instance = Some(instance.clone());
    let host = instance.clone().mount(pass, frame, composite.host.clone())?;
    if let Some(node_ref) = &composite.node_ref {
        let target = RefTarget::Component(ComponentRef::new(&instance));
        refs::attach(node_ref, target, composite.owner.as_ref());
    }
    pass.hook(
        pass.options.after_mount.as_ref(),
        ComponentInfo {
            name: instance.name(),
            kind: ComponentKind::Composite,
            host: Some(host),
        },
    );
    Ok(host)
}

fn render_stateless(
    stateless: &StatelessDescriptor,
    frame: &Frame,
) -> Result<Descriptor, RenderError> {
    match (stateless.render)(&stateless.props, &frame.context) {
        Ok(mut rendered) => {
            if let Some(owner) = &frame.owner {
                stamp_owner(&mut rendered, owner);
            }
            Ok(rendered)
        }
        Err(error) => {
            let origin = frame.owner.as_ref().and_then(|owner| owner.upgrade());
            lifecycle::route_error(origin, STATELESS, error).into_result()?;
            Ok(descriptor::void())
        }
    }
}

fn mount_stateless(
    stateless: &mut StatelessDescriptor,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let mut rendered = render_stateless(stateless, frame)?;
    let host = mount(&mut rendered, pass, &frame.wrapped(stateless.host.clone()))?;
    stateless.host.set(Some(host));
    stateless.rendered = Some(Box::new(rendered));
    pass.hook(
        pass.options.after_mount.as_ref(),
        ComponentInfo {
            name: STATELESS,
            kind: ComponentKind::Stateless,
            host: Some(host),
        },
    );
    Ok(host)
}

/// Brings the host subtree of `old` in line with `new` and returns the
/// resulting root. Mount state moves from `old` into `new`.
pub(crate) fn patch(
    old: &mut Descriptor,
    new: &mut Descriptor,
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    if !old.is_same_node(new) {
        return replace(old, new, parent, pass, frame);
    }
    match (old, new) {
        (Descriptor::Element(old), Descriptor::Element(new)) => {
            patch_element(old, new, pass, frame)
        }
        (Descriptor::Text(old), Descriptor::Text(new)) => {
            let id = old.host.ok_or(HostError::Unmounted)?;
            if old.text != new.text {
                pass.host.set_text(id, &new.text)?;
            }
            new.host = Some(id);
            Ok(id)
        }
        (Descriptor::Void(old), Descriptor::Void(new)) => {
            new.host = old.host;
            Ok(new.host.ok_or(HostError::Unmounted)?)
        }
        (Descriptor::Portal(old), Descriptor::Portal(new)) => {
            let child_frame = frame.element(false);
            patch_children(
                &mut old.children,
                &mut new.children,
                old.target,
                pass,
                &child_frame,
            )?;
            new.host = old.host;
            Ok(new.host.ok_or(HostError::Unmounted)?)
        }
        (Descriptor::Composite(old), Descriptor::Composite(new)) => {
            patch_composite(old, new, parent, pass, frame)
        }
        (Descriptor::Stateless(old), Descriptor::Stateless(new)) => {
            patch_stateless(old, new, parent, pass, frame)
        }
        (old, new) => replace(old, new, parent, pass, frame),
    }
}

fn replace(
    old: &mut Descriptor,
    new: &mut Descriptor,
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let old_host = old.host().ok_or(HostError::Unmounted)?;
    unmount(old, None, pass)?;
    let new_host = mount(new, pass, frame)?;
    pass.host.replace_child(parent, new_host, old_host)?;
    Ok(new_host)
}

fn patch_element(
    old: &mut ElementDescriptor,
    new: &mut ElementDescriptor,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let id = old.host.ok_or(HostError::Unmounted)?;
    new.host = Some(id);
    new.svg = old.svg || frame.svg;
    attributes::patch_props(old, new, id, pass)?;
    let child_frame = frame.element(new.svg);
    patch_children(&mut old.children, &mut new.children, id, pass, &child_frame)?;
    refs::update(
        old.node_ref.as_ref(),
        new.node_ref.as_ref(),
        RefTarget::Host(id),
        old.owner.as_ref(),
        new.owner.as_ref(),
    );
    Ok(id)
}

fn patch_composite(
    old: &mut CompositeDescriptor,
    new: &mut CompositeDescriptor,
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    let instance = old.instance.take().ok_or(HostError::Unmounted)?;
    new.host = old.host.clone();
    new.instance = Some(instance.clone());
    let host = instance
        .clone()
        .receive(pass, new.props.clone(), frame.context.clone(), parent)?;
    refs::update(
        old.node_ref.as_ref(),
        new.node_ref.as_ref(),
        RefTarget::Component(ComponentRef::new(&instance)),
        old.owner.as_ref(),
        new.owner.as_ref(),
    );
    Ok(host)
}

fn patch_stateless(
    old: &mut StatelessDescriptor,
    new: &mut StatelessDescriptor,
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<HostId, RenderError> {
    new.host = old.host.clone();
    let mut previous = old.rendered.take().ok_or(HostError::Unmounted)?;
    let rerender = new
        .should_update
        .map_or(true, |guard| guard(&old.props, &new.props));
    if !rerender {
        new.rendered = Some(previous);
        return Ok(new.host.get().ok_or(HostError::Unmounted)?);
    }
    let mut next = render_stateless(new, frame)?;
    let host = patch(
        &mut previous,
        &mut next,
        parent,
        pass,
        &frame.wrapped(new.host.clone()),
    )?;
    new.host.set(Some(host));
    new.rendered = Some(Box::new(next));
    pass.hook(
        pass.options.after_update.as_ref(),
        ComponentInfo {
            name: STATELESS,
            kind: ComponentKind::Stateless,
            host: Some(host),
        },
    );
    Ok(host)
}

/// Tears down `descriptor`, detaching its root from `parent` when given.
pub(crate) fn unmount(
    descriptor: &mut Descriptor,
    parent: Option<HostId>,
    pass: &mut RenderPass<'_>,
) -> Result<(), RenderError> {
    let host = descriptor.host();
    match descriptor {
        Descriptor::Composite(composite) => {
            if let Some(instance) = composite.instance.take() {
                pass.hook(
                    pass.options.before_unmount.as_ref(),
                    ComponentInfo {
                        name: instance.name(),
                        kind: ComponentKind::Composite,
                        host,
                    },
                );
                instance.unmount(pass)?;
                if let Some(node_ref) = &composite.node_ref {
                    let target = RefTarget::Component(ComponentRef::new(&instance));
                    refs::detach(node_ref, &target, composite.owner.as_ref());
                }
            }
        }
        Descriptor::Stateless(stateless) => {
            if let Some(mut rendered) = stateless.rendered.take() {
                unmount(&mut rendered, None, pass)?;
            }
        }
        Descriptor::Element(element) => {
            unmount_all(element.children.as_mut_slice(), None, pass)?;
            if let Some(id) = element.host {
                attributes::detach_handlers(element, id, pass);
                if let Some(node_ref) = &element.node_ref {
                    refs::detach(node_ref, &RefTarget::Host(id), element.owner.as_ref());
                }
            }
        }
        Descriptor::Portal(portal) => {
            unmount_all(portal.children.as_mut_slice(), Some(portal.target), pass)?;
        }
        Descriptor::Text(_) | Descriptor::Void(_) => {}
    }
    if let (Some(parent), Some(host)) = (parent, host) {
        pass.host.remove_child(parent, host)?;
    }
    descriptor.clear_host();
    Ok(())
}

pub(crate) fn unmount_all(
    descriptors: &mut [Descriptor],
    parent: Option<HostId>,
    pass: &mut RenderPass<'_>,
) -> Result<(), RenderError> {
    for descriptor in descriptors {
        unmount(descriptor, parent, pass)?;
    }
    Ok(())
}

/// Diffs two child lists of `parent`.
pub(crate) fn patch_children(
    old: &mut Children,
    new: &mut Children,
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<(), RenderError> {
    if let (Children::Single(old), Children::Single(new)) = (&mut *old, &mut *new) {
        patch(old, new, parent, pass, frame)?;
        return Ok(());
    }
    patch_sequence(old.as_mut_slice(), new.as_mut_slice(), parent, pass, frame)
}

fn patch_sequence(
    old: &mut [Descriptor],
    new: &mut [Descriptor],
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<(), RenderError> {
    if old.is_empty() {
        for child in new.iter_mut() {
            let host = mount(child, pass, frame)?;
            pass.host.append_child(parent, host)?;
        }
        return Ok(());
    }
    if new.is_empty() {
        unmount_all(old, None, pass)?;
        pass.host.clear_children(parent)?;
        return Ok(());
    }
    // Only the first entry of each side decides whether keys are in play.
    if old[0].key().is_some() && new[0].key().is_some() {
        keyed::patch_keyed(old, new, parent, pass, frame)
    } else {
        patch_positional(old, new, parent, pass, frame)
    }
}

fn patch_positional(
    old: &mut [Descriptor],
    new: &mut [Descriptor],
    parent: HostId,
    pass: &mut RenderPass<'_>,
    frame: &Frame,
) -> Result<(), RenderError> {
    let common = old.len().min(new.len());
    for (old, new) in old.iter_mut().zip(new.iter_mut()) {
        patch(old, new, parent, pass, frame)?;
    }
    for child in &mut new[common..] {
        let host = mount(child, pass, frame)?;
        pass.host.append_child(parent, host)?;
    }
    unmount_all(&mut old[common..], Some(parent), pass)
}

/// Attaches `child` before `reference`, or last when there is none.
fn insert(
    pass: &mut RenderPass<'_>,
    parent: HostId,
    child: HostId,
    reference: Option<HostId>,
) -> Result<(), HostError> {
    match reference {
        Some(reference) => pass.host.insert_before(parent, child, reference),
        None => pass.host.append_child(parent, child),
    }
}
