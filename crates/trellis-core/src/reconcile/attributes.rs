use crate::descriptor::{Children, ElementDescriptor};
use crate::events::{self, native_event_name};
use crate::host::{HostTree, XLINK_NAMESPACE, XML_NAMESPACE};
use crate::props::{self, PropValue};
use crate::{HostError, HostId, RenderError};

use super::{unmount_all, RenderPass};

const RAW_HTML: &str = "dangerouslySetInnerHTML";

/// Props that never reach the host.
const RESERVED: [&str; 4] = ["children", "key", "ref", "owner"];

/// The element a prop is written to.
struct Target<'e> {
    id: HostId,
    tag: &'e str,
    input_type: Option<&'e str>,
    svg: bool,
}

impl<'e> Target<'e> {
    fn of(element: &'e ElementDescriptor, id: HostId) -> Self {
        Self {
            id,
            tag: &element.tag,
            input_type: element.props.str("type"),
            svg: element.svg,
        }
    }

    fn event_name(&self, prop: &str) -> String {
        native_event_name(prop, self.tag, self.input_type)
    }
}

pub(super) fn mount_props(
    element: &ElementDescriptor,
    id: HostId,
    pass: &mut RenderPass<'_>,
) -> Result<(), RenderError> {
    let target = Target::of(element, id);
    for (name, value) in element.props.iter() {
        patch_prop(pass, &target, None, name, &PropValue::Null, value)?;
    }
    Ok(())
}

pub(super) fn patch_props(
    old: &mut ElementDescriptor,
    new: &ElementDescriptor,
    id: HostId,
    pass: &mut RenderPass<'_>,
) -> Result<(), RenderError> {
    let target = Target::of(new, id);
    for (name, previous) in old.props.iter() {
        if previous.is_null() || !new.props.value(name).is_null() {
            continue;
        }
        remove_prop(pass, &target, name, previous)?;
    }
    for (name, next) in new.props.iter() {
        let previous = old.props.value(name);
        patch_prop(pass, &target, Some(&mut old.children), name, previous, next)?;
    }
    Ok(())
}

/// Unregisters every handler bound through `element`'s props.
pub(super) fn detach_handlers(element: &ElementDescriptor, id: HostId, pass: &mut RenderPass<'_>) {
    let target = Target::of(element, id);
    for (name, value) in element.props.iter() {
        if events::is_event_prop(name) && value.as_handler().is_some() {
            pass.events
                .detach(&mut *pass.host, id, &target.event_name(name));
        }
    }
}

fn remove_prop(
    pass: &mut RenderPass<'_>,
    target: &Target<'_>,
    name: &str,
    previous: &PropValue,
) -> Result<(), HostError> {
    let id = target.id;
    if events::is_event_prop(name) {
        if previous.as_handler().is_some() {
            pass.events
                .detach(&mut *pass.host, id, &target.event_name(name));
        }
        Ok(())
    } else if name == RAW_HTML {
        pass.host.clear_children(id)
    } else if name == "className" {
        pass.host.remove_attribute(id, "class")
    } else if name == "style" {
        pass.host.set_style_text(id, "")
    } else if RESERVED.contains(&name) {
        Ok(())
    } else {
        pass.host.remove_attribute(id, name)
    }
}

fn patch_prop(
    pass: &mut RenderPass<'_>,
    target: &Target<'_>,
    tracked: Option<&mut Children>,
    name: &str,
    previous: &PropValue,
    next: &PropValue,
) -> Result<(), RenderError> {
    // `value` is re-applied even when unchanged since the host may have edited it.
    if previous.same(next) && name != "value" {
        return Ok(());
    }
    let name = if name == "className" { "class" } else { name };
    if RESERVED.contains(&name) {
        return Ok(());
    }
    let id = target.id;

    if name == "class" && !target.svg {
        match next.to_attribute_value() {
            Some(class) if !next.is_null() => pass.host.set_attribute(id, "class", &class)?,
            _ => pass.host.remove_attribute(id, "class")?,
        }
        return Ok(());
    }

    if name == RAW_HTML {
        let next_html = next.as_html();
        if previous.as_html() != next_html {
            if let Some(html) = next_html {
                if let Some(children) = tracked {
                    if !children.is_empty() {
                        unmount_all(children.as_mut_slice(), None, pass)?;
                        *children = Children::Empty;
                    }
                }
                pass.host.set_inner_html(id, html)?;
            }
        }
        return Ok(());
    }

    if events::is_event_prop(name) {
        let event = target.event_name(name);
        if previous.as_handler().is_some() {
            pass.events.detach(&mut *pass.host, id, &event);
        }
        if let Some(handler) = next.as_handler() {
            pass.events
                .attach(&mut *pass.host, id, &event, handler.clone());
        }
        return Ok(());
    }

    if name == "style" {
        patch_style(&mut *pass.host, id, previous, next)?;
        return Ok(());
    }

    if name != "list" && name != "type" && !target.svg && pass.host.has_property(id, name) {
        let value = if next.is_null() {
            PropValue::Str("".into())
        } else {
            next.clone()
        };
        if let Err(error) = pass.host.set_property(id, name, &value) {
            log::debug!("ignored property {name} on node {id}: {error}");
        }
        if next.is_null_or_false() {
            pass.host.remove_attribute(id, name)?;
        }
        return Ok(());
    }

    if next.is_null_or_false() {
        pass.host.remove_attribute(id, name)?;
        return Ok(());
    }

    if target.svg {
        if let Some(namespace) = attribute_namespace(name) {
            match next.to_attribute_value() {
                Some(value) if next.is_truthy() => {
                    pass.host.set_attribute_ns(id, namespace, name, &value)?
                }
                _ => {
                    let local = name.split_once(':').map_or(name, |(_, local)| local);
                    pass.host.remove_attribute_ns(id, namespace, local)?
                }
            }
            return Ok(());
        }
    }

    if let Some(value) = next.to_attribute_value() {
        pass.host.set_attribute(id, name, &value)?;
    }
    Ok(())
}

fn patch_style(
    host: &mut dyn HostTree,
    id: HostId,
    previous: &PropValue,
    next: &PropValue,
) -> Result<(), HostError> {
    match next {
        PropValue::Str(text) => host.set_style_text(id, text),
        PropValue::Style(entries) => {
            if let PropValue::Style(previous) = previous {
                for (name, value) in entries.iter() {
                    if !value.same(previous.value(name)) {
                        host.set_style(id, name, props::style_value(name, value).as_deref())?;
                    }
                }
                for (name, _) in previous.iter() {
                    if entries.value(name).is_null() {
                        host.set_style(id, name, None)?;
                    }
                }
            } else {
                for (name, value) in entries.iter() {
                    host.set_style(id, name, props::style_value(name, value).as_deref())?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn attribute_namespace(name: &str) -> Option<&'static str> {
    match name {
        "xlink:actuate" | "xlink:arcrole" | "xlink:href" | "xlink:role" | "xlink:show"
        | "xlink:title" | "xlink:type" => Some(XLINK_NAMESPACE),
        "xml:base" | "xml:lang" | "xml:space" => Some(XML_NAMESPACE),
        _ => None,
    }
}
