//! Serializes descriptor trees to markup without a host tree.
//!
//! Composites are rendered one level at a time through
//! [`ComponentType::render_detached`](trellis_core::ComponentType::render_detached):
//! construction, `will_mount`, pending state and `render` run, while no host
//! node is created and no update is ever scheduled.

use std::fmt::Write as _;

use trellis_core::events::is_event_prop;
use trellis_core::props::{self, Context, PropValue};
use trellis_core::{ComponentError, Descriptor, ElementDescriptor};

/// Elements written as `<tag/>` with no children.
const VOID_ELEMENTS: [&str; 16] = [
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

const SKIPPED: [&str; 4] = ["children", "key", "ref", "owner"];

const RAW_HTML: &str = "dangerouslySetInnerHTML";

/// Markup for `descriptor` and everything it renders.
pub fn render_to_string(descriptor: &Descriptor) -> Result<String, ComponentError> {
    let mut output = String::new();
    write_node(&mut output, descriptor, &Context::default(), false)?;
    Ok(output)
}

/// Same output as [`render_to_string`]; kept as a separate entry point for
/// callers that never hydrate the result.
pub fn render_to_static_markup(descriptor: &Descriptor) -> Result<String, ComponentError> {
    render_to_string(descriptor)
}

fn write_node(
    output: &mut String,
    descriptor: &Descriptor,
    context: &Context,
    svg: bool,
) -> Result<(), ComponentError> {
    match descriptor {
        Descriptor::Text(text) => write_text(output, text.text()),
        Descriptor::Element(element) => write_element(output, element, context, svg)?,
        Descriptor::Composite(composite) => {
            let (rendered, child_context) = composite
                .component_type()
                .render_detached(composite.props(), context)?;
            write_node(output, &rendered, &child_context, svg)?;
        }
        Descriptor::Stateless(stateless) => {
            let rendered = (stateless.render_fn())(stateless.props(), context)?;
            write_node(output, &rendered, context, svg)?;
        }
        Descriptor::Portal(portal) => {
            log::debug!("skipped portal into host node {}", portal.target());
        }
        Descriptor::Void(_) => {}
    }
    Ok(())
}

fn write_text(output: &mut String, text: &str) {
    if text.is_empty() {
        output.push(' ');
    } else {
        output.push_str(&escape(text));
    }
}

fn write_element(
    output: &mut String,
    element: &ElementDescriptor,
    context: &Context,
    svg: bool,
) -> Result<(), ComponentError> {
    let tag = element.tag();
    let svg = svg || tag == "svg";
    let props = element.props();
    let mut html = None;

    output.push('<');
    output.push_str(tag);
    for (name, value) in props.iter() {
        if value.is_null() || SKIPPED.contains(&name) || is_event_prop(name) {
            continue;
        }
        match name {
            RAW_HTML => html = value.as_html().or_else(|| value.as_str()),
            "style" => {
                let css = style_text(value);
                if !css.is_empty() {
                    write_attribute(output, "style", &css);
                }
            }
            "class" | "className" => write_attribute(output, "class", &class_text(value)),
            "defaultValue" => {
                if !props.value("value").is_truthy() {
                    write_value(output, "value", value);
                }
            }
            "defaultChecked" => {
                if !props.value("checked").is_truthy() {
                    write_value(output, "checked", value);
                }
            }
            _ if svg && name.starts_with("xlink") => {
                let local = name["xlink".len()..].trim_start_matches(':');
                let name = format!("xlink:{}", local.to_ascii_lowercase());
                write_value(output, &name, value);
            }
            _ => write_value(output, name, value),
        }
    }

    if VOID_ELEMENTS.contains(&tag) {
        output.push_str("/>");
        return Ok(());
    }
    output.push('>');
    match html {
        Some(html) => output.push_str(html),
        None => {
            let child_svg = match tag {
                "svg" => true,
                "foreignObject" => false,
                _ => svg,
            };
            for child in element.child_nodes().iter() {
                write_node(output, child, context, child_svg)?;
            }
        }
    }
    let _ = write!(output, "</{tag}>");
    Ok(())
}

fn write_value(output: &mut String, name: &str, value: &PropValue) {
    match value {
        PropValue::Bool(true) => {
            output.push(' ');
            output.push_str(name);
        }
        PropValue::Str(_) | PropValue::Int(_) | PropValue::Float(_) => {
            if let Some(text) = value.to_attribute_value() {
                write_attribute(output, name, &text);
            }
        }
        _ => {}
    }
}

fn write_attribute(output: &mut String, name: &str, value: &str) {
    let _ = write!(output, " {name}=\"{}\"", escape(value));
}

/// CSS text for a `style` prop: strings pass through, maps become
/// `name:value;` pairs.
fn style_text(value: &PropValue) -> String {
    match value {
        PropValue::Str(text) => text.to_string(),
        PropValue::Style(entries) => {
            let mut css = String::new();
            for (name, entry) in entries.iter() {
                if !matches!(
                    entry,
                    PropValue::Str(_) | PropValue::Int(_) | PropValue::Float(_)
                ) {
                    continue;
                }
                if let Some(text) = props::style_value(name, entry) {
                    let _ = write!(css, "{}:{text};", css_property_name(name));
                }
            }
            css
        }
        _ => String::new(),
    }
}

/// `fontSize` becomes `font-size`.
fn css_property_name(name: &str) -> String {
    let mut css = String::with_capacity(name.len() + 2);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            css.push('-');
            css.push(ch.to_ascii_lowercase());
        } else {
            css.push(ch);
        }
    }
    css
}

/// A class map lists the names whose value is truthy.
fn class_text(value: &PropValue) -> String {
    match value {
        PropValue::Style(entries) => entries
            .iter()
            .filter(|(_, enabled)| enabled.is_truthy())
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_attribute_value().unwrap_or_default(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/markup_tests.rs"]
mod tests;
