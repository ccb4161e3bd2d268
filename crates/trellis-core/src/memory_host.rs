//! In-memory [`HostTree`] used by tests, the markup-free demo and tooling.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::collections::map::HashMap;
use crate::host::{HostTree, ListenerTarget};
use crate::props::PropValue;
use crate::{HostError, HostId};

/// Names the in-memory host exposes as element properties.
const PROPERTIES: [&str; 16] = [
    "value",
    "checked",
    "selected",
    "disabled",
    "multiple",
    "muted",
    "id",
    "title",
    "hidden",
    "href",
    "src",
    "name",
    "placeholder",
    "type",
    "list",
    "form",
];

/// Properties that exist but reject assignment.
const READ_ONLY: [&str; 1] = ["form"];

/// One recorded host mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { id: HostId, tag: String },
    CreateText { id: HostId, text: String },
    SetText { id: HostId, text: String },
    Append { parent: HostId, child: HostId },
    InsertBefore { parent: HostId, child: HostId, reference: HostId },
    /// `insert_before` of a node that was already attached.
    Move { parent: HostId, child: HostId, reference: HostId },
    Remove { parent: HostId, child: HostId },
    Replace { parent: HostId, new_child: HostId, old_child: HostId },
    ClearChildren { parent: HostId },
    SetAttribute { id: HostId, name: String, value: String },
    RemoveAttribute { id: HostId, name: String },
    SetProperty { id: HostId, name: String, value: String },
    SetStyle { id: HostId, name: String, value: Option<String> },
    SetStyleText { id: HostId, text: String },
    SetInnerHtml { id: HostId, html: String },
    Listen { target: ListenerTarget, event: String },
    Unlisten { target: ListenerTarget, event: String },
}

impl HostOp {
    /// Listener bookkeeping is not a tree mutation.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, HostOp::Listen { .. } | HostOp::Unlisten { .. })
    }
}

enum NodeKind {
    Element { tag: String, namespace: Option<String> },
    Text(String),
}

struct HostNode {
    kind: NodeKind,
    parent: Option<HostId>,
    children: Vec<HostId>,
    attributes: BTreeMap<String, String>,
    ns_attributes: BTreeMap<(String, String), String>,
    properties: BTreeMap<String, PropValue>,
    style: BTreeMap<String, String>,
    inner_html: Option<String>,
}

impl HostNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            ns_attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            style: BTreeMap::new(),
            inner_html: None,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
    mutations: usize,
    listeners: HashMap<(ListenerTarget, String), usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached container element. Not recorded as a mutation.
    pub fn create_root(&mut self) -> HostId {
        self.push(NodeKind::Element {
            tag: "#root".to_string(),
            namespace: None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Mutations recorded since creation or the last [`MemoryHost::reset_mutations`].
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
        self.ops.clear();
    }

    pub fn tag(&self, id: HostId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn namespace(&self, id: HostId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { namespace, .. } => namespace.as_deref(),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: HostId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: HostId) -> String {
        let mut output = String::new();
        self.collect_text(id, &mut output);
        output
    }

    fn collect_text(&self, id: HostId, output: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => output.push_str(text),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, output);
                }
            }
        }
    }

    pub fn attribute(&self, id: HostId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn attribute_ns(&self, id: HostId, namespace: &str, local_name: &str) -> Option<&str> {
        self.nodes
            .get(id)?
            .ns_attributes
            .get(&(namespace.to_string(), local_name.to_string()))
            .map(String::as_str)
    }

    pub fn property(&self, id: HostId, name: &str) -> Option<&PropValue> {
        self.nodes.get(id)?.properties.get(name)
    }

    pub fn style(&self, id: HostId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.style.get(name).map(String::as_str)
    }

    pub fn inner_html(&self, id: HostId) -> Option<&str> {
        self.nodes.get(id)?.inner_html.as_deref()
    }

    pub fn is_listening(&self, target: ListenerTarget, event: &str) -> bool {
        self.listeners
            .get(&(target, event.to_string()))
            .is_some_and(|count| *count > 0)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().sum()
    }

    pub fn dump_tree(&self, root: Option<HostId>) -> String {
        let mut output = String::new();
        match root {
            Some(root) => self.dump_node(&mut output, root, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: HostId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.nodes.get(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => {
                let _ = writeln!(output, "{indent}[{id}] {text:?}");
            }
            NodeKind::Element { tag, .. } => {
                let _ = write!(output, "{indent}[{id}] <{tag}");
                for (name, value) in &node.attributes {
                    let _ = write!(output, " {name}={value:?}");
                }
                for ((_, name), value) in &node.ns_attributes {
                    let _ = write!(output, " {name}={value:?}");
                }
                for (name, value) in &node.properties {
                    let value = value.to_attribute_value().unwrap_or_default();
                    let _ = write!(output, " .{name}={value:?}");
                }
                if !node.style.is_empty() {
                    let _ = write!(output, " style={:?}", style_text(&node.style));
                }
                output.push_str(">\n");
                if let Some(html) = &node.inner_html {
                    let _ = writeln!(output, "{indent}  (html) {html}");
                }
                for child in &node.children {
                    self.dump_node(output, *child, depth + 1);
                }
            }
        }
    }

    fn push(&mut self, kind: NodeKind) -> HostId {
        let id = self.nodes.len();
        self.nodes.push(HostNode::new(kind));
        id
    }

    fn record(&mut self, op: HostOp) {
        if op.is_mutation() {
            self.mutations += 1;
        }
        self.ops.push(op);
    }

    fn node(&self, id: HostId) -> Result<&HostNode, HostError> {
        self.nodes.get(id).ok_or(HostError::Missing { id })
    }

    fn node_mut(&mut self, id: HostId) -> Result<&mut HostNode, HostError> {
        self.nodes.get_mut(id).ok_or(HostError::Missing { id })
    }

    fn element_mut(&mut self, id: HostId) -> Result<&mut HostNode, HostError> {
        let node = self.node_mut(id)?;
        if !node.is_element() {
            return Err(HostError::NotAnElement { id });
        }
        Ok(node)
    }

    fn detach(&mut self, child: HostId) -> Result<(), HostError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|id| *id != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn index_of(&self, parent: HostId, child: HostId) -> Result<usize, HostError> {
        self.node(parent)?
            .children
            .iter()
            .position(|id| *id == child)
            .ok_or(HostError::NotAChild { parent, child })
    }
}

fn style_text(style: &BTreeMap<String, String>) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn local_name(qualified: &str) -> &str {
    qualified
        .split_once(':')
        .map_or(qualified, |(_, local)| local)
}

impl HostTree for MemoryHost {
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> HostId {
        let id = self.push(NodeKind::Element {
            tag: tag.to_string(),
            namespace: namespace.map(str::to_string),
        });
        self.record(HostOp::CreateElement {
            id,
            tag: tag.to_string(),
        });
        id
    }

    fn create_text(&mut self, text: &str) -> HostId {
        let id = self.push(NodeKind::Text(text.to_string()));
        self.record(HostOp::CreateText {
            id,
            text: text.to_string(),
        });
        id
    }

    fn set_text(&mut self, id: HostId, text: &str) -> Result<(), HostError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(current) => *current = text.to_string(),
            NodeKind::Element { .. } => return Err(HostError::NotAnElement { id }),
        }
        self.record(HostOp::SetText {
            id,
            text: text.to_string(),
        });
        Ok(())
    }

    fn parent(&self, id: HostId) -> Option<HostId> {
        self.nodes.get(id)?.parent
    }

    fn children(&self, id: HostId) -> Vec<HostId> {
        self.nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn append_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError> {
        self.element_mut(parent)?;
        self.detach(child)?;
        let node = self.element_mut(parent)?;
        node.children.push(child);
        node.inner_html = None;
        self.node_mut(child)?.parent = Some(parent);
        self.record(HostOp::Append { parent, child });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: HostId,
        child: HostId,
        reference: HostId,
    ) -> Result<(), HostError> {
        self.element_mut(parent)?;
        self.index_of(parent, reference)?;
        let moved = self.node(child)?.parent.is_some();
        self.detach(child)?;
        let index = self.index_of(parent, reference)?;
        self.element_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        let op = if moved {
            HostOp::Move {
                parent,
                child,
                reference,
            }
        } else {
            HostOp::InsertBefore {
                parent,
                child,
                reference,
            }
        };
        self.record(op);
        Ok(())
    }

    fn remove_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError> {
        let index = self.index_of(parent, child)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.record(HostOp::Remove { parent, child });
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: HostId,
        new_child: HostId,
        old_child: HostId,
    ) -> Result<(), HostError> {
        self.index_of(parent, old_child)?;
        self.detach(new_child)?;
        let index = self.index_of(parent, old_child)?;
        self.node_mut(parent)?.children[index] = new_child;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        self.record(HostOp::Replace {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }

    fn clear_children(&mut self, parent: HostId) -> Result<(), HostError> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.record(HostOp::ClearChildren { parent });
        Ok(())
    }

    fn set_attribute(&mut self, id: HostId, name: &str, value: &str) -> Result<(), HostError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.record(HostOp::SetAttribute {
            id,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, id: HostId, name: &str) -> Result<(), HostError> {
        self.element_mut(id)?.attributes.remove(name);
        self.record(HostOp::RemoveAttribute {
            id,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_attribute_ns(
        &mut self,
        id: HostId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let key = (namespace.to_string(), local_name(name).to_string());
        self.element_mut(id)?
            .ns_attributes
            .insert(key, value.to_string());
        self.record(HostOp::SetAttribute {
            id,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute_ns(
        &mut self,
        id: HostId,
        namespace: &str,
        local_name: &str,
    ) -> Result<(), HostError> {
        let key = (namespace.to_string(), local_name.to_string());
        self.element_mut(id)?.ns_attributes.remove(&key);
        self.record(HostOp::RemoveAttribute {
            id,
            name: local_name.to_string(),
        });
        Ok(())
    }

    fn has_property(&self, id: HostId, name: &str) -> bool {
        self.nodes
            .get(id)
            .is_some_and(|node| node.is_element() && PROPERTIES.contains(&name))
    }

    fn set_property(&mut self, id: HostId, name: &str, value: &PropValue) -> Result<(), HostError> {
        if READ_ONLY.contains(&name) {
            return Err(HostError::ReadOnly {
                id,
                name: name.to_string(),
            });
        }
        self.element_mut(id)?
            .properties
            .insert(name.to_string(), value.clone());
        self.record(HostOp::SetProperty {
            id,
            name: name.to_string(),
            value: value.to_attribute_value().unwrap_or_default(),
        });
        Ok(())
    }

    fn set_style(&mut self, id: HostId, name: &str, value: Option<&str>) -> Result<(), HostError> {
        let style = &mut self.element_mut(id)?.style;
        match value {
            Some(value) => {
                style.insert(name.to_string(), value.to_string());
            }
            None => {
                style.remove(name);
            }
        }
        self.record(HostOp::SetStyle {
            id,
            name: name.to_string(),
            value: value.map(str::to_string),
        });
        Ok(())
    }

    fn set_style_text(&mut self, id: HostId, text: &str) -> Result<(), HostError> {
        let style = &mut self.element_mut(id)?.style;
        style.clear();
        for entry in text.split(';') {
            if let Some((name, value)) = entry.split_once(':') {
                style.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        self.record(HostOp::SetStyleText {
            id,
            text: text.to_string(),
        });
        Ok(())
    }

    fn set_inner_html(&mut self, id: HostId, html: &str) -> Result<(), HostError> {
        self.element_mut(id)?;
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.node_mut(id)?.inner_html = Some(html.to_string());
        self.record(HostOp::SetInnerHtml {
            id,
            html: html.to_string(),
        });
        Ok(())
    }

    fn is_disabled(&self, id: HostId) -> bool {
        self.nodes.get(id).is_some_and(|node| {
            node.attributes.contains_key("disabled")
                || node
                    .properties
                    .get("disabled")
                    .is_some_and(PropValue::is_truthy)
        })
    }

    fn listen(&mut self, target: ListenerTarget, event: &str) {
        *self
            .listeners
            .entry((target, event.to_string()))
            .or_insert(0) += 1;
        self.record(HostOp::Listen {
            target,
            event: event.to_string(),
        });
    }

    fn unlisten(&mut self, target: ListenerTarget, event: &str) {
        let key = (target, event.to_string());
        if let Some(count) = self.listeners.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.listeners.remove(&key);
            }
        }
        self.record(HostOp::Unlisten {
            target,
            event: event.to_string(),
        });
    }
}
