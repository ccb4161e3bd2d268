//! The mutable presentation tree the reconciler writes into.

use crate::props::PropValue;
use crate::{HostError, HostId};

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Where a native listener is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// The document boundary shared by every bubbling event.
    Document,
    Node(HostId),
}

/// Mutation and query interface of a host tree.
///
/// Nodes are addressed by [`HostId`]. Creating a node does not attach it;
/// attachment happens through `append_child`, `insert_before` or
/// `replace_child`. `insert_before` with a child that is already attached
/// moves it.
pub trait HostTree {
    fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> HostId;

    fn create_text(&mut self, text: &str) -> HostId;

    /// Node standing in for a descriptor that renders nothing.
    fn create_placeholder(&mut self) -> HostId {
        self.create_text("")
    }

    fn set_text(&mut self, id: HostId, text: &str) -> Result<(), HostError>;

    fn parent(&self, id: HostId) -> Option<HostId>;

    fn children(&self, id: HostId) -> Vec<HostId>;

    fn append_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError>;

    fn insert_before(
        &mut self,
        parent: HostId,
        child: HostId,
        reference: HostId,
    ) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: HostId, child: HostId) -> Result<(), HostError>;

    fn replace_child(
        &mut self,
        parent: HostId,
        new_child: HostId,
        old_child: HostId,
    ) -> Result<(), HostError>;

    /// Detaches every child of `parent` in one step.
    fn clear_children(&mut self, parent: HostId) -> Result<(), HostError>;

    fn set_attribute(&mut self, id: HostId, name: &str, value: &str) -> Result<(), HostError>;

    fn remove_attribute(&mut self, id: HostId, name: &str) -> Result<(), HostError>;

    fn set_attribute_ns(
        &mut self,
        id: HostId,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<(), HostError>;

    fn remove_attribute_ns(
        &mut self,
        id: HostId,
        namespace: &str,
        local_name: &str,
    ) -> Result<(), HostError>;

    /// Whether `name` is exposed as a writable-looking property on the node.
    fn has_property(&self, id: HostId, name: &str) -> bool;

    fn set_property(&mut self, id: HostId, name: &str, value: &PropValue) -> Result<(), HostError>;

    /// Sets one inline style entry; `None` clears it.
    fn set_style(&mut self, id: HostId, name: &str, value: Option<&str>) -> Result<(), HostError>;

    /// Replaces the whole inline style text.
    fn set_style_text(&mut self, id: HostId, text: &str) -> Result<(), HostError>;

    fn set_inner_html(&mut self, id: HostId, html: &str) -> Result<(), HostError>;

    /// Disabled elements swallow bubbling clicks.
    fn is_disabled(&self, id: HostId) -> bool;

    fn listen(&mut self, target: ListenerTarget, event: &str);

    fn unlisten(&mut self, target: ListenerTarget, event: &str);
}
