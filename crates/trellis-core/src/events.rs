//! Event delegation.
//!
//! Bubbling events get one native listener at the document boundary per event
//! name; dispatch then walks from the originating node to the root, invoking
//! registered handlers. Events that do not bubble get a listener on every node
//! that registers a handler.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::host::{HostTree, ListenerTarget};
use crate::props::{EventHandler, PropValue};
use crate::HostId;

const NON_BUBBLING: [&str; 41] = [
    "mousemove",
    "touchmove",
    "mouseleave",
    "mouseenter",
    "load",
    "unload",
    "scroll",
    "focus",
    "blur",
    "rowexit",
    "beforeunload",
    "stop",
    "dragdrop",
    "dragenter",
    "dragexit",
    "draggesture",
    "dragover",
    "contextmenu",
    "error",
    "abort",
    "canplay",
    "canplaythrough",
    "durationchange",
    "emptied",
    "ended",
    "loadeddata",
    "loadedmetadata",
    "loadstart",
    "encrypted",
    "pause",
    "play",
    "playing",
    "progress",
    "ratechange",
    "seeking",
    "seeked",
    "stalled",
    "suspend",
    "timeupdate",
    "volumechange",
    "waiting",
];

/// Whether a prop name binds an event handler.
pub fn is_event_prop(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

/// Whether the native event `name` propagates to ancestors.
pub fn bubbles(name: &str) -> bool {
    !NON_BUBBLING.contains(&name)
}

/// Native event name for an event prop on an element with `tag` and an
/// optional `type` attribute, e.g. `onClick` on a `button` is `click`.
pub fn native_event_name(prop: &str, tag: &str, input_type: Option<&str>) -> String {
    let fixed = match prop {
        "onDoubleClick" => "ondblclick".to_string(),
        "onTouchTap" => "onclick".to_string(),
        "onChange" if fires_input(tag, input_type) => "oninput".to_string(),
        _ => prop.to_ascii_lowercase(),
    };
    fixed.strip_prefix("on").unwrap_or(&fixed).to_string()
}

fn fires_input(tag: &str, input_type: Option<&str>) -> bool {
    match tag.to_ascii_lowercase().as_str() {
        "textarea" => true,
        "input" => {
            let kind = input_type.unwrap_or("text");
            kind.contains("text") || kind.contains("password")
        }
        _ => false,
    }
}

/// Event passed to handlers.
pub struct Event {
    name: Rc<str>,
    target: HostId,
    current_target: Cell<HostId>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
    detail: PropValue,
}

impl Event {
    pub fn new(name: impl Into<Rc<str>>, target: HostId, detail: PropValue) -> Self {
        Self {
            name: name.into(),
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            detail,
        }
    }

    /// Native event name, e.g. `click`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node the event originated on.
    pub fn target(&self) -> HostId {
        self.target
    }

    /// Node whose handler is currently running.
    pub fn current_target(&self) -> HostId {
        self.current_target.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn detail(&self) -> &PropValue {
        &self.detail
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("current_target", &self.current_target.get())
            .field("propagation_stopped", &self.propagation_stopped.get())
            .finish()
    }
}

type HandlerTable = HashMap<HostId, EventHandler>;

/// Per-renderer handler registry.
#[derive(Default)]
pub struct EventRegistry {
    bubbling: HashMap<Rc<str>, HandlerTable>,
    direct: HashMap<Rc<str>, HandlerTable>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event` on `node`, installing a native listener
    /// when this is the first handler that needs one.
    pub(crate) fn attach(
        &mut self,
        host: &mut dyn HostTree,
        node: HostId,
        event: &str,
        handler: EventHandler,
    ) {
        if bubbles(event) {
            let table = self.bubbling.entry(Rc::from(event)).or_default();
            if table.is_empty() {
                host.listen(ListenerTarget::Document, event);
            }
            table.insert(node, handler);
        } else {
            let table = self.direct.entry(Rc::from(event)).or_default();
            if table.insert(node, handler).is_none() {
                host.listen(ListenerTarget::Node(node), event);
            }
        }
    }

    pub(crate) fn detach(&mut self, host: &mut dyn HostTree, node: HostId, event: &str) {
        if bubbles(event) {
            let Some(table) = self.bubbling.get_mut(event) else {
                return;
            };
            if table.remove(&node).is_some() && table.is_empty() {
                self.bubbling.remove(event);
                host.unlisten(ListenerTarget::Document, event);
            }
        } else {
            let Some(table) = self.direct.get_mut(event) else {
                return;
            };
            if table.remove(&node).is_some() {
                host.unlisten(ListenerTarget::Node(node), event);
                if table.is_empty() {
                    self.direct.remove(event);
                }
            }
        }
    }

    /// Number of handlers registered for the native event `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        let table = if bubbles(event) {
            self.bubbling.get(event)
        } else {
            self.direct.get(event)
        };
        table.map_or(0, |table| table.len())
    }

    pub fn has_handler(&self, node: HostId, event: &str) -> bool {
        self.bubbling
            .get(event)
            .or_else(|| self.direct.get(event))
            .is_some_and(|table| table.contains_key(&node))
    }

    /// Runs the handlers a native listener for `event` would reach.
    pub(crate) fn dispatch(&self, host: &dyn HostTree, event: &Event) {
        let name = event.name();
        if let Some(table) = self.bubbling.get(name) {
            Self::bubble(table, host, event);
        } else if let Some(handler) = self
            .direct
            .get(name)
            .and_then(|table| table.get(&event.target()))
            .cloned()
        {
            handler(event);
        }
    }

    fn bubble(table: &HandlerTable, host: &dyn HostTree, event: &Event) {
        let mut remaining = table.len();
        let mut node = event.target();
        while remaining > 0 {
            if let Some(handler) = table.get(&node).cloned() {
                remaining -= 1;
                event.current_target.set(node);
                handler(event);
                if event.is_propagation_stopped() {
                    return;
                }
            }
            if remaining == 0 {
                return;
            }
            let Some(parent) = host.parent(node) else {
                return;
            };
            if event.name() == "click" && host.is_disabled(parent) {
                return;
            }
            node = parent;
        }
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("bubbling", &self.bubbling.keys().collect::<Vec<_>>())
            .field("direct", &self.direct.keys().collect::<Vec<_>>())
            .finish()
    }
}
