//! Property maps carried by descriptors and the context passed down the tree.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::descriptor::Descriptor;
use crate::events::Event;

pub type EventHandler = Rc<dyn Fn(&Event)>;

const NULL: &PropValue = &PropValue::Null;

/// A single property value.
///
/// Scalars compare by value. Style maps, handlers, descriptor lists and opaque
/// values compare by pointer identity, so rebuilding one during render counts
/// as a change.
#[derive(Clone, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Style(Rc<Props>),
    Html(Rc<str>),
    Handler(EventHandler),
    Nodes(Rc<[Descriptor]>),
    Any(Rc<dyn Any>),
}

impl PropValue {
    pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
        PropValue::Handler(Rc::new(f))
    }

    pub fn style(entries: Props) -> Self {
        PropValue::Style(Rc::new(entries))
    }

    pub fn html(markup: impl Into<Rc<str>>) -> Self {
        PropValue::Html(markup.into())
    }

    pub fn nodes(nodes: impl IntoIterator<Item = Descriptor>) -> Self {
        PropValue::Nodes(nodes.into_iter().collect())
    }

    pub fn any<T: Any>(value: T) -> Self {
        PropValue::Any(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    /// Null or `false`: values that remove an attribute rather than set it.
    pub fn is_null_or_false(&self) -> bool {
        matches!(self, PropValue::Null | PropValue::Bool(false))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(value) => *value,
            PropValue::Int(value) => *value != 0,
            PropValue::Float(value) => *value != 0.0 && !value.is_nan(),
            PropValue::Str(value) => !value.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(value) => Some(*value),
            PropValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_html(&self) -> Option<&str> {
        match self {
            PropValue::Html(markup) => Some(markup),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&[Descriptor]> {
        match self {
            PropValue::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            PropValue::Any(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Identity comparison used to decide whether a property changed.
    pub fn same(&self, other: &PropValue) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Html(a), PropValue::Html(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => Rc::ptr_eq(a, b),
            (PropValue::Handler(a), PropValue::Handler(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (PropValue::Nodes(a), PropValue::Nodes(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (PropValue::Any(a), PropValue::Any(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }

    /// String form written into a host attribute, if the value has one.
    pub fn to_attribute_value(&self) -> Option<String> {
        match self {
            PropValue::Bool(value) => Some(value.to_string()),
            PropValue::Int(value) => Some(value.to_string()),
            PropValue::Float(value) => Some(format_number(*value)),
            PropValue::Str(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(value) => write!(f, "Bool({value})"),
            PropValue::Int(value) => write!(f, "Int({value})"),
            PropValue::Float(value) => write!(f, "Float({value})"),
            PropValue::Str(value) => write!(f, "Str({value:?})"),
            PropValue::Style(entries) => write!(f, "Style({entries:?})"),
            PropValue::Html(markup) => write!(f, "Html({markup:?})"),
            PropValue::Handler(_) => f.write_str("Handler(..)"),
            PropValue::Nodes(nodes) => write!(f, "Nodes(len={})", nodes.len()),
            PropValue::Any(_) => f.write_str("Any(..)"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

/// Insertion-ordered property map.
#[derive(Clone, Default)]
pub struct Props {
    entries: SmallVec<[(Rc<str>, PropValue); 4]>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(existing, _)| &**existing == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut PropValue> {
        self.entries
            .iter_mut()
            .find(|(existing, _)| &**existing == name)
            .map(|(_, value)| value)
    }

    /// Like [`Props::get`], with absent entries reading as [`PropValue::Null`].
    pub fn value(&self, name: &str) -> &PropValue {
        self.get(name).unwrap_or(NULL)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| &**existing == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Copies every entry of `other` over this map.
    pub fn extend(&mut self, other: &Props) {
        for (name, value) in other.entries.iter() {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Same names mapped to [`PropValue::same`] values, in any order.
    pub fn shallow_eq(&self, other: &Props) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name).is_some_and(|theirs| value.same(theirs)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).as_str()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.value(name).as_int()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).as_bool()
    }

    pub fn children(&self) -> &[Descriptor] {
        self.value("children").as_nodes().unwrap_or(&[])
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Values shared implicitly with every descendant of a component.
#[derive(Clone, Default)]
pub struct Context {
    values: Rc<Props>,
}

impl Context {
    pub fn new(values: Props) -> Self {
        Self {
            values: Rc::new(values),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of this context with `extra` layered on top.
    pub fn extended(&self, extra: &Props) -> Context {
        let mut values = (*self.values).clone();
        values.extend(extra);
        Context::new(values)
    }

    pub fn values(&self) -> &Props {
        &self.values
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&*self.values).finish()
    }
}

/// Style properties whose numeric values take no `px` suffix.
pub fn is_unitless_style(name: &str) -> bool {
    const FRAGMENTS: [&str; 12] = [
        "acit", "exs", "exg", "exn", "exp", "rph", "ows", "mnc", "ntw", "inec", "ineh", "zoo",
    ];
    let lower = name.to_ascii_lowercase();
    lower.starts_with("ord")
        || lower.ends_with("ex")
        || FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
}

/// Text written for one inline style entry. `None` clears the entry.
pub fn style_value(name: &str, value: &PropValue) -> Option<String> {
    match value {
        PropValue::Int(number) if is_unitless_style(name) => Some(number.to_string()),
        PropValue::Int(number) => Some(format!("{number}px")),
        PropValue::Float(number) if number.is_nan() => None,
        PropValue::Float(number) if is_unitless_style(name) => Some(format_number(*number)),
        PropValue::Float(number) => Some(format!("{}px", format_number(*number))),
        PropValue::Str(text) => Some(text.to_string()),
        PropValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
