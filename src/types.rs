//! Core types for wisp-ui.
//!
//! These types define the foundation that everything builds on.
//! They flow between the descriptor builder, the fiber tree, and the
//! output target, and define what a target has to understand.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

// =============================================================================
// Node Kind
// =============================================================================

/// The category of node a target is asked to allocate.
///
/// Component descriptors never reach the target: they are unwrapped by the
/// reconciler, so a target only ever sees text and element nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A text node. The tag is ignored; the textual value arrives as the
    /// `nodeValue` property.
    Text,
    /// A regular element node, categorized by its tag.
    Element,
}

/// Property name under which a text node's value is stored.
pub const TEXT_VALUE: &str = "nodeValue";

// =============================================================================
// Events
// =============================================================================

/// Event payload delivered by a target to subscribed handlers.
///
/// The engine never invokes handlers itself; it only forwards them to the
/// target as subscriptions. What an event carries beyond its name is the
/// target's business, so the payload is a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    /// Lowercased event name, e.g. `click`.
    pub name: String,
    /// Target-defined detail (input value, coordinates, ...). May be empty.
    pub detail: String,
}

impl Event {
    /// Create an event with no detail.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: String::new(),
        }
    }

    /// Create an event carrying a detail string.
    pub fn with_detail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Event handler callback (Rc for shared ownership in closures).
///
/// Using `Rc<dyn Fn>` instead of `Box<dyn Fn>` lets the same handler be
/// cloned into the descriptor tree on every render. Handler equality during
/// prop diffing is pointer equality, so a re-used `Rc` compares equal and a
/// freshly wrapped closure does not.
pub type EventCallback = Rc<dyn Fn(&Event)>;

/// Extract the event name from a subscription-style property name.
///
/// Property names of the form `on<EventName>` (e.g. `onClick`) denote event
/// subscriptions. The name after the prefix must start with an ASCII
/// uppercase letter, so ordinary properties like `online` are not mistaken
/// for subscriptions. The returned name is lowercased: `onClick` → `click`.
pub fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix("on")?;
    let first = rest.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(rest.to_lowercase())
}

// =============================================================================
// Property Values
// =============================================================================

/// A property value in a descriptor's prop bag.
#[derive(Clone)]
pub enum PropValue {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Event handler. Only meaningful under an `on<EventName>` property.
    Handler(EventCallback),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            // Handlers compare by identity: the same Rc is the same handler.
            (Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Handler(h) => write!(f, "<handler {:p}>", Rc::as_ptr(h)),
        }
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<EventCallback> for PropValue {
    fn from(v: EventCallback) -> Self {
        Self::Handler(v)
    }
}

/// Property bag: attribute name → value.
///
/// A sorted map, so prop diffing walks names in a stable order and the
/// sequence of target calls produced by a commit is deterministic. Semantic
/// meaning does not depend on order.
pub type Props = BTreeMap<String, PropValue>;

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by the engine.
///
/// Malformed descriptors are caught where the engine would otherwise hand
/// the target something meaningless, instead of propagating as undefined
/// behavior at commit time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A host element reached materialization with an empty tag.
    #[error("element descriptor has an empty tag")]
    EmptyTag,

    /// A commit was requested while no work-in-progress tree exists.
    #[error("commit requested with no work-in-progress tree")]
    NoWorkInProgress,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_matches_subscription_pattern() {
        assert_eq!(event_name("onClick"), Some("click".to_string()));
        assert_eq!(event_name("onMouseMove"), Some("mousemove".to_string()));
    }

    #[test]
    fn test_event_name_rejects_plain_properties() {
        assert_eq!(event_name("online"), None);
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("class"), None);
    }

    #[test]
    fn test_prop_value_equality() {
        assert_eq!(PropValue::from("a"), PropValue::from("a"));
        assert_ne!(PropValue::from("a"), PropValue::from("b"));
        assert_ne!(PropValue::from(1i64), PropValue::from("1"));
        assert_eq!(PropValue::from(true), PropValue::from(true));
    }

    #[test]
    fn test_handler_equality_is_identity() {
        let f: EventCallback = Rc::new(|_| {});
        let g: EventCallback = Rc::new(|_| {});

        assert_eq!(
            PropValue::Handler(f.clone()),
            PropValue::Handler(f.clone())
        );
        assert_ne!(PropValue::Handler(f), PropValue::Handler(g));
    }
}
