//! Element descriptors - the immutable input to every render cycle.
//!
//! An [`Element`] describes one node of the desired tree: a text node, a
//! host element (backed by an output-target node), or a component (a pure
//! function from props to a single child descriptor). Descriptors are built
//! fresh each cycle and never mutated; the engine diffs them against the
//! persistent fiber tree.
//!
//! # Example
//!
//! ```ignore
//! use wisp_ui::{element, text, props};
//!
//! let tree = element("div", props! { "class" => "app" }, vec![
//!     element("span", props! {}, vec![text("hello")]),
//!     // strings coerce to text descriptors
//!     "world".into(),
//! ]);
//! ```

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::types::{PropValue, Props, TEXT_VALUE};

// =============================================================================
// Component Functions
// =============================================================================

/// A component: a pure function from props to a single child descriptor.
///
/// Components must be side-effect-free from the engine's point of view and
/// must not touch the output target; the engine re-invokes them on every
/// render cycle.
pub type ComponentFn = Rc<dyn Fn(&Props) -> Element>;

// =============================================================================
// Element Kind
// =============================================================================

/// What an element descriptor describes.
#[derive(Clone)]
pub enum ElementKind {
    /// A text node. Its value lives under the `nodeValue` prop.
    Text,
    /// A host element backed by an output-target node of the given tag.
    Host {
        /// Output-target node category (`div`, `span`, ...).
        tag: String,
    },
    /// A component. The `identity` is the `TypeId` of the concrete function
    /// type, so two renders of the same component match during
    /// reconciliation even when the `Rc` wrapper is rebuilt each cycle.
    Component {
        /// The rendering function.
        render: ComponentFn,
        /// Type identity of the function, used for diff matching.
        identity: TypeId,
    },
}

impl ElementKind {
    /// Whether two kinds occupy the same slot in the diff.
    ///
    /// Host elements must agree on tag, components on function identity.
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text, Self::Text) => true,
            (Self::Host { tag: a }, Self::Host { tag: b }) => a == b,
            (
                Self::Component { identity: a, .. },
                Self::Component { identity: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Host { tag } => write!(f, "Host({tag})"),
            Self::Component { .. } => write!(f, "Component"),
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// An immutable tree descriptor, produced fresh every render cycle.
#[derive(Clone, Debug)]
pub struct Element {
    /// Text, host element, or component.
    pub kind: ElementKind,
    /// Property bag. Text descriptors carry their value as `nodeValue`.
    pub props: Props,
    /// Optional reconciliation key. Without a key, children are matched by
    /// position; with one, by key (opt-in, see the reconciler).
    pub key: Option<String>,
    /// Ordered child descriptors.
    pub children: Vec<Element>,
}

impl Element {
    /// Attach a reconciliation key to this descriptor.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Append a child descriptor.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }
}

/// Strings coerce to text descriptors, mirroring the classic
/// `createElement` convenience of passing raw strings as children.
impl From<&str> for Element {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        text(value)
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Create a text descriptor.
///
/// The value is stored under the `nodeValue` prop and reaches the target via
/// `set_property` after the text node is created.
pub fn text(value: impl Into<String>) -> Element {
    let mut props = Props::new();
    props.insert(TEXT_VALUE.to_string(), PropValue::Str(value.into()));
    Element {
        kind: ElementKind::Text,
        props,
        key: None,
        children: Vec::new(),
    }
}

/// Create a host element descriptor.
pub fn element(
    tag: impl Into<String>,
    props: Props,
    children: Vec<Element>,
) -> Element {
    Element {
        kind: ElementKind::Host { tag: tag.into() },
        props,
        key: None,
        children,
    }
}

/// Create a component descriptor.
///
/// `render` must be pure: same props in, same descriptor out, no side
/// effects. The concrete function type's `TypeId` becomes the component's
/// identity for diffing, so passing the same fn item or closure site on
/// every render reuses the previous fiber.
pub fn component<F>(render: F, props: Props) -> Element
where
    F: Fn(&Props) -> Element + 'static,
{
    Element {
        kind: ElementKind::Component {
            render: Rc::new(render),
            identity: TypeId::of::<F>(),
        },
        props,
        key: None,
        children: Vec::new(),
    }
}

// =============================================================================
// Props Macro
// =============================================================================

/// Build a [`Props`] map from `name => value` pairs.
///
/// Values go through `Into<PropValue>`, so string literals, integers, floats,
/// booleans, and [`EventCallback`](crate::types::EventCallback)s all work:
///
/// ```ignore
/// let p = props! {
///     "class" => "title",
///     "tabIndex" => 3i64,
/// };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::types::Props::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::types::Props::new();
        $(
            map.insert(
                ::std::string::String::from($name),
                $crate::types::PropValue::from($value),
            );
        )+
        map
    }};
}

// =============================================================================
// Tests
// =============================================================================
