//! In-memory output target.
//!
//! A concrete target that keeps the whole output tree in a map: nodes with
//! props, ordered children, and live event subscriptions. Useful for tests,
//! demos, and as the reference for what a real display-engine target has to
//! implement.
//!
//! # Example
//!
//! ```ignore
//! use wisp_ui::{element, text, props, MemoryTree, RenderEngine};
//!
//! let mut tree = MemoryTree::new();
//! let root = tree.create_root();
//! let mut engine = RenderEngine::new();
//! engine.render_blocking(&mut tree, element("div", props! {}, vec![text("hi")]), root)?;
//! println!("{}", tree.dump(root));
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::types::{Event, EventCallback, NodeKind, PropValue, Props};

use super::{OutputHandle, OutputTarget};

// =============================================================================
// Nodes
// =============================================================================

/// One node of the in-memory tree.
#[derive(Default)]
struct MemNode {
    kind: Option<NodeKind>,
    tag: String,
    props: Props,
    listeners: BTreeMap<String, Vec<EventCallback>>,
    children: Vec<OutputHandle>,
    parent: Option<OutputHandle>,
}

// =============================================================================
// Memory Tree
// =============================================================================

/// In-memory output tree.
#[derive(Default)]
pub struct MemoryTree {
    nodes: BTreeMap<u64, MemNode>,
    next_handle: u64,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a container node to mount into. Containers have no kind and
    /// never appear as anyone's child.
    pub fn create_root(&mut self) -> OutputHandle {
        self.alloc(None, String::new())
    }

    fn alloc(&mut self, kind: Option<NodeKind>, tag: String) -> OutputHandle {
        let handle = OutputHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(
            handle.0,
            MemNode {
                kind,
                tag,
                ..MemNode::default()
            },
        );
        handle
    }

    /// Number of live nodes (containers included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ordered children of a node.
    pub fn children(&self, handle: OutputHandle) -> Vec<OutputHandle> {
        self.nodes
            .get(&handle.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// A node's tag (empty for text nodes and containers).
    pub fn tag(&self, handle: OutputHandle) -> Option<&str> {
        self.nodes.get(&handle.0).map(|n| n.tag.as_str())
    }

    /// Look up a property value.
    pub fn prop(&self, handle: OutputHandle, name: &str) -> Option<&PropValue> {
        self.nodes.get(&handle.0)?.props.get(name)
    }

    /// Number of live subscriptions for an event on a node.
    pub fn listener_count(&self, handle: OutputHandle, event: &str) -> usize {
        self.nodes
            .get(&handle.0)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Fire an event at a node, invoking every subscribed handler in
    /// subscription order.
    pub fn dispatch(&self, handle: OutputHandle, event: &Event) {
        let Some(node) = self.nodes.get(&handle.0) else {
            return;
        };
        if let Some(handlers) = node.listeners.get(&event.name) {
            for handler in handlers {
                handler(event);
            }
        }
    }

    /// Render the subtree under `handle` as an indented debug string.
    ///
    /// Text nodes print as their value, elements as `tag {props}`.
    pub fn dump(&self, handle: OutputHandle) -> String {
        let mut out = String::new();
        self.dump_into(handle, 0, &mut out);
        out
    }

    fn dump_into(&self, handle: OutputHandle, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&handle.0) else {
            return;
        };
        for _ in 0..depth {
            out.push_str("  ");
        }
        match node.kind {
            Some(NodeKind::Text) => {
                let value = match node.props.get(crate::types::TEXT_VALUE) {
                    Some(PropValue::Str(s)) => s.as_str(),
                    _ => "",
                };
                let _ = writeln!(out, "{value:?}");
            }
            Some(NodeKind::Element) => {
                let _ = write!(out, "{}", node.tag);
                let attrs: Vec<String> = node
                    .props
                    .iter()
                    .map(|(k, v)| format!("{k}={v:?}"))
                    .collect();
                if attrs.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, " [{}]", attrs.join(" "));
                }
            }
            None => {
                let _ = writeln!(out, "#root");
            }
        }
        for child in &node.children {
            self.dump_into(*child, depth + 1, out);
        }
    }

    fn detach(&mut self, child: OutputHandle) {
        let parent = self.nodes.get(&child.0).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent.0) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.nodes.get_mut(&child.0) {
            node.parent = None;
        }
    }
}

impl OutputTarget for MemoryTree {
    fn create_node(&mut self, kind: NodeKind, tag: &str) -> OutputHandle {
        self.alloc(Some(kind), tag.to_string())
    }

    fn set_property(&mut self, handle: OutputHandle, name: &str, value: &PropValue) {
        if let Some(node) = self.nodes.get_mut(&handle.0) {
            node.props.insert(name.to_string(), value.clone());
        }
    }

    fn remove_property(&mut self, handle: OutputHandle, name: &str) {
        if let Some(node) = self.nodes.get_mut(&handle.0) {
            node.props.remove(name);
        }
    }

    fn append_child(&mut self, parent: OutputHandle, child: OutputHandle) {
        // Append of an attached node is a move.
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&parent.0) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child.0) {
            node.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: OutputHandle, child: OutputHandle) {
        if let Some(node) = self.nodes.get_mut(&parent.0) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child.0) {
            node.parent = None;
        }
        // The detached subtree itself is dropped; nothing references it.
        self.drop_subtree(child);
    }

    fn subscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback) {
        if let Some(node) = self.nodes.get_mut(&handle.0) {
            node.listeners
                .entry(event.to_string())
                .or_default()
                .push(handler.clone());
        }
    }

    fn unsubscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback) {
        if let Some(node) = self.nodes.get_mut(&handle.0) {
            if let Some(handlers) = node.listeners.get_mut(event) {
                handlers.retain(|h| !std::rc::Rc::ptr_eq(h, handler));
            }
        }
    }

    fn discard_node(&mut self, handle: OutputHandle) {
        self.drop_subtree(handle);
    }
}

impl MemoryTree {
    fn drop_subtree(&mut self, handle: OutputHandle) {
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.remove(&h.0) {
                stack.extend(node.children);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_append_and_children_order() {
        let mut tree = MemoryTree::new();
        let root = tree.create_root();
        let a = tree.create_node(NodeKind::Element, "a");
        let b = tree.create_node(NodeKind::Element, "b");
        tree.append_child(root, a);
        tree.append_child(root, b);
        assert_eq!(tree.children(root), vec![a, b]);
    }

    #[test]
    fn test_append_of_attached_node_moves_it() {
        let mut tree = MemoryTree::new();
        let root = tree.create_root();
        let a = tree.create_node(NodeKind::Element, "a");
        let b = tree.create_node(NodeKind::Element, "b");
        tree.append_child(root, a);
        tree.append_child(root, b);

        // Re-append a: moves to the end, no duplicate.
        tree.append_child(root, a);
        assert_eq!(tree.children(root), vec![b, a]);
    }

    #[test]
    fn test_remove_child_drops_subtree() {
        let mut tree = MemoryTree::new();
        let root = tree.create_root();
        let div = tree.create_node(NodeKind::Element, "div");
        let txt = tree.create_node(NodeKind::Text, "");
        tree.append_child(root, div);
        tree.append_child(div, txt);

        tree.remove_child(root, div);
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.node_count(), 1); // just the container
    }

    #[test]
    fn test_dispatch_invokes_subscribed_handlers() {
        let mut tree = MemoryTree::new();
        let node = tree.create_node(NodeKind::Element, "button");

        let hits = Rc::new(Cell::new(0));
        let hits2 = hits.clone();
        let handler: EventCallback = Rc::new(move |_| hits2.set(hits2.get() + 1));

        tree.subscribe(node, "click", &handler);
        tree.dispatch(node, &Event::new("click"));
        assert_eq!(hits.get(), 1);

        tree.unsubscribe(node, "click", &handler);
        tree.dispatch(node, &Event::new("click"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_dump_shape() {
        let mut tree = MemoryTree::new();
        let root = tree.create_root();
        let div = tree.create_node(NodeKind::Element, "div");
        tree.set_property(div, "class", &PropValue::from("app"));
        let txt = tree.create_node(NodeKind::Text, "");
        tree.set_property(txt, crate::types::TEXT_VALUE, &PropValue::from("hi"));
        tree.append_child(root, div);
        tree.append_child(div, txt);

        let dump = tree.dump(root);
        assert!(dump.contains("div [class=\"app\"]"));
        assert!(dump.contains("\"hi\""));
    }
}
