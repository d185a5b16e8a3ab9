//! Call-recording output target.
//!
//! Records every target call as a [`TargetOp`] value, in order. This is how
//! the engine's observable behavior is asserted in tests: determinism across
//! budget slicings, append order, event subscribe/unsubscribe pairing.
//! Handlers are recorded by pointer identity, since that is also how the
//! engine compares them.

use std::rc::Rc;

use crate::types::{EventCallback, NodeKind, PropValue};

use super::{OutputHandle, OutputTarget};

// =============================================================================
// Recorded Operations
// =============================================================================

/// One recorded target call.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetOp {
    /// `create_node` returned `handle`.
    CreateNode {
        handle: OutputHandle,
        kind: NodeKind,
        tag: String,
    },
    /// `set_property` (value recorded as its debug form; handlers never
    /// arrive here).
    SetProperty {
        handle: OutputHandle,
        name: String,
        value: String,
    },
    /// `remove_property`.
    RemoveProperty { handle: OutputHandle, name: String },
    /// `append_child`.
    AppendChild {
        parent: OutputHandle,
        child: OutputHandle,
    },
    /// `remove_child`.
    RemoveChild {
        parent: OutputHandle,
        child: OutputHandle,
    },
    /// `subscribe`, handler recorded by address.
    Subscribe {
        handle: OutputHandle,
        event: String,
        handler: usize,
    },
    /// `unsubscribe`, handler recorded by address.
    Unsubscribe {
        handle: OutputHandle,
        event: String,
        handler: usize,
    },
    /// `discard_node`.
    DiscardNode { handle: OutputHandle },
}

/// Address of a handler, for identity assertions in tests.
pub fn handler_addr(handler: &EventCallback) -> usize {
    Rc::as_ptr(handler) as *const () as usize
}

// =============================================================================
// Recording Target
// =============================================================================

/// Output target that mints sequential handles and records every call.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    /// All recorded calls, in call order.
    pub ops: Vec<TargetOp>,
    next_handle: u64,
}

impl RecordingTarget {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a container handle without recording anything, to mount into.
    pub fn create_root(&mut self) -> OutputHandle {
        let handle = OutputHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Forget everything recorded so far (handles keep counting up).
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// The `append_child` calls, in order.
    pub fn appends(&self) -> Vec<(OutputHandle, OutputHandle)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TargetOp::AppendChild { parent, child } => Some((*parent, *child)),
                _ => None,
            })
            .collect()
    }

    /// The tags passed to `create_node`, in order (text nodes record `""`).
    pub fn created_tags(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TargetOp::CreateNode { tag, .. } => Some(tag.clone()),
                _ => None,
            })
            .collect()
    }

    /// Count recorded ops matching a predicate.
    pub fn count(&self, pred: impl Fn(&TargetOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl OutputTarget for RecordingTarget {
    fn create_node(&mut self, kind: NodeKind, tag: &str) -> OutputHandle {
        let handle = OutputHandle(self.next_handle);
        self.next_handle += 1;
        self.ops.push(TargetOp::CreateNode {
            handle,
            kind,
            tag: tag.to_string(),
        });
        handle
    }

    fn set_property(&mut self, handle: OutputHandle, name: &str, value: &PropValue) {
        self.ops.push(TargetOp::SetProperty {
            handle,
            name: name.to_string(),
            value: format!("{value:?}"),
        });
    }

    fn remove_property(&mut self, handle: OutputHandle, name: &str) {
        self.ops.push(TargetOp::RemoveProperty {
            handle,
            name: name.to_string(),
        });
    }

    fn append_child(&mut self, parent: OutputHandle, child: OutputHandle) {
        self.ops.push(TargetOp::AppendChild { parent, child });
    }

    fn remove_child(&mut self, parent: OutputHandle, child: OutputHandle) {
        self.ops.push(TargetOp::RemoveChild { parent, child });
    }

    fn subscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback) {
        self.ops.push(TargetOp::Subscribe {
            handle,
            event: event.to_string(),
            handler: handler_addr(handler),
        });
    }

    fn unsubscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback) {
        self.ops.push(TargetOp::Unsubscribe {
            handle,
            event: event.to_string(),
            handler: handler_addr(handler),
        });
    }

    fn discard_node(&mut self, handle: OutputHandle) {
        self.ops.push(TargetOp::DiscardNode { handle });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_call_order() {
        let mut target = RecordingTarget::new();
        let root = target.create_root();
        let node = target.create_node(NodeKind::Element, "div");
        target.append_child(root, node);

        assert_eq!(
            target.ops,
            vec![
                TargetOp::CreateNode {
                    handle: node,
                    kind: NodeKind::Element,
                    tag: "div".to_string(),
                },
                TargetOp::AppendChild {
                    parent: root,
                    child: node,
                },
            ]
        );
        assert_eq!(target.appends(), vec![(root, node)]);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut target = RecordingTarget::new();
        let a = target.create_node(NodeKind::Element, "a");
        let b = target.create_node(NodeKind::Element, "b");
        assert_ne!(a, b);
    }
}
