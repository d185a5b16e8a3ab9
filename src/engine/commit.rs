//! Commit pass - applying an effect-tagged tree to the output target.
//!
//! Commit runs in one uninterrupted pass once no work remains: deletions
//! first, then a pre-order walk applying placements and prop diffs, then
//! promotion. Promotion (swapping `current_root` to the committed tree) is
//! the single point where the trees change places, so a commit is observed
//! as all-or-nothing by the next cycle.

use tracing::{debug, trace};

use crate::fiber::{EffectFlags, FiberId};
use crate::target::{OutputHandle, OutputTarget};
use crate::types::{event_name, EngineError, PropValue, Props};

use super::RenderEngine;

// =============================================================================
// Prop Diffing
// =============================================================================

/// Diff two prop bags and apply the difference to one output node.
///
/// 1. Names in `prev` but not `next` are removed (event names are
///    unsubscribed).
/// 2. Names in `next` whose value differs from `prev` are assigned - except
///    event-subscription names, which become an unsubscribe(old)/
///    subscribe(new) pair rather than a plain assignment.
///
/// Equal values produce no target calls at all, which is what makes an
/// identical re-render silent.
pub(crate) fn apply_props<T: OutputTarget>(
    target: &mut T,
    handle: OutputHandle,
    prev: &Props,
    next: &Props,
) {
    for (name, old) in prev {
        if next.contains_key(name) {
            continue;
        }
        match (event_name(name), old) {
            (Some(event), PropValue::Handler(handler)) => {
                target.unsubscribe(handle, &event, handler);
            }
            _ => target.remove_property(handle, name),
        }
    }

    for (name, new) in next {
        let old = prev.get(name);
        if old.is_some_and(|old| old == new) {
            continue;
        }
        match event_name(name) {
            Some(event) => {
                if let Some(PropValue::Handler(handler)) = old {
                    target.unsubscribe(handle, &event, handler);
                }
                match new {
                    PropValue::Handler(handler) => target.subscribe(handle, &event, handler),
                    // An on-named value that is not a handler is just a
                    // property that happens to look like one.
                    _ => target.set_property(handle, name, new),
                }
            }
            None => target.set_property(handle, name, new),
        }
    }
}

// =============================================================================
// Commit
// =============================================================================

impl RenderEngine {
    /// Apply the completed work-in-progress tree and promote it.
    pub(crate) fn commit<T: OutputTarget>(&mut self, target: &mut T) -> Result<(), EngineError> {
        let root = self.wip_root.take().ok_or(EngineError::NoWorkInProgress)?;
        debug!(deletions = self.deletions.len(), "committing");

        let deletions = std::mem::take(&mut self.deletions);
        for id in deletions {
            self.commit_deletion(target, id);
        }

        if let Some(child) = self.fibers[root].child {
            self.commit_work(target, child);
        }

        self.promote(root);
        Ok(())
    }

    /// Pre-order application of placement and update effects.
    ///
    /// The resolved mutation target for a fiber is its nearest ancestor
    /// that owns an output handle; component fibers own none and are
    /// skipped transparently in both directions.
    fn commit_work<T: OutputTarget>(&self, target: &mut T, id: FiberId) {
        let fiber = &self.fibers[id];

        if let Some(handle) = fiber.handle {
            if fiber.effect.contains(EffectFlags::PLACEMENT) {
                if let Some(parent_handle) = self.host_parent_handle(id) {
                    trace!(?id, "placement");
                    target.append_child(parent_handle, handle);
                }
            }
            if fiber.effect.contains(EffectFlags::UPDATE) {
                if let Some(alt) = fiber.alternate {
                    apply_props(target, handle, &self.fibers[alt].props, &fiber.props);
                }
            }
        }

        if let Some(child) = fiber.child {
            self.commit_work(target, child);
        }
        if let Some(sibling) = fiber.sibling {
            self.commit_work(target, sibling);
        }
    }

    /// Detach one deleted subtree from the output.
    ///
    /// Walks down past handle-less fibers (components) and removes the
    /// topmost handle-owning nodes; everything below them leaves with them.
    fn commit_deletion<T: OutputTarget>(&self, target: &mut T, id: FiberId) {
        let Some(parent_handle) = self.host_parent_handle(id) else {
            return;
        };
        trace!(?id, "deletion");
        self.detach_outputs(target, id, parent_handle);
    }

    fn detach_outputs<T: OutputTarget>(
        &self,
        target: &mut T,
        id: FiberId,
        parent_handle: OutputHandle,
    ) {
        let fiber = &self.fibers[id];
        if let Some(handle) = fiber.handle {
            target.remove_child(parent_handle, handle);
            return;
        }
        let mut cursor = fiber.child;
        while let Some(child) = cursor {
            self.detach_outputs(target, child, parent_handle);
            cursor = self.fibers[child].sibling;
        }
    }

    /// Nearest ancestor output handle (skipping component fibers).
    fn host_parent_handle(&self, id: FiberId) -> Option<OutputHandle> {
        let mut cursor = self.fibers[id].parent;
        while let Some(parent) = cursor {
            let fiber = &self.fibers[parent];
            if let Some(handle) = fiber.handle {
                return Some(handle);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Swap the committed tree in and free the previous one.
    fn promote(&mut self, root: FiberId) {
        // Alternates point into the outgoing tree and effects are consumed;
        // clear both before that tree is freed.
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let fiber = &mut self.fibers[id];
            fiber.alternate = None;
            fiber.effect = EffectFlags::empty();
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            if id != root {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
        }

        if let Some(old) = self.current_root.replace(root) {
            self.fibers.free_subtree(old);
        }
        debug!(fibers = self.fibers.len(), "commit complete");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{RecordingTarget, TargetOp};
    use crate::types::EventCallback;
    use std::rc::Rc;

    fn props_of(pairs: &[(&str, PropValue)]) -> Props {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_apply_props_sets_changed_and_new() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let prev = props_of(&[("class", PropValue::from("old"))]);
        let next = props_of(&[
            ("class", PropValue::from("new")),
            ("id", PropValue::from("x")),
        ]);

        apply_props(&mut target, handle, &prev, &next);
        assert_eq!(
            target.count(|op| matches!(op, TargetOp::SetProperty { .. })),
            2
        );
    }

    #[test]
    fn test_apply_props_removes_missing() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let prev = props_of(&[("class", PropValue::from("x"))]);
        let next = Props::new();

        apply_props(&mut target, handle, &prev, &next);
        assert_eq!(
            target.ops,
            vec![TargetOp::RemoveProperty {
                handle,
                name: "class".to_string(),
            }]
        );
    }

    #[test]
    fn test_apply_props_equal_values_are_silent() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let props = props_of(&[("class", PropValue::from("same"))]);

        apply_props(&mut target, handle, &props, &props.clone());
        assert!(target.ops.is_empty());
    }

    #[test]
    fn test_event_handler_swap_is_unsubscribe_subscribe_pair() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let f: EventCallback = Rc::new(|_| {});
        let g: EventCallback = Rc::new(|_| {});
        let prev = props_of(&[("onClick", PropValue::Handler(f.clone()))]);
        let next = props_of(&[("onClick", PropValue::Handler(g.clone()))]);

        apply_props(&mut target, handle, &prev, &next);
        assert_eq!(
            target.ops,
            vec![
                TargetOp::Unsubscribe {
                    handle,
                    event: "click".to_string(),
                    handler: crate::target::recording::handler_addr(&f),
                },
                TargetOp::Subscribe {
                    handle,
                    event: "click".to_string(),
                    handler: crate::target::recording::handler_addr(&g),
                },
            ]
        );
    }

    #[test]
    fn test_same_handler_is_silent() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let f: EventCallback = Rc::new(|_| {});
        let props = props_of(&[("onClick", PropValue::Handler(f.clone()))]);

        apply_props(&mut target, handle, &props, &props.clone());
        assert!(target.ops.is_empty());
    }

    #[test]
    fn test_removed_event_prop_unsubscribes() {
        let mut target = RecordingTarget::new();
        let handle = target.create_root();
        let f: EventCallback = Rc::new(|_| {});
        let prev = props_of(&[("onClick", PropValue::Handler(f))]);

        apply_props(&mut target, handle, &prev, &Props::new());
        assert_eq!(
            target.count(|op| matches!(op, TargetOp::Unsubscribe { .. })),
            1
        );
        assert_eq!(
            target.count(|op| matches!(op, TargetOp::RemoveProperty { .. })),
            0
        );
    }
}
