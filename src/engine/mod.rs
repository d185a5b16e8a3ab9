//! Render engine - scheduling and the unit-of-work loop.
//!
//! A [`RenderEngine`] owns everything one render pipeline needs: the fiber
//! arena, the committed tree, the work-in-progress tree, and the scheduling
//! cursor. Engines are plain values; several can coexist and each is driven
//! independently by its host.
//!
//! # Render cycle
//!
//! ```text
//! mount(element, container)          establish work-in-progress root
//!         │
//!         ▼
//! drive_one_slice(target, budget)  ──► Yielded (budget exhausted, call again)
//!         │  one fiber per unit:
//!         │  materialize handle → reconcile children → advance pre-order
//!         ▼
//! commit (automatic when no work remains)  ──► Committed
//! ```
//!
//! A unit of work is never interrupted mid-way; the only suspension point is
//! between units. Unit order is a fixed pre-order DFS of the descriptor
//! tree, so the result of a full pass does not depend on how the work was
//! sliced.

pub mod budget;
mod commit;
mod reconcile;
pub mod sync;

pub use budget::{SliceOutcome, TimeSlice, Unbounded, UnitQuota, WorkBudget};
pub use sync::render_sync;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::element::{Element, ElementKind};
use crate::fiber::{EffectFlags, Fiber, FiberArena, FiberId};
use crate::target::{OutputHandle, OutputTarget};
use crate::types::{EngineError, NodeKind, Props};

// =============================================================================
// Render Engine
// =============================================================================

/// The incremental reconciliation engine.
///
/// Holds the committed tree (`current_root`, mirrored in the output target),
/// at most one work-in-progress tree, and the cursor of the next unit of
/// work. All output-target interaction happens inside
/// [`drive_one_slice`](Self::drive_one_slice) / [`flush`](Self::flush).
#[derive(Default)]
pub struct RenderEngine {
    pub(crate) fibers: FiberArena,
    /// Tree currently reflected in the output target.
    current_root: Option<FiberId>,
    /// Tree being built this cycle; promoted only by a successful commit.
    wip_root: Option<FiberId>,
    /// Next fiber to process, pre-order.
    next_unit: Option<FiberId>,
    /// Old fibers tagged for detachment this cycle.
    pub(crate) deletions: SmallVec<[FiberId; 8]>,
    /// Handles materialized by a cancelled cycle, awaiting disposal.
    orphaned: Vec<OutputHandle>,
}

impl RenderEngine {
    /// Create an engine with no trees.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a render: build a work-in-progress root wrapping `element`
    /// as the sole child of a synthetic fiber bound to `container`, and arm
    /// the work cursor.
    ///
    /// This is the public entry point (`mountRoot` in output-target terms).
    /// If a previous cycle is still in flight it is cancelled: its fibers
    /// are freed and any output nodes it materialized are handed back to
    /// the target on the next drive. The committed tree is untouched.
    pub fn mount(&mut self, element: Element, container: OutputHandle) {
        if let Some(abandoned) = self.wip_root.take() {
            self.cancel_in_flight(abandoned);
        }

        let mut root = Fiber::from_parts(
            ElementKind::Host {
                tag: "#root".to_string(),
            },
            Props::new(),
            None,
        );
        root.handle = Some(container);
        root.alternate = self.current_root;
        root.pending_children = vec![element];

        let root_id = self.fibers.insert(root);
        self.wip_root = Some(root_id);
        self.next_unit = Some(root_id);
        debug!(?container, "render scheduled");
    }

    /// Perform units of work while the budget allows, committing when none
    /// remain.
    ///
    /// Driving an idle engine is a no-op ([`SliceOutcome::Idle`]), not an
    /// error. On error the work-in-progress tree stays put; the host may
    /// mount a fresh tree to recover.
    pub fn drive_one_slice<T: OutputTarget, B: WorkBudget>(
        &mut self,
        target: &mut T,
        budget: &mut B,
    ) -> Result<SliceOutcome, EngineError> {
        self.flush_orphans(target);

        if self.wip_root.is_none() {
            return Ok(SliceOutcome::Idle);
        }

        while let Some(unit) = self.next_unit {
            if !budget.has_remaining() {
                trace!("budget exhausted, yielding");
                return Ok(SliceOutcome::Yielded);
            }
            self.next_unit = self.perform_unit(target, unit)?;
        }

        self.commit(target)?;
        Ok(SliceOutcome::Committed)
    }

    /// Complete all outstanding work and commit, without yielding.
    ///
    /// Errors with [`EngineError::NoWorkInProgress`] when nothing is
    /// outstanding.
    pub fn flush<T: OutputTarget>(&mut self, target: &mut T) -> Result<(), EngineError> {
        if self.wip_root.is_none() {
            return Err(EngineError::NoWorkInProgress);
        }
        let outcome = self.drive_one_slice(target, &mut Unbounded)?;
        debug_assert_eq!(outcome, SliceOutcome::Committed);
        Ok(())
    }

    /// Mount and render to completion in one call.
    pub fn render_blocking<T: OutputTarget>(
        &mut self,
        target: &mut T,
        element: Element,
        container: OutputHandle,
    ) -> Result<(), EngineError> {
        self.mount(element, container);
        self.flush(target)
    }

    /// Whether no work is outstanding.
    pub fn is_idle(&self) -> bool {
        self.wip_root.is_none()
    }

    /// Root of the committed tree, if a cycle has completed.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Number of live fibers across both trees. After a commit this is
    /// exactly the committed tree's size; useful for leak assertions.
    pub fn fiber_count(&self) -> usize {
        self.fibers.len()
    }

    // =========================================================================
    // Unit of Work
    // =========================================================================

    /// Process exactly one fiber and return the next one in pre-order.
    ///
    /// Host fibers materialize their output handle on first visit (created
    /// detached, configured with their initial props). Component fibers are
    /// invoked with their props and yield a single child descriptor.
    fn perform_unit<T: OutputTarget>(
        &mut self,
        target: &mut T,
        id: FiberId,
    ) -> Result<Option<FiberId>, EngineError> {
        trace!(?id, "unit of work");

        let children = match &self.fibers[id].kind {
            ElementKind::Component { render, .. } => {
                let render = render.clone();
                let props = self.fibers[id].props.clone();
                vec![render(&props)]
            }
            _ => {
                if self.fibers[id].handle.is_none() {
                    self.materialize(target, id)?;
                }
                std::mem::take(&mut self.fibers[id].pending_children)
            }
        };

        self.reconcile_children(id, children);

        let root = self.wip_root.unwrap_or(id);
        Ok(self.fibers.next_preorder(id, root))
    }

    /// Create and configure this fiber's output node, still detached.
    fn materialize<T: OutputTarget>(
        &mut self,
        target: &mut T,
        id: FiberId,
    ) -> Result<(), EngineError> {
        let (kind, tag) = match &self.fibers[id].kind {
            ElementKind::Text => (NodeKind::Text, String::new()),
            ElementKind::Host { tag } => {
                if tag.is_empty() {
                    return Err(EngineError::EmptyTag);
                }
                (NodeKind::Element, tag.clone())
            }
            // Components never own output handles.
            ElementKind::Component { .. } => return Ok(()),
        };

        let handle = target.create_node(kind, &tag);
        commit::apply_props(target, handle, &Props::new(), &self.fibers[id].props);
        self.fibers[id].handle = Some(handle);
        trace!(?id, ?handle, "materialized");
        Ok(())
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Abandon a half-built work-in-progress tree.
    ///
    /// Handles materialized by the abandoned pass were never attached, so
    /// they are queued for `discard_node` rather than `remove_child`.
    /// Handles on reused fibers belong to the committed tree and stay.
    fn cancel_in_flight(&mut self, abandoned: FiberId) {
        let mut stack = vec![abandoned];
        while let Some(id) = stack.pop() {
            let fiber = &self.fibers[id];
            // Fresh fibers (no alternate) own any handle they carry. The
            // synthetic root carries the container, which is the host's.
            if id != abandoned && fiber.alternate.is_none() {
                if let Some(handle) = fiber.handle {
                    self.orphaned.push(handle);
                }
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            if id != abandoned {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
        }

        self.fibers.free_subtree(abandoned);
        self.next_unit = None;

        // Deletion tags were decided against the abandoned tree; undo them.
        for id in std::mem::take(&mut self.deletions) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.effect = EffectFlags::empty();
            }
        }

        debug!(orphans = self.orphaned.len(), "in-flight render cancelled");
    }

    fn flush_orphans<T: OutputTarget>(&mut self, target: &mut T) {
        for handle in self.orphaned.drain(..) {
            target.discard_node(handle);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{element, text};
    use crate::props;
    use crate::target::{RecordingTarget, TargetOp};

    #[test]
    fn test_drive_idle_engine_is_noop() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let outcome = engine.drive_one_slice(&mut target, &mut Unbounded);
        assert_eq!(outcome, Ok(SliceOutcome::Idle));
        assert!(target.ops.is_empty());
    }

    #[test]
    fn test_flush_without_work_errors() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        assert_eq!(
            engine.flush(&mut target),
            Err(EngineError::NoWorkInProgress)
        );
    }

    #[test]
    fn test_single_cycle_commits() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        engine.mount(element("div", props! {}, vec![text("hi")]), container);
        assert!(!engine.is_idle());

        let outcome = engine.drive_one_slice(&mut target, &mut Unbounded);
        assert_eq!(outcome, Ok(SliceOutcome::Committed));
        assert!(engine.is_idle());
        assert!(engine.current_root().is_some());

        // div and its text were created and attached.
        assert_eq!(
            target.created_tags(),
            vec!["div".to_string(), String::new()]
        );
        assert_eq!(target.appends().len(), 2);
    }

    #[test]
    fn test_yield_and_resume() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        engine.mount(
            element("div", props! {}, vec![text("a"), text("b")]),
            container,
        );

        // One unit per slice: root, div, text a, text b, then commit.
        let mut committed = 0;
        for _ in 0..16 {
            match engine
                .drive_one_slice(&mut target, &mut UnitQuota::new(1))
                .unwrap()
            {
                SliceOutcome::Committed => {
                    committed += 1;
                    break;
                }
                SliceOutcome::Yielded => continue,
                SliceOutcome::Idle => panic!("went idle without committing"),
            }
        }
        assert_eq!(committed, 1);
        assert_eq!(target.appends().len(), 3);
    }

    #[test]
    fn test_empty_tag_is_an_error() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        engine.mount(element("", props! {}, vec![]), container);
        let result = engine.drive_one_slice(&mut target, &mut Unbounded);
        assert_eq!(result, Err(EngineError::EmptyTag));
    }

    #[test]
    fn test_remount_cancels_and_discards_orphans() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        engine.mount(element("div", props! {}, vec![text("a")]), container);
        // Process root + div: div's node gets materialized but never attached.
        let _ = engine
            .drive_one_slice(&mut target, &mut UnitQuota::new(2))
            .unwrap();
        assert_eq!(target.created_tags(), vec!["div".to_string()]);

        // Mid-cycle remount abandons the first pass.
        engine.mount(element("span", props! {}, vec![]), container);
        let outcome = engine.drive_one_slice(&mut target, &mut Unbounded);
        assert_eq!(outcome, Ok(SliceOutcome::Committed));

        // The abandoned div node was discarded; only the span is attached.
        assert_eq!(engine.fiber_count(), 2); // root + span
        assert_eq!(
            target.count(|op| matches!(op, TargetOp::DiscardNode { .. })),
            1
        );
        assert_eq!(target.appends().len(), 1);
    }

    #[test]
    fn test_second_cycle_frees_previous_tree() {
        let mut engine = RenderEngine::new();
        let mut target = RecordingTarget::new();
        let container = target.create_root();

        engine
            .render_blocking(
                &mut target,
                element("div", props! {}, vec![text("a")]),
                container,
            )
            .unwrap();
        let after_first = engine.fiber_count();

        engine
            .render_blocking(
                &mut target,
                element("div", props! {}, vec![text("b")]),
                container,
            )
            .unwrap();
        // Old tree freed on promotion: fiber count stays flat.
        assert_eq!(engine.fiber_count(), after_first);
    }
}
