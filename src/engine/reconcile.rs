//! Child reconciliation - diffing one fiber's children.
//!
//! Given a parent fiber and the new descriptor sequence for its children,
//! build the parent's child-fiber chain for this cycle and tag every fiber
//! with an effect. The old chain is rooted at `parent.alternate.child`.
//!
//! # Matching policy
//!
//! Default is positional: the new child at position *i* is compared against
//! the old fiber at position *i*, one old fiber consumed per new child
//! whether or not it matches. Keys are an opt-in extension: an old fiber
//! with a key is matched by key regardless of position, and a keyed match
//! that changed position is re-attached as a move. Mechanically this is one
//! algorithm - a key→fiber map plus a FIFO queue of unkeyed old fibers -
//! which degenerates to strict lockstep when no keys are present.
//!
//! Old fibers left unmatched at the end (shorter new sequence, changed kind,
//! vanished key) are tagged for deletion and detached during commit.

use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};
use tracing::trace;

use crate::element::Element;
use crate::fiber::{EffectFlags, Fiber, FiberId};

use super::RenderEngine;

impl RenderEngine {
    /// Produce the parent's child-fiber chain from the new descriptors.
    ///
    /// Diffing only: fibers are created and linked, effects are decided,
    /// but the output target is never touched here.
    pub(crate) fn reconcile_children(&mut self, parent: FiberId, children: Vec<Element>) {
        // Old chain, with the position each fiber held last cycle.
        let old_head = self.fibers[parent]
            .alternate
            .and_then(|alt| self.fibers.get(alt))
            .and_then(|alt| alt.child);

        let mut old_chain: SmallVec<[(FiberId, usize); 8]> = SmallVec::new();
        let mut cursor = old_head;
        while let Some(id) = cursor {
            old_chain.push((id, old_chain.len()));
            cursor = self.fibers[id].sibling;
        }

        let mut keyed: BTreeMap<String, (FiberId, usize)> = BTreeMap::new();
        let mut unkeyed: VecDeque<(FiberId, usize)> = VecDeque::new();
        for (id, index) in old_chain {
            match self.fibers[id].key.clone() {
                Some(key) => {
                    if let Some((duplicate, _)) = keyed.insert(key, (id, index)) {
                        // Duplicate keys: the later fiber wins the slot.
                        self.mark_deleted(duplicate);
                    }
                }
                None => unkeyed.push_back((id, index)),
            }
        }

        let mut prev_new: Option<FiberId> = None;
        for (index, desc) in children.into_iter().enumerate() {
            let candidate = match &desc.key {
                Some(key) => keyed.remove(key),
                None => unkeyed.pop_front(),
            };
            let Element {
                kind,
                props,
                key,
                children: desc_children,
            } = desc;

            let reusable = candidate
                .filter(|(old_id, _)| self.fibers[*old_id].kind.same_kind(&kind));

            let new_id = match (reusable, candidate) {
                (Some((old_id, old_index)), _) => {
                    // Same kind at this slot: reuse the output node, diff
                    // props at commit. A keyed fiber that changed position
                    // is additionally re-attached (append is a move).
                    let mut effect = EffectFlags::UPDATE;
                    if key.is_some() && old_index != index {
                        effect |= EffectFlags::PLACEMENT;
                    }
                    let mut fiber = Fiber::from_parts(kind, props, key);
                    fiber.handle = self.fibers[old_id].handle;
                    fiber.alternate = Some(old_id);
                    fiber.effect = effect;
                    fiber.pending_children = desc_children;
                    self.fibers.insert(fiber)
                }
                (None, consumed) => {
                    // No usable old fiber: fresh placement. A consumed but
                    // kind-mismatched old fiber is gone from the output.
                    if let Some((old_id, _)) = consumed {
                        self.mark_deleted(old_id);
                    }
                    let mut fiber = Fiber::from_parts(kind, props, key);
                    fiber.effect = EffectFlags::PLACEMENT;
                    fiber.pending_children = desc_children;
                    self.fibers.insert(fiber)
                }
            };

            self.fibers[new_id].parent = Some(parent);
            match prev_new {
                None => self.fibers[parent].child = Some(new_id),
                Some(prev) => self.fibers[prev].sibling = Some(new_id),
            }
            prev_new = Some(new_id);
        }

        // Leftover old fibers were not matched by anything this cycle.
        let leftovers: Vec<FiberId> = keyed
            .into_values()
            .map(|(id, _)| id)
            .chain(unkeyed.into_iter().map(|(id, _)| id))
            .collect();
        for id in leftovers {
            self.mark_deleted(id);
        }
    }

    /// Tag an old fiber for detachment and queue it for the commit pass.
    fn mark_deleted(&mut self, id: FiberId) {
        trace!(?id, "tagged for deletion");
        self.fibers[id].effect |= EffectFlags::DELETION;
        self.deletions.push(id);
    }
}

// =============================================================================
// Tests
// =============================================================================
