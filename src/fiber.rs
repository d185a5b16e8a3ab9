//! Fiber tree - the persistent, mutable mirror of the descriptor tree.
//!
//! One fiber exists per rendered node and survives across cycles through its
//! `alternate` link. Fibers live in an arena keyed by [`FiberId`]:
//! `parent`, `sibling`, and `alternate` are plain keys (relations, never
//! ownership), and `child` is the sole owning edge, so the doubly-linked
//! tree has no reference cycles.
//!
//! # Structure
//!
//! ```text
//!   parent ◄─┐
//!            │ child (owning)
//!            ▼
//!          fiber ──sibling──► fiber ──sibling──► ...
//!            │
//!            │ alternate (same position, previous committed tree)
//!            ▼
//!        old fiber
//! ```

use bitflags::bitflags;
use slotmap::SlotMap;
use std::ops::{Index, IndexMut};

use crate::element::{Element, ElementKind};
use crate::target::OutputHandle;
use crate::types::Props;

slotmap::new_key_type! {
    /// Arena key for a fiber. Keys are versioned, so a key held past its
    /// fiber's removal resolves to nothing rather than to a recycled slot.
    pub struct FiberId;
}

// =============================================================================
// Effect Flags
// =============================================================================

bitflags! {
    /// Per-fiber mutation decided during reconciliation, consumed at commit.
    ///
    /// Combine with bitwise OR: a keyed fiber that moved position carries
    /// `PLACEMENT | UPDATE` (re-attach as a move, then diff props).
    /// Empty flags mean the commit pass has nothing to do for this fiber.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectFlags: u8 {
        /// Attach this fiber's output handle under its nearest host ancestor.
        const PLACEMENT = 1 << 0;
        /// Diff this fiber's props against its alternate's props.
        const UPDATE = 1 << 1;
        /// Detach this (old) fiber's output from the target. Only ever set
        /// on fibers of the previous committed tree.
        const DELETION = 1 << 2;
    }
}

// =============================================================================
// Fiber
// =============================================================================

/// One node of the persistent tree.
///
/// `kind`, `props`, and `key` mirror the descriptor that produced the fiber.
/// `pending_children` holds the descriptor's children until this fiber is
/// processed as a unit of work, at which point they are taken and
/// reconciled.
#[derive(Debug)]
pub struct Fiber {
    /// Mirrored descriptor kind (text / host tag / component fn).
    pub kind: ElementKind,
    /// Mirrored property bag.
    pub props: Props,
    /// Mirrored reconciliation key.
    pub key: Option<String>,
    /// The output-target node this fiber exclusively owns, once created.
    /// Component fibers never own one.
    pub handle: Option<OutputHandle>,
    /// Enclosing fiber. Relation only; the tree is owned top-down via `child`.
    pub parent: Option<FiberId>,
    /// First child. The owning edge.
    pub child: Option<FiberId>,
    /// Next sibling under the same parent. Relation only.
    pub sibling: Option<FiberId>,
    /// Fiber at the same position in the previous committed tree, if any.
    /// Used only for diffing; cleared when the tree is promoted.
    pub alternate: Option<FiberId>,
    /// Mutation decided for this fiber this cycle.
    pub effect: EffectFlags,
    /// Descriptor children awaiting reconciliation.
    pub pending_children: Vec<Element>,
}

impl Fiber {
    /// Create a fiber from descriptor fields, unlinked and effect-free.
    pub fn from_parts(kind: ElementKind, props: Props, key: Option<String>) -> Self {
        Self {
            kind,
            props,
            key,
            handle: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect: EffectFlags::empty(),
            pending_children: Vec::new(),
        }
    }

    /// Whether this fiber can own an output handle (text and host elements).
    pub fn is_host(&self) -> bool {
        !matches!(self.kind, ElementKind::Component { .. })
    }
}

// =============================================================================
// Fiber Arena
// =============================================================================

/// Slot storage for all fibers of one engine.
///
/// Both the committed tree and the work-in-progress tree live here; the
/// previous tree is freed as a whole after each commit.
#[derive(Default)]
pub struct FiberArena {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fiber, returning its key.
    pub fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    /// Look up a fiber.
    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    /// Look up a fiber mutably.
    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    /// Number of live fibers.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Whether the arena holds no fibers.
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Whether `id` still resolves to a live fiber.
    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Remove a whole subtree from the arena, following child/sibling links.
    ///
    /// Siblings of `root` itself are not touched; only the subtree below it.
    pub fn free_subtree(&mut self, root: FiberId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fibers.remove(id) else {
                continue;
            };
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            // Siblings below the subtree root belong to it; the root's own
            // sibling link is the parent chain's business.
            if id != root {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
        }
    }

    /// Next fiber in pre-order depth-first traversal, bounded by `root`.
    ///
    /// Prefers `child`; otherwise climbs `parent` links returning the first
    /// sibling found on the way up. Returns `None` once the walk would leave
    /// the subtree under `root`.
    pub fn next_preorder(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == root {
                return None;
            }
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Collect a fiber's children in sibling order.
    pub fn children_of(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|f| f.child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.get(child).and_then(|f| f.sibling);
        }
        out
    }
}

impl Index<FiberId> for FiberArena {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberArena {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}

// =============================================================================
// Tests
// =============================================================================
