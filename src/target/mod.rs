//! Output target - the engine's only external boundary.
//!
//! The engine computes mutations; a target applies them to some real output
//! tree (a display engine, a test recorder, an in-memory mirror). Targets
//! mint opaque [`OutputHandle`]s and are mutated only through this trait:
//! node creation and initial configuration happen during the work loop (on
//! detached nodes), attachment and diff application happen during commit.

pub mod memory;
pub mod recording;

pub use memory::MemoryTree;
pub use recording::{RecordingTarget, TargetOp};

use crate::types::{EventCallback, NodeKind, PropValue};

// =============================================================================
// Output Handle
// =============================================================================

/// Opaque identifier for a node owned by the output target.
///
/// Minted by the target in [`OutputTarget::create_node`]; the engine stores
/// it on the owning fiber and hands it back for every mutation. The value
/// carries no meaning to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputHandle(pub u64);

// =============================================================================
// Output Target Trait
// =============================================================================

/// Abstract output capability consumed by the engine.
///
/// # Contract
///
/// - [`append_child`](Self::append_child) of a child that is already attached
///   somewhere is a *move*: the target detaches it from its old parent
///   first. The engine relies on this for keyed reordering.
/// - Property names matching `on<EventName>` never arrive via
///   [`set_property`](Self::set_property); the engine routes them through
///   [`subscribe`](Self::subscribe) / [`unsubscribe`](Self::unsubscribe).
/// - During one commit pass, `append_child` calls arrive in pre-order
///   traversal order of the committed tree.
pub trait OutputTarget {
    /// Allocate a new, detached node. For [`NodeKind::Text`] the tag is
    /// ignored and the textual value follows as the `nodeValue` property.
    fn create_node(&mut self, kind: NodeKind, tag: &str) -> OutputHandle;

    /// Assign a plain property.
    fn set_property(&mut self, handle: OutputHandle, name: &str, value: &PropValue);

    /// Clear a previously set property.
    fn remove_property(&mut self, handle: OutputHandle, name: &str);

    /// Attach `child` as the last child of `parent`, moving it if attached.
    fn append_child(&mut self, parent: OutputHandle, child: OutputHandle);

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: OutputHandle, child: OutputHandle);

    /// Establish an event subscription on a node.
    fn subscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback);

    /// Tear down an event subscription previously established with the same
    /// handler.
    fn unsubscribe(&mut self, handle: OutputHandle, event: &str, handler: &EventCallback);

    /// Dispose of a node that was created but never attached (a cancelled
    /// render cycle materialized it and then abandoned the tree). Targets
    /// that pool or refcount nodes can reclaim here; the default does
    /// nothing.
    fn discard_node(&mut self, handle: OutputHandle) {
        let _ = handle;
    }
}
