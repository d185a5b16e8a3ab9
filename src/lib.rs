//! # wisp-ui
//!
//! Incremental UI rendering runtime for Rust.
//!
//! wisp-ui turns immutable tree descriptors into mutations on an abstract
//! output target, re-rendering incrementally: each cycle diffs the new
//! descriptor tree against a persistent fiber tree and applies only the
//! difference. Work is sliced into interruptible units so a host can
//! interleave rendering with its own event loop.
//!
//! ## Architecture
//!
//! ```text
//! element()/text()/component()        descriptor tree (immutable, per cycle)
//!            │
//!            ▼
//! RenderEngine::mount ──► unit-of-work loop ──► reconcile against fibers
//!            │                 (interruptible, budget-driven)
//!            ▼
//!        commit ──► OutputTarget mutations (atomic per cycle)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (PropValue, Props, events, errors)
//! - [`element`] - Descriptor builders ([`element`], [`text`], [`component`])
//! - [`fiber`] - The persistent fiber tree and its arena
//! - [`engine`] - Reconciliation, scheduling, commit
//! - [`target`] - The [`OutputTarget`] boundary plus test/demo targets

pub mod element;
pub mod engine;
pub mod fiber;
pub mod target;
pub mod types;

// Re-export commonly used items
pub use types::{
    event_name, EngineError, Event, EventCallback, NodeKind, PropValue, Props, TEXT_VALUE,
};

pub use element::{component, element, text, ComponentFn, Element, ElementKind};

pub use fiber::{EffectFlags, Fiber, FiberArena, FiberId};

pub use engine::{
    render_sync, RenderEngine, SliceOutcome, TimeSlice, Unbounded, UnitQuota, WorkBudget,
};

pub use target::{MemoryTree, OutputHandle, OutputTarget, RecordingTarget, TargetOp};
