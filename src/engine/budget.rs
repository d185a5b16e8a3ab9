//! Cooperative work budgets.
//!
//! The engine never owns a timer or an idle callback: the host invokes
//! [`drive_one_slice`](crate::engine::RenderEngine::drive_one_slice)
//! repeatedly with a budget, and the engine performs units of work until the
//! budget is exhausted or no work remains. Which budget makes sense depends
//! on the host: a wall-clock slice for real frames, a unit quota for
//! deterministic tests, unbounded for blocking renders.

use std::time::{Duration, Instant};

// =============================================================================
// Budget Trait
// =============================================================================

/// Decides, before each unit of work, whether the slice may continue.
pub trait WorkBudget {
    /// True while there is budget left for another unit of work.
    fn has_remaining(&mut self) -> bool;
}

// =============================================================================
// Budgets
// =============================================================================

/// Wall-clock budget: work until a deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    deadline: Instant,
}

impl TimeSlice {
    /// A slice lasting `budget` from now.
    pub fn new(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
        }
    }

    /// A slice ending at an externally supplied deadline.
    pub fn until(deadline: Instant) -> Self {
        Self { deadline }
    }
}

impl WorkBudget for TimeSlice {
    fn has_remaining(&mut self) -> bool {
        Instant::now() < self.deadline
    }
}

/// Unit-count budget: perform at most `n` units of work, then yield.
///
/// Slicing by unit count is what makes scheduling granularity testable: the
/// determinism property runs the same tree under quotas of 1, 2, 3, ... and
/// asserts identical target-call sequences.
#[derive(Debug, Clone, Copy)]
pub struct UnitQuota {
    remaining: usize,
}

impl UnitQuota {
    /// Budget for `units` units of work.
    pub fn new(units: usize) -> Self {
        Self { remaining: units }
    }
}

impl WorkBudget for UnitQuota {
    fn has_remaining(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// No budget: run until no work remains.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl WorkBudget for Unbounded {
    fn has_remaining(&mut self) -> bool {
        true
    }
}

// =============================================================================
// Slice Outcome
// =============================================================================

/// What one driver invocation accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Nothing was outstanding; the call was a no-op.
    Idle,
    /// Budget ran out with work remaining; call again later.
    Yielded,
    /// All work finished and the tree was committed during this slice.
    Committed,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_quota_counts_down() {
        let mut quota = UnitQuota::new(2);
        assert!(quota.has_remaining());
        assert!(quota.has_remaining());
        assert!(!quota.has_remaining());
        assert!(!quota.has_remaining());
    }

    #[test]
    fn test_zero_quota_yields_immediately() {
        let mut quota = UnitQuota::new(0);
        assert!(!quota.has_remaining());
    }

    #[test]
    fn test_expired_time_slice() {
        let mut slice = TimeSlice::until(Instant::now() - Duration::from_millis(1));
        assert!(!slice.has_remaining());
    }

    #[test]
    fn test_unbounded_never_yields() {
        let mut budget = Unbounded;
        for _ in 0..1000 {
            assert!(budget.has_remaining());
        }
    }
}
