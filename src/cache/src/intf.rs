
//! Interfaces to the cache's collaborators.

use {
    batrw_core::{Term, TermStore},
    crate::Cycle,
};

/// Rule-engine side of the cache: can rebuild the full historical context
/// behind the current goal, for conservatively keyed entries.
pub trait ContextSource {
    fn full_context(&mut self, m: &mut TermStore) -> Term;
}

/// Decides which context snapshot keys an entry at a given cycle: the
/// cheap current context, or the full reconstruction from the rule engine.
pub trait SnapshotPolicy {
    /// True if entries for this cycle must key on the full context.
    fn wants_full_context(&self, cycle: Cycle) -> bool;
}

/// Default policy. Tracks the latest cycles at which a soundness violation
/// was tested and used; entries at or before either are keyed on the full
/// context, newer ones on the cheap one.
#[derive(Clone, Debug, Default)]
pub struct ViolationThresholds {
    tested: Cycle,
    used: Cycle,
}

impl ViolationThresholds {
    pub fn new() -> Self { Self::default() }

    /// Record that a violation was tested at `cycle`. Monotonic.
    pub fn note_violation_tested(&mut self, cycle: Cycle) {
        if cycle > self.tested { self.tested = cycle }
    }

    /// Record that a violation was used at `cycle`. Monotonic.
    pub fn note_violation_used(&mut self, cycle: Cycle) {
        if cycle > self.used { self.used = cycle }
    }

    fn threshold(&self) -> Cycle {
        self.tested.max(self.used)
    }
}

impl SnapshotPolicy for ViolationThresholds {
    fn wants_full_context(&self, cycle: Cycle) -> bool {
        let t = self.threshold();
        t > 0 && cycle <= t
    }
}

/// Diagnostics hook. Recording is side-effecting only and never changes
/// what the cache returns.
pub trait Tracer {
    fn cache_hit(&mut self, _key: Term) {}
    fn cache_store(&mut self, _key: Term) {}
}

/// The tracer that records nothing.
pub struct NoTrace;

impl Tracer for NoTrace {}
