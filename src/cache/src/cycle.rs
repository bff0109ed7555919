
//! Per-cycle cache permission records.
//!
//! The search layer blocks caching when it detects that results produced
//! after some rewrite cycle may be unsound on the current branch. Records
//! are tagged with the search depth that created them so backtracking can
//! cancel exactly the ones that no longer apply.

use crate::Cycle;

struct Block {
    level: u32,
    cycle: Cycle,
}

/// The cycle block list. The most recent record decides: caching is
/// permitted for cycles no newer than its cycle, blocked past it.
pub struct CycleBlocks {
    recs: Vec<Block>,
}

impl CycleBlocks {
    pub fn new() -> Self { CycleBlocks { recs: Vec::new() } }

    /// Record a block made at search depth `level` for `cycle`.
    pub fn add_block(&mut self, level: u32, cycle: Cycle) {
        trace!("cycle.block: level {} cycle {}", level, cycle);
        self.recs.push(Block { level, cycle });
    }

    /// Drop every record made at or above `level`.
    pub fn cancel_blocks(&mut self, level: u32) {
        self.recs.retain(|r| r.level < level);
    }

    /// Is caching blocked for results originating at `cycle`?
    pub fn is_blocked(&self, cycle: Cycle) -> bool {
        match self.recs.last() {
            None => false,
            Some(r) => r.cycle < cycle,
        }
    }

    pub fn is_empty(&self) -> bool { self.recs.is_empty() }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_permits() {
        let b = CycleBlocks::new();
        assert!(!b.is_blocked(0));
        assert!(!b.is_blocked(42));
    }

    #[test]
    fn test_most_recent_record_rules() {
        let mut b = CycleBlocks::new();
        b.add_block(1, 10);
        assert!(!b.is_blocked(9));
        assert!(!b.is_blocked(10));
        assert!(b.is_blocked(11));
        b.add_block(2, 12);
        assert!(!b.is_blocked(11));
        assert!(b.is_blocked(13));
    }

    #[test]
    fn test_cancel_restores() {
        let mut b = CycleBlocks::new();
        b.add_block(3, 10);
        assert!(b.is_blocked(11));
        b.cancel_blocks(3);
        assert!(!b.is_blocked(11));
        assert!(b.is_empty());
    }

    #[test]
    fn test_cancel_keeps_lower_levels() {
        let mut b = CycleBlocks::new();
        b.add_block(1, 5);
        b.add_block(3, 8);
        b.add_block(4, 9);
        b.cancel_blocks(3);
        // only the level 1 record survives
        assert!(!b.is_blocked(5));
        assert!(b.is_blocked(6));
    }
}
