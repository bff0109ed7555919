
//! Context-scoped rewrite cache.
//!
//! The cache memoizes rewriting results keyed on the logical context they
//! were computed under: the active hypotheses, the quantifier scoping facts,
//! and whatever rules are in the middle of being applied recursively. A
//! cached result is reused if and only if that whole context is identical,
//! which is cheap to decide because contexts and cache keys are hashconsed
//! terms: handle equality is context equality.
//!
//! All state lives in an explicit `RewriteCache` value; the term store is
//! a separate value passed `&mut` into each operation. Single-threaded.

extern crate fxhash;
extern crate smallvec;
#[macro_use] extern crate log;

pub mod ctx;
pub mod nesting;
pub mod cycle;
pub mod intf;
pub mod cache;

use batrw_core::{Term, TermStore};

/// A proof-search iteration counter.
///
/// Cycles increase monotonically over a search; the cycle block list and the
/// snapshot policy compare them to decide whether caching is permitted and
/// which context snapshot a key must carry.
pub type Cycle = u64;

/// The reserved marker atoms the cache builds its interned structures from.
///
/// A context is `ctx_set` applied to its members, the empty context being
/// the bare marker; likewise for the quantifier side. The remaining markers
/// head addition keys, cache keys and nesting signatures so that the
/// different key shapes can never collide.
#[derive(Clone, Debug)]
pub struct Builtins {
    pub ctx_set: Term,
    pub qctx_set: Term,
    pub qpair: Term,
    pub ctx_add: Term,
    pub qctx_add: Term,
    pub key4: Term,
    pub key5: Term,
    pub nest_rules: Term,
    pub nest_insts: Term,
    pub nest_sig: Term,
    pub true_: Term,
    pub false_: Term,
}

impl Builtins {
    /// Mint the marker atoms in the given store.
    pub fn new(m: &mut TermStore) -> Self {
        Builtins {
            ctx_set: m.mk_const("ctx.set"),
            qctx_set: m.mk_const("qctx.set"),
            qpair: m.mk_const("qctx.pair"),
            ctx_add: m.mk_const("ctx.add"),
            qctx_add: m.mk_const("qctx.add"),
            key4: m.mk_const("cache.key4"),
            key5: m.mk_const("cache.key5"),
            nest_rules: m.mk_const("nest.rules"),
            nest_insts: m.mk_const("nest.insts"),
            nest_sig: m.mk_const("nest.sig"),
            true_: m.mk_const("true"),
            false_: m.mk_const("false"),
        }
    }
}

pub use crate::{
    cache::{RewriteCache, Stats},
    ctx::{MAX_PENDING, MAX_CTX_DEPTH},
    cycle::CycleBlocks,
    intf::{ContextSource, SnapshotPolicy, Tracer, NoTrace, ViolationThresholds},
    nesting::MAX_NEST_DEPTH,
};
