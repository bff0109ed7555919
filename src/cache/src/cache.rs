
//! The rewrite cache: lookup/store protocol, cache keys, invalidation.
//!
//! Every cached result lives in a single slot table keyed by term handle.
//! With no quantified variables in scope and no rule application in flight,
//! a goal's slot holds its rewrite directly and lookups chase chains of
//! rewrites through the table. Otherwise results are keyed on an interned
//! tuple of goal, quantifier-context, context snapshot, transitive flag and,
//! under nested rule application, the nesting signature. The context merge
//! memos of `crate::ctx` share the same table, so one sweep invalidates
//! everything.

use {
    batrw_core::{DenseMap, Term, TermSet, TermStore},
    crate::{
        Builtins, Cycle,
        ctx::CtxState,
        cycle::CycleBlocks,
        intf::{ContextSource, NoTrace, SnapshotPolicy, Tracer, ViolationThresholds},
        nesting::NestingTracker,
    },
};

/// Slot table plus the list of handles holding a slot, for the sweep.
pub(crate) struct Slots {
    map: DenseMap<Term>,
    populated: Vec<Term>,
}

impl Slots {
    fn new() -> Self {
        Slots { map: DenseMap::new(Term::SENTINEL), populated: Vec::new() }
    }

    #[inline(always)]
    pub(crate) fn get(&self, t: Term) -> Option<Term> {
        self.map.get(t).copied()
    }

    pub(crate) fn set(&mut self, t: Term, v: Term) {
        if !self.map.contains(t) {
            self.populated.push(t);
        }
        self.map.insert(t, v);
    }

    // clear in time proportional to the populated slots, not the table
    fn clear_all(&mut self) -> usize {
        let n = self.populated.len();
        for t in self.populated.drain(..) {
            self.map.remove(t);
        }
        debug_assert!(self.map.is_empty());
        n
    }

    fn len(&self) -> usize { self.map.len() }
}

/// Running counters, for end-of-search logging.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub blocked: u64,
    pub sweeps: u64,
    pub swept: u64,
}

/// Context-scoped cache of rewrite results.
///
/// Owns the context state, the nesting tracker, the cycle block list and
/// the slot table. `P` decides which context snapshot keys an entry and
/// `T` observes hits and stores; the defaults are `ViolationThresholds`
/// and `NoTrace`.
///
/// Handles are only meaningful against the `TermStore` the cache was
/// created with, which the caller passes back into every operation that
/// builds terms.
pub struct RewriteCache<P: SnapshotPolicy, T: Tracer> {
    b: Builtins,
    ctx: CtxState,
    nest: NestingTracker,
    blocks: CycleBlocks,
    slots: Slots,
    policy: P,
    tracer: T,
    cycle: Cycle,
    seen: TermSet, // scratch for chain chasing
    stats: Stats,
}

impl RewriteCache<ViolationThresholds, NoTrace> {
    /// New cache with the default snapshot policy and no tracing.
    pub fn new(m: &mut TermStore) -> Self {
        Self::new_with(m, ViolationThresholds::new(), NoTrace)
    }
}

impl<P: SnapshotPolicy, T: Tracer> RewriteCache<P, T> {
    /// New cache over `m` with the given policy and tracer.
    pub fn new_with(m: &mut TermStore, policy: P, tracer: T) -> Self {
        let b = Builtins::new(m);
        let ctx = CtxState::new(&b);
        RewriteCache {
            b, ctx,
            nest: NestingTracker::new(),
            blocks: CycleBlocks::new(),
            slots: Slots::new(),
            policy, tracer,
            cycle: 0,
            seen: TermSet::default(),
            stats: Stats::default(),
        }
    }

    // ## Context

    /// Buffer hypothesis `h` for the current context.
    pub fn propose_hypothesis(&mut self, m: &mut TermStore, h: Term) {
        self.ctx.propose_hypothesis(m, &self.b, &mut self.slots, h)
    }

    /// Buffer the quantified variable `var`, scoped at `level`, for the
    /// current quantifier-context.
    pub fn propose_quantifier_fact(&mut self, m: &mut TermStore, var: Term, level: u32) {
        self.ctx.propose_quant_fact(m, &self.b, &mut self.slots, var, level)
    }

    /// Commit pending additions into fresh canonical contexts.
    pub fn flush(&mut self, m: &mut TermStore) {
        self.ctx.flush(m, &self.b, &mut self.slots)
    }

    /// Enter a nested proof scope. Panics past `MAX_CTX_DEPTH`.
    pub fn push(&mut self, m: &mut TermStore) {
        self.ctx.push(m, &self.b, &mut self.slots)
    }

    /// Leave the current proof scope. Panics at depth 0.
    pub fn pop(&mut self) { self.ctx.pop() }

    /// Depth of the context stack.
    pub fn depth(&self) -> usize { self.ctx.depth() }

    /// The current context, with pending additions committed first.
    pub fn current_context(&mut self, m: &mut TermStore) -> Term {
        self.flush(m);
        self.ctx.cur()
    }

    /// The current quantifier-context, with pending additions committed.
    pub fn current_quant_context(&mut self, m: &mut TermStore) -> Term {
        self.flush(m);
        self.ctx.cur_quant()
    }

    // ## Rewrite cycles

    /// Tell the cache the rewrite cycle current lookups run under.
    pub fn begin_cycle(&mut self, c: Cycle) {
        debug_assert!(c >= self.cycle, "rewrite cycles must not go backwards");
        self.cycle = c;
    }

    // ## Nesting

    /// Enter a recursive application of `rule` instantiated as `inst`.
    /// Panics past `MAX_NEST_DEPTH`.
    pub fn push_rule_frame(&mut self, rule: Term, inst: Term) {
        self.nest.push_frame(rule, inst)
    }

    /// Leave the innermost rule application. Panics at depth 0.
    pub fn pop_rule_frame(&mut self) { self.nest.pop_frame() }

    pub fn at_nesting_limit(&self) -> bool { self.nest.at_limit() }

    pub fn nesting_depth(&self) -> usize { self.nest.depth() }

    /// Canonical signature of the active rule stack.
    pub fn nesting_signature(&mut self, m: &mut TermStore) -> Term {
        self.nest.signature(m, &self.b)
    }

    // ## Cycle blocks

    /// Block caching past `cycle`, tagged with search depth `level`.
    pub fn add_block(&mut self, level: u32, cycle: Cycle) {
        self.blocks.add_block(level, cycle)
    }

    /// Cancel blocks made at or above search depth `level`.
    pub fn cancel_blocks(&mut self, level: u32) {
        self.blocks.cancel_blocks(level)
    }

    /// Is caching blocked for results originating at `cycle`?
    pub fn is_blocked(&self, cycle: Cycle) -> bool {
        self.blocks.is_blocked(cycle)
    }

    // ## Lookup and store

    /// Look up a cached rewrite of `t` under the current state.
    pub fn lookup<S>(
        &mut self, m: &mut TermStore, src: &mut S, t: Term, transitive: bool,
    ) -> Option<Term>
        where S: ContextSource
    {
        self.flush(m);
        let r = if self.fast_path() {
            let r = self.lookup_fast(m, t);
            if r.is_some() {
                self.tracer.cache_hit(t);
            }
            r
        } else {
            self.lookup_slow(m, src, t, transitive)
        };
        match r {
            Some(res) => {
                self.stats.hits += 1;
                trace!("cache.hit: {:?} -> {:?}", t, res);
            },
            None => {
                self.stats.misses += 1;
                trace!("cache.miss: {:?}", t);
            }
        }
        r
    }

    /// Record that `t` rewrote to `result` during `origin`.
    ///
    /// Panics if the computed key is already bound to a different result.
    pub fn store<S>(
        &mut self, m: &mut TermStore, src: &mut S,
        t: Term, result: Term, transitive: bool, origin: Cycle,
    )
        where S: ContextSource
    {
        self.flush(m);
        if self.fast_path() {
            // chains stay well formed under overwrite: later rewrites of
            // the same goal supersede earlier ones
            self.slots.set(t, result);
            self.tracer.cache_store(t);
            self.stats.stores += 1;
            trace!("cache.store: {:?} -> {:?}", t, result);
            return;
        }
        if self.blocks.is_blocked(origin) {
            self.stats.blocked += 1;
            trace!("cache.store: blocked for cycle {}", origin);
            return;
        }
        let k = self.build_key(m, src, t, transitive, origin);
        match self.slots.get(k) {
            Some(prev) if prev != result => {
                panic!("cache key {:?} already bound to a different result: \
                        have {:?}, refusing {:?}", k, prev, result);
            },
            Some(_) => (),
            None => {
                self.slots.set(k, result);
                self.tracer.cache_store(k);
                self.stats.stores += 1;
                trace!("cache.store: {:?} -> {:?} (key {:?})", t, result, k);
            }
        }
    }

    /// Drop every cached entry, including context merge memos.
    /// Returns how many slots were cleared.
    pub fn clear_all(&mut self) -> usize {
        let n = self.slots.clear_all();
        self.stats.sweeps += 1;
        self.stats.swept += n as u64;
        debug!("cache.sweep: cleared {} entries", n);
        n
    }

    /// Number of populated slots.
    pub fn n_cached(&self) -> usize { self.slots.len() }

    pub fn stats(&self) -> &Stats { &self.stats }

    pub fn policy(&self) -> &P { &self.policy }

    pub fn policy_mut(&mut self) -> &mut P { &mut self.policy }

    pub fn tracer(&self) -> &T { &self.tracer }

    pub fn tracer_mut(&mut self) -> &mut T { &mut self.tracer }

    pub fn builtins(&self) -> &Builtins { &self.b }

    // ## Internal

    // direct slots apply only with no quantified variables in scope and
    // no rule application in flight
    #[inline(always)]
    fn fast_path(&self) -> bool {
        self.ctx.quant_is_empty(&self.b) && !self.nest.active()
    }

    // Chase the rewrite chain from `t` to its last resolved value. Chains
    // over variable bindings may loop; resolve a loop to the most recent
    // variable seen on it, or failing that the last term before the revisit.
    fn lookup_fast(&mut self, m: &TermStore, t: Term) -> Option<Term> {
        let first = self.slots.get(t)?;
        self.seen.clear();
        self.seen.insert(t);
        let mut prev = first;
        let mut cur = first;
        let mut last_idx = None;
        loop {
            if m.is_idx(cur) {
                last_idx = Some(cur);
            }
            if !self.seen.insert(cur) {
                return Some(last_idx.unwrap_or(prev));
            }
            match self.slots.get(cur) {
                None => return Some(cur),
                Some(next) => {
                    prev = cur;
                    cur = next;
                }
            }
        }
    }

    fn lookup_slow<S>(
        &mut self, m: &mut TermStore, src: &mut S, t: Term, transitive: bool,
    ) -> Option<Term>
        where S: ContextSource
    {
        let qc = self.ctx.cur_quant();
        let gc = self.snapshot(m, src, self.cycle);
        let tr = if transitive { self.b.true_ } else { self.b.false_ };
        if self.nest.active() {
            let sig = self.nest.signature(m, &self.b);
            let k5 = m.mk_app(self.b.key5, &[t, qc, gc, tr, sig]);
            if let Some(r) = self.slots.get(k5) {
                self.tracer.cache_hit(k5);
                return Some(r);
            }
        }
        // entries stored outside any rule application still apply inside one
        let k4 = m.mk_app(self.b.key4, &[t, qc, gc, tr]);
        match self.slots.get(k4) {
            Some(r) => {
                self.tracer.cache_hit(k4);
                Some(r)
            },
            None => None,
        }
    }

    fn build_key<S>(
        &mut self, m: &mut TermStore, src: &mut S,
        t: Term, transitive: bool, cycle: Cycle,
    ) -> Term
        where S: ContextSource
    {
        let qc = self.ctx.cur_quant();
        let gc = self.snapshot(m, src, cycle);
        let tr = if transitive { self.b.true_ } else { self.b.false_ };
        if self.nest.active() {
            let sig = self.nest.signature(m, &self.b);
            m.mk_app(self.b.key5, &[t, qc, gc, tr, sig])
        } else {
            m.mk_app(self.b.key4, &[t, qc, gc, tr])
        }
    }

    fn snapshot<S>(&self, m: &mut TermStore, src: &mut S, cycle: Cycle) -> Term
        where S: ContextSource
    {
        if self.policy.wants_full_context(cycle) {
            src.full_context(m)
        } else {
            self.ctx.cur()
        }
    }
}
