
//! Logical context state.
//!
//! Holds the current context and quantifier-context, the pending-addition
//! buffers feeding them, and the bounded stack of saved pairs for nested
//! proof scopes. Contexts are canonical hashconsed terms: committing the
//! same hypothesis set in any proposal order yields the identical handle.

use {
    smallvec::SmallVec,
    batrw_core::{Term, TermStore, View},
    crate::{Builtins, cache::Slots},
};

type SVec<T> = SmallVec<[T; 3]>;

/// Capacity of each pending-addition buffer. Proposing onto a full buffer
/// commits it first; hypotheses are never dropped.
pub const MAX_PENDING: usize = 250;

/// Maximum depth of the context stack. Exceeding it is fatal.
pub const MAX_CTX_DEPTH: usize = 30;

// a saved (context, quantifier-context) pair
struct Frame {
    ctx: Term,
    qctx: Term,
}

pub(crate) struct CtxState {
    cur: Term,
    cur_q: Term,
    pending: Vec<Term>,
    pending_q: Vec<Term>,
    frames: Vec<Frame>,
}

impl CtxState {
    pub(crate) fn new(b: &Builtins) -> Self {
        CtxState {
            cur: b.ctx_set,
            cur_q: b.qctx_set,
            pending: Vec::new(),
            pending_q: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// The current context. Stale while additions are pending.
    #[inline(always)]
    pub(crate) fn cur(&self) -> Term { self.cur }

    #[inline(always)]
    pub(crate) fn cur_quant(&self) -> Term { self.cur_q }

    #[inline(always)]
    pub(crate) fn depth(&self) -> usize { self.frames.len() }

    pub(crate) fn quant_is_empty(&self, b: &Builtins) -> bool {
        self.cur_q == b.qctx_set && self.pending_q.is_empty()
    }

    /// Buffer `h` for the next commit, unless it is already buffered.
    pub(crate) fn propose_hypothesis(
        &mut self, m: &mut TermStore, b: &Builtins, slots: &mut Slots, h: Term,
    ) {
        if self.pending.contains(&h) { return }
        if self.pending.len() >= MAX_PENDING {
            self.flush(m, b, slots);
        }
        self.pending.push(h);
    }

    /// Buffer the scoping fact `(var, level)` for the next commit.
    pub(crate) fn propose_quant_fact(
        &mut self, m: &mut TermStore, b: &Builtins, slots: &mut Slots,
        var: Term, level: u32,
    ) {
        let lvl = m.mk_idx(level);
        let pair = m.mk_app(b.qpair, &[var, lvl]);
        if self.pending_q.contains(&pair) { return }
        if self.pending_q.len() >= MAX_PENDING {
            self.flush(m, b, slots);
        }
        self.pending_q.push(pair);
    }

    /// Commit both pending buffers into fresh canonical contexts.
    pub(crate) fn flush(&mut self, m: &mut TermStore, b: &Builtins, slots: &mut Slots) {
        if !self.pending.is_empty() {
            trace!("ctx.flush: {} pending hypotheses", self.pending.len());
            self.cur = commit(
                m, slots, b.ctx_set, b.ctx_add, self.cur, &mut self.pending, true);
        }
        if !self.pending_q.is_empty() {
            trace!("ctx.flush: {} pending quantifier facts", self.pending_q.len());
            self.cur_q = commit(
                m, slots, b.qctx_set, b.qctx_add, self.cur_q, &mut self.pending_q, false);
        }
    }

    /// Enter a nested proof scope: commit, then save the current pair.
    pub(crate) fn push(&mut self, m: &mut TermStore, b: &Builtins, slots: &mut Slots) {
        self.flush(m, b, slots);
        if self.frames.len() >= MAX_CTX_DEPTH {
            panic!("cannot push context frame: stack overflow at depth {}",
                   MAX_CTX_DEPTH);
        }
        self.frames.push(Frame { ctx: self.cur, qctx: self.cur_q });
        trace!("ctx.push: depth {}", self.frames.len());
    }

    /// Leave the current scope: restore the saved pair, drop pending additions.
    pub(crate) fn pop(&mut self) {
        match self.frames.pop() {
            Some(fr) => {
                self.cur = fr.ctx;
                self.cur_q = fr.qctx;
                self.pending.clear();
                self.pending_q.clear();
                trace!("ctx.pop: depth {}", self.frames.len());
            },
            None => panic!("cannot pop context frame at depth 0"),
        }
    }
}

// Commit `adds` into `cur`, returning the new canonical context.
//
// Additions are sorted descending by handle. The merged context is memoized
// on an interned addition key, so growing the same base by the same set on
// another proof branch is a single slot read. With `shortcuts`, batches of
// one or two entries skip the sort; quantifier pairs always take it.
fn commit(
    m: &mut TermStore, slots: &mut Slots,
    set_mark: Term, add_mark: Term,
    cur: Term, adds: &mut Vec<Term>, shortcuts: bool,
) -> Term {
    debug_assert!(!adds.is_empty());
    if shortcuts && adds.len() == 1 {
        // nothing to order
    } else if shortcuts && adds.len() == 2 {
        if adds[0] < adds[1] { adds.swap(0, 1) }
    } else {
        adds.sort_unstable_by(|a, b| b.cmp(a));
    }

    let mut kargs: SVec<Term> = SVec::with_capacity(adds.len() + 1);
    kargs.push(cur);
    kargs.extend_from_slice(adds);
    let key = m.mk_app(add_mark, &kargs);

    let new_ctx = match slots.get(key) {
        Some(c) => {
            trace!("ctx.commit: reuse {:?} for key {:?}", c, key);
            c
        },
        None => {
            let mut members: SVec<Term> = SVec::new();
            if cur != set_mark {
                if let View::App { args, .. } = m.view(cur) {
                    members.extend_from_slice(args);
                }
            }
            members.extend_from_slice(adds);
            let c = m.mk_app(set_mark, &members);
            slots.set(key, c);
            trace!("ctx.commit: new {:?} ({} members)", c, members.len());
            c
        }
    };
    adds.clear();
    new_ctx
}
