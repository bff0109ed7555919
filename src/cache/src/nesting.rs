
//! Recursive rule application tracking.
//!
//! One frame per rule application in flight. Each frame flags the rule and
//! the instantiated rewrite it entered with, and the set of flags currently
//! on the stack folds into a canonical signature term for cache keys.

use {
    fxhash::FxHashSet,
    smallvec::SmallVec,
    batrw_core::{Term, TermStore},
    crate::Builtins,
};

type SVec<T> = SmallVec<[T; 3]>;

/// Maximum depth of the nesting stack, the recursion guard against
/// self-referential rule application.
pub const MAX_NEST_DEPTH: usize = 50;

struct Frame {
    rule: Option<Term>,
    inst: Option<Term>,
    sig: Option<Term>, // signature memoized for this depth
}

pub(crate) struct NestingTracker {
    frames: Vec<Frame>,
    in_use: FxHashSet<Term>,
    in_rewrite: FxHashSet<Term>,
}

impl NestingTracker {
    pub(crate) fn new() -> Self {
        NestingTracker {
            frames: Vec::new(),
            in_use: FxHashSet::default(),
            in_rewrite: FxHashSet::default(),
        }
    }

    #[inline(always)]
    pub(crate) fn depth(&self) -> usize { self.frames.len() }

    #[inline(always)]
    pub(crate) fn active(&self) -> bool { !self.frames.is_empty() }

    pub(crate) fn at_limit(&self) -> bool {
        self.frames.len() >= MAX_NEST_DEPTH
    }

    /// Enter a recursive rule application.
    ///
    /// A rule already flagged deeper in the stack is recorded as an empty
    /// placeholder: it stays excluded from re-use without a second flag,
    /// and the matching pop will not unflag it early. Same for `inst`.
    pub(crate) fn push_frame(&mut self, rule: Term, inst: Term) {
        if self.at_limit() {
            panic!("cannot push rule frame: nesting limit {} reached",
                   MAX_NEST_DEPTH);
        }
        let rule = if self.in_use.insert(rule) { Some(rule) } else { None };
        let inst = if self.in_rewrite.insert(inst) { Some(inst) } else { None };
        self.frames.push(Frame { rule, inst, sig: None });
        trace!("nest.push: depth {}", self.frames.len());
    }

    pub(crate) fn pop_frame(&mut self) {
        match self.frames.pop() {
            Some(fr) => {
                if let Some(r) = fr.rule { self.in_use.remove(&r); }
                if let Some(i) = fr.inst { self.in_rewrite.remove(&i); }
                trace!("nest.pop: depth {}", self.frames.len());
            },
            None => panic!("cannot pop rule frame at depth 0"),
        }
    }

    /// The canonical signature of the active stack, memoized per depth.
    ///
    /// Two stacks flagging the same rule and rewrite sets get the same
    /// signature handle, whatever order they were entered in.
    pub(crate) fn signature(&mut self, m: &mut TermStore, b: &Builtins) -> Term {
        if let Some(fr) = self.frames.last() {
            if let Some(s) = fr.sig { return s }
        }
        let mut rules: SVec<Term> = self.frames.iter().filter_map(|f| f.rule).collect();
        let mut insts: SVec<Term> = self.frames.iter().filter_map(|f| f.inst).collect();
        rules.sort_unstable_by(|a, b| b.cmp(a));
        insts.sort_unstable_by(|a, b| b.cmp(a));
        let rs = m.mk_app(b.nest_rules, &rules);
        let is_ = m.mk_app(b.nest_insts, &insts);
        let sig = m.mk_app(b.nest_sig, &[rs, is_]);
        if let Some(fr) = self.frames.last_mut() {
            fr.sig = Some(sig);
        }
        sig
    }
}
