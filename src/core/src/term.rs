
//! The term store.
//!
//! The store owns every term node, referred to via `Term`. Nodes can
//! represent hypotheses, contexts, cache keys, or any other expression the
//! rewrite engine builds. Applications and index terms are hashconsed:
//! building the same structure twice yields the same handle, so `==` on
//! handles is structural equality. Handles are dense indices, which makes
//! insertion order a stable total order and lets side tables be plain
//! vectors.

use {
    std::{slice, fmt, marker::PhantomData},
    fxhash::{FxHashMap, FxHashSet},
};

/// The unique identifier of a term node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct Term(u32);

impl Term {
    /// A value of type Term. Only ever used to fill arrays, do not access.
    pub const SENTINEL: Term = Term(u32::MAX);
}

/// The definition of a term node, as seen from outside.
#[derive(Debug, Copy, Clone)]
pub enum View<'a> {
    /// A named atom. Names are for diagnostics only.
    Const(&'a str),
    /// An n-ary application.
    App {
        f: Term,
        args: &'a [Term],
    },
    /// A numbered atom (variable index, quantifier level, ...).
    Idx(u32),
}

/// Definition of application keys
///
/// These keys are optimized so that:
/// - they don't need any allocation for "small" applications
/// - they only need to allocate one Box for "big" applications, shared between
///   the map and vector
pub(crate) struct AppStored<'a> {
    f: Term,
    len: u16,
    args: app_stored::ArrOrVec<Term>,
    phantom: PhantomData<&'a ()>,
}

mod app_stored {
    use super::*;

    // Number of arguments for a "small" term application
    const N_SMALL_APP: usize = 3;

    #[derive(Copy, Clone)]
    pub(crate) union ArrOrVec<T: Copy> {
        arr: [T; N_SMALL_APP],
        ptr: *const T, // will be shared between vec and hashmap
    }

    fn check_len(len: usize) {
        if len > u16::MAX as usize {
            panic!("cannot make a term application of length {}", len);
        }
    }

    impl AppStored<'static> {
        pub fn new(f: Term, args: &[Term]) -> Self {
            let len = args.len();
            check_len(len);

            // copy arguments into local array or heap
            let new_args =
                if len <= N_SMALL_APP {
                    let mut arr = [Term::SENTINEL; N_SMALL_APP];
                    arr[0..len].copy_from_slice(args);
                    ArrOrVec { arr }
                } else {
                    use std::mem;
                    // go through a vector to allocate on the heap
                    let mut v = Vec::with_capacity(len);
                    v.extend_from_slice(args);
                    debug_assert_eq!(v.capacity(), len);
                    let box_ = v.into_boxed_slice();
                    let ptr = box_.as_ptr(); // access the pointer
                    mem::forget(box_);
                    ArrOrVec { ptr }
                };
            let r = AppStored {
                f, len: len as u16, args: new_args,
                phantom: PhantomData,
            };
            debug_assert_eq!(r.args(), args, "expected {:?} got {:?}", args, r.args());
            r
        }

        // release memory
        pub unsafe fn free(&mut self) {
            let len = self.len as usize;
            if len > N_SMALL_APP {
                // explicitly release memory
                let ptr = self.args.ptr as *mut Term;
                let v = Vec::from_raw_parts(ptr, len, len);
                drop(v)
            }
        }
    }

    impl<'a> AppStored<'a> {
        #[inline(always)]
        pub fn f(&self) -> Term { self.f }

        #[inline(always)]
        pub fn args<'b: 'a>(&'b self) -> &'b [Term] {
            let len = self.len as usize;
            if len <= N_SMALL_APP {
                unsafe { &self.args.arr[..len] }
            } else {
                unsafe { slice::from_raw_parts(self.args.ptr, len) }
            }
        }

        // Temporary-lived key, borrowing the given slice
        pub fn mk_ref(f: Term, args: &[Term]) -> Self {
            let len = args.len();
            check_len(len);
            let new_args =
                if len <= N_SMALL_APP {
                    let mut arr = [Term::SENTINEL; N_SMALL_APP];
                    arr[0..len].copy_from_slice(args);
                    ArrOrVec { arr }
                } else {
                    ArrOrVec { ptr: args.as_ptr() }
                };
            let r = AppStored {
                f, len: len as u16, args: new_args,
                phantom: PhantomData,
            };
            debug_assert_eq!(r.args(), args, "expected {:?} got {:?}", args, r.args());
            r
        }

        pub fn to_owned(self) -> AppStored<'static> {
            AppStored::new(self.f, self.args())
        }
    }

    impl Copy for AppStored<'static> {}
    impl Clone for AppStored<'static> {
        fn clone(&self) -> Self { *self }
    }

    impl<'a> Eq for AppStored<'a> {}
    impl<'a> PartialEq for AppStored<'a> {
        fn eq(&self, other: &AppStored<'a>) -> bool {
            self.f == other.f && self.args() == other.args()
        }
    }

    use std::hash::{Hash, Hasher};

    impl<'a> Hash for AppStored<'a> {
        fn hash<H: Hasher>(&self, h: &mut H) {
            self.f.hash(h);
            self.args().hash(h)
        }
    }

    impl<'a> fmt::Debug for AppStored<'a> {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "({:?} {:?})", self.f, self.args())
        }
    }
}

// The kind of object stored in a given slot
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum Kind { App, Sym, Idx, }

/// The definition of a node
#[derive(Clone)]
struct NodeStored {
    kind: Kind,
    data: node_stored::Data,
}

mod node_stored {
    use super::*;

    #[derive(Copy, Clone)]
    pub(crate) union Data {
        pub app: AppStored<'static>,
        pub sym: u32, // index into the symbol table
        pub idx: u32, // the numbered atom itself
    }

    impl NodeStored {
        pub fn mk_sym(sym: u32) -> Self {
            NodeStored { kind: Kind::Sym, data: Data { sym } }
        }
        pub fn mk_app(app: AppStored<'static>) -> Self {
            NodeStored { kind: Kind::App, data: Data { app } }
        }
        pub fn mk_idx(idx: u32) -> Self {
            NodeStored { kind: Kind::Idx, data: Data { idx } }
        }

        #[inline(always)]
        pub fn kind(&self) -> Kind { self.kind }

        pub unsafe fn as_app(&self) -> &AppStored<'static> {
            debug_assert!(self.kind() == Kind::App);
            &self.data.app
        }

        pub unsafe fn as_sym(&self) -> u32 {
            debug_assert!(self.kind() == Kind::Sym);
            self.data.sym
        }

        pub unsafe fn as_idx(&self) -> u32 {
            debug_assert!(self.kind() == Kind::Idx);
            self.data.idx
        }

        /// release resources
        pub unsafe fn free(&mut self) {
            if let Kind::App = self.kind {
                self.data.app.free()
            }
        }
    }
}

/// The term store, responsible for storing and creating term nodes.
///
/// It is single-owner: operations take `&mut self` and the store is passed
/// by reference to whoever needs to build terms. Nodes live as long as the
/// store; nothing is freed before it is dropped.
pub struct TermStore {
    nodes: Vec<NodeStored>,
    syms: Vec<Box<str>>,
    tbl_app: FxHashMap<AppStored<'static>, Term>, // for hashconsing
    tbl_idx: FxHashMap<u32, Term>,
}

mod store {
    use super::*;

    impl TermStore {
        /// Create a new term store.
        pub fn new() -> Self {
            let mut tbl_app = FxHashMap::default();
            tbl_app.reserve(1_024);
            TermStore {
                nodes: Vec::with_capacity(512),
                syms: Vec::new(),
                tbl_app,
                tbl_idx: FxHashMap::default(),
            }
        }

        // allocate a fresh handle for `n`
        fn push_node(&mut self, n: NodeStored) -> Term {
            let i = self.nodes.len();
            // the sentinel index must stay unused
            if i >= u32::MAX as usize {
                panic!("cannot allocate more term nodes")
            }
            self.nodes.push(n);
            Term(i as u32)
        }

        /// View the given term node.
        #[inline(always)]
        pub fn view(&self, t: Term) -> View {
            let n = &self.nodes[t.0 as usize];
            match n.kind() {
                Kind::App => {
                    let k = unsafe { n.as_app() };
                    View::App { f: k.f(), args: k.args() }
                },
                Kind::Sym => {
                    let i = unsafe { n.as_sym() };
                    View::Const(&self.syms[i as usize])
                },
                Kind::Idx => View::Idx(unsafe { n.as_idx() }),
            }
        }

        #[inline(always)]
        pub fn is_app(&self, t: Term) -> bool {
            self.nodes[t.0 as usize].kind() == Kind::App
        }

        #[inline(always)]
        pub fn is_const(&self, t: Term) -> bool {
            self.nodes[t.0 as usize].kind() == Kind::Sym
        }

        #[inline(always)]
        pub fn is_idx(&self, t: Term) -> bool {
            self.nodes[t.0 as usize].kind() == Kind::Idx
        }

        /// Number of terms.
        pub fn n_terms(&self) -> usize {
            self.nodes.len()
        }

        /// `store.mk_app(f, args)` creates the application of `f` to `args`.
        ///
        /// If the term is structurally equal to an existing term, then this
        /// ensures the exact same handle is returned ("hashconsing").
        /// If `args` is empty, return `f`.
        pub fn mk_app(&mut self, f: Term, args: &[Term]) -> Term {
            if args.len() == 0 { return f }

            let k = AppStored::mk_ref(f, args);

            // borrow multiple fields
            let nodes = &mut self.nodes;
            let tbl_app = &mut self.tbl_app;

            match tbl_app.get(&k) {
                Some(&t) => t, // fast path
                None => {
                    // insert
                    let i = nodes.len();
                    if i >= u32::MAX as usize {
                        panic!("cannot allocate more term nodes")
                    }
                    let t = Term(i as u32);
                    // make 2 owned copies of the key; they share one buffer
                    let k1 = k.to_owned();
                    let k2 = k1.clone();
                    nodes.push(NodeStored::mk_app(k1));
                    tbl_app.insert(k2, t);
                    t
                }
            }
        }

        /// Make a named atom.
        ///
        /// Note that calling this function twice with the same name will
        /// result in two distinct terms (as if the second one was shadowing
        /// the first). Use an auxiliary hashtable if you want sharing.
        pub fn mk_const(&mut self, name: &str) -> Term {
            let i = self.syms.len();
            if i >= u32::MAX as usize {
                panic!("cannot allocate more symbols")
            }
            self.syms.push(name.into());
            self.push_node(NodeStored::mk_sym(i as u32))
        }

        /// Make a numbered atom.
        ///
        /// Index terms are hashconsed by value: `mk_idx(i)` twice returns
        /// the same handle.
        pub fn mk_idx(&mut self, i: u32) -> Term {
            match self.tbl_idx.get(&i) {
                Some(&t) => t,
                None => {
                    let t = self.push_node(NodeStored::mk_idx(i));
                    self.tbl_idx.insert(i, t);
                    t
                }
            }
        }
    }

    impl Drop for TermStore {
        fn drop(&mut self) {
            // the hashmap keys share the nodes' argument buffers, so only
            // the nodes free them
            for n in self.nodes.iter_mut() {
                unsafe { n.free() }
            }
        }
    }
}

/// A hashmap whose keys are terms
pub type TermMap<V> = FxHashMap<Term, V>;

/// A hashset whose keys are terms
pub type TermSet = FxHashSet<Term>;

mod dense_map {
    use super::*;
    use ::bit_set::BitSet;

    /// A term map backed by an array, with a default value
    #[derive(Clone)]
    pub struct T<V: Clone> {
        sentinel: V,
        mem: BitSet,
        vec: Vec<V>,
        len: usize, // number of elements
    }

    impl<V: Clone> T<V> {
        /// Create a new map with `sentinel` as an element to fill the underlying storage.
        ///
        /// It is best if `sentinel` is efficient to clone.
        pub fn new(sentinel: V) -> Self {
            T { sentinel, mem: BitSet::new(), vec: Vec::new(), len: 0, }
        }

        /// Access the given key
        pub fn get(&self, t: Term) -> Option<&V> {
            let i = t.0 as usize;
            if self.mem.contains(i) {
                debug_assert!(i < self.vec.len());
                Some(&self.vec[i])
            } else {
                None
            }
        }

        /// Access the given key, return a mutable reference to its value
        pub fn get_mut(&mut self, t: Term) -> Option<&mut V> {
            let i = t.0 as usize;
            if self.mem.contains(i) {
                debug_assert!(i < self.vec.len());
                Some(&mut self.vec[i])
            } else {
                None
            }
        }

        /// Does the map contain this key?
        pub fn contains(&self, t: Term) -> bool {
            let i = t.0 as usize;
            self.mem.contains(i)
        }

        /// Insert a value
        pub fn insert(&mut self, t: Term, v: V) {
            let i = t.0 as usize;
            let len = self.vec.len();
            // resize arrays if required
            if len <= i {
                self.vec.resize(i + 1, self.sentinel.clone());
            }
            debug_assert!(self.vec.len() > i);
            self.vec[i] = v;
            let is_new = self.mem.insert(i);
            if is_new {
                self.len += 1;
            }
        }

        /// Is the map empty?
        #[inline(always)]
        pub fn is_empty(&self) -> bool { self.len == 0 }

        /// Remove all bindings
        pub fn clear(&mut self) {
            self.len = 0;
            self.vec.clear();
            self.mem.clear();
        }

        /// Remove the given key
        pub fn remove(&mut self, t: Term) {
            let i = t.0 as usize;

            if self.mem.contains(i) {
                self.mem.remove(i);
                self.vec[i] = self.sentinel.clone();

                debug_assert!(self.len > 0);
                self.len -= 1;
            }
        }

        /// Number of elements
        #[inline(always)]
        pub fn len(&self) -> usize {
            self.len
        }

        /// Iterate over key/value pairs
        pub fn iter<'a>(&'a self) -> impl Iterator<Item = (Term, &'a V)> + 'a {
            self.vec.iter().enumerate().filter_map(move |(i, v)| {
                if self.mem.contains(i) {
                    let t = Term(i as u32);
                    Some((t, v))
                } else {
                    None
                }
            })
        }
    }
}

/// A map backed by a vector
///
/// We assume the existence of a `sentinel` value that is used to fill the
/// vector.
pub type DenseMap<V> = dense_map::T<V>;

// check that `Term` stays word-cheap
#[test]
fn test_size_term() {
    use std::mem;
    assert_eq!(mem::size_of::<Term>(), mem::size_of::<u32>());
}
