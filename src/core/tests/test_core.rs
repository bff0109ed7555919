
#[macro_use] extern crate proptest;
extern crate batrw_core;

use {
    batrw_core::*,
    proptest::{prelude::*, test_runner::Config},
};

mod test_store {
    use super::*;

    #[test]
    fn test_mk_const() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        assert_ne!(a, b);
        let a2 = m.mk_const("a");
        assert_ne!(a, a2);
    }

    #[test]
    fn test_view_const() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        assert!(match m.view(a) { View::Const(s) => s == "a", _ => false });
        assert!(match m.view(b) { View::Const(s) => s == "b", _ => false });
        assert!(m.is_const(a));
        assert!(!m.is_app(a));
        assert!(!m.is_idx(a));
    }

    #[test]
    fn test_mk_app() {
        let mut m = TermStore::new();
        let f = m.mk_const("f");
        let g = m.mk_const("g");
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        let t1 = m.mk_app(f, &[a, b]);
        let t2 = m.mk_app(f, &[a, b]);
        let t3 = m.mk_app(f, &[b, a]);
        let t4 = m.mk_app(g, &[t1]);
        let t5 = m.mk_app(g, &[t2]);
        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
        assert_ne!(t2, t3);
        assert_eq!(t4, t5);

        // identity must hold on both sides of the small-application threshold
        let t10 = m.mk_app(f, &[a; 10]);
        let t11 = m.mk_app(f, &[a; 10]);
        let t12 = m.mk_app(f, &[b; 10]);
        assert_eq!(t10, t11);
        assert_ne!(t10, t12);
    }

    #[test]
    fn test_mk_app_empty_is_f() {
        let mut m = TermStore::new();
        let f = m.mk_const("f");
        assert_eq!(f, m.mk_app(f, &[]));
    }

    #[test]
    fn test_view_app() {
        let mut m = TermStore::new();
        let f = m.mk_const("f");
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        let t = m.mk_app(f, &[a, b]);
        match m.view(t) {
            View::App { f: f2, args } => {
                assert_eq!(f, f2);
                assert_eq!(args, &[a, b]);
            },
            _ => panic!("expected an application"),
        }
    }

    #[test]
    fn test_mk_idx() {
        let mut m = TermStore::new();
        let x = m.mk_idx(3);
        let y = m.mk_idx(3);
        let z = m.mk_idx(4);
        assert_eq!(x, y);
        assert_ne!(x, z);
        assert!(m.is_idx(x));
        assert!(match m.view(x) { View::Idx(i) => i == 3, _ => false });
    }

    #[test]
    fn test_handles_follow_insertion_order() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        let t = m.mk_app(a, &[b]);
        assert!(a < b);
        assert!(b < t);
    }

    #[test]
    fn test_n_terms() {
        let mut m = TermStore::new();
        let n0 = m.n_terms();
        let f = m.mk_const("f");
        let a = m.mk_const("a");
        let t = m.mk_app(f, &[a]);
        assert_eq!(n0 + 3, m.n_terms());
        // hashconsed, no growth
        let t2 = m.mk_app(f, &[a]);
        assert_eq!(t, t2);
        assert_eq!(n0 + 3, m.n_terms());
    }
}

mod test_dense_map {
    use super::*;

    #[test]
    fn test_insert_get() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        let c = m.mk_const("c");

        let mut map: DenseMap<Term> = DenseMap::new(Term::SENTINEL);
        assert!(map.is_empty());
        map.insert(a, c);
        map.insert(b, a);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(a), Some(&c));
        assert_eq!(map.get(b), Some(&a));
        assert_eq!(map.get(c), None);
        assert!(map.contains(a));
        assert!(!map.contains(c));
    }

    #[test]
    fn test_overwrite_keeps_len() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");

        let mut map: DenseMap<Term> = DenseMap::new(Term::SENTINEL);
        map.insert(a, a);
        map.insert(a, b);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(a), Some(&b));
    }

    #[test]
    fn test_remove() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");

        let mut map: DenseMap<Term> = DenseMap::new(Term::SENTINEL);
        map.insert(a, b);
        map.insert(b, a);
        map.remove(a);
        assert_eq!(map.get(a), None);
        assert_eq!(map.get(b), Some(&a));
        assert_eq!(map.len(), 1);
        // removing twice is a no-op
        map.remove(a);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");

        let mut map: DenseMap<u32> = DenseMap::new(0);
        map.insert(a, 1);
        if let Some(v) = map.get_mut(a) { *v = 5 }
        assert_eq!(map.get(a), Some(&5));
        assert_eq!(map.get_mut(b), None);
    }

    #[test]
    fn test_iter() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let b = m.mk_const("b");
        let c = m.mk_const("c");

        let mut map: DenseMap<Term> = DenseMap::new(Term::SENTINEL);
        map.insert(a, b);
        map.insert(c, a);
        let mut pairs: Vec<(Term, Term)> = map.iter().map(|(t, &v)| (t, v)).collect();
        pairs.sort();
        assert_eq!(pairs, vec![(a, b), (c, a)]);
    }

    #[test]
    fn test_clear() {
        let mut m = TermStore::new();
        let a = m.mk_const("a");
        let mut map: DenseMap<Term> = DenseMap::new(Term::SENTINEL);
        map.insert(a, a);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(a), None);
    }
}

mod store_prop {
    use super::*;

    /// Term structure described independently of the store, so the same
    /// structure can be interned several times.
    #[derive(Clone, Debug)]
    enum Shape {
        Leaf(usize),
        Node(usize, Vec<Shape>),
    }

    fn shape() -> impl Strategy<Value = Shape> {
        let leaf = (0..6usize).prop_map(Shape::Leaf);
        leaf.prop_recursive(4, 32, 5, |inner| {
            (0..6usize, prop::collection::vec(inner, 1..5))
                .prop_map(|(f, args)| Shape::Node(f, args))
        })
    }

    fn build(m: &mut TermStore, atoms: &[Term], s: &Shape) -> Term {
        match s {
            Shape::Leaf(i) => atoms[*i % atoms.len()],
            Shape::Node(f, args) => {
                let f = atoms[*f % atoms.len()];
                let args: Vec<Term> = args.iter().map(|a| build(m, atoms, a)).collect();
                m.mk_app(f, &args)
            }
        }
    }

    proptest! {
        #![proptest_config(Config::with_cases(100))]

        #[test]
        fn prop_hashcons_identity(s in shape()) {
            let mut m = TermStore::new();
            let atoms: Vec<Term> =
                (0..6).map(|i| m.mk_const(&format!("c{}", i))).collect();
            let t1 = build(&mut m, &atoms, &s);
            let t2 = build(&mut m, &atoms, &s);
            prop_assert_eq!(t1, t2);
        }

        #[test]
        fn prop_idx_identity(i in 0u32..10_000) {
            let mut m = TermStore::new();
            let a = m.mk_idx(i);
            let b = m.mk_idx(i);
            prop_assert_eq!(a, b);
            prop_assert_ne!(a, m.mk_idx(i + 1));
        }
    }
}
