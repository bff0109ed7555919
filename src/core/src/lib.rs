
//! Term store with hashconsing.
//!
//! Terms are immutable, structurally unique values referred to via `Term`
//! handles; equality of handles is equality of terms.

extern crate bit_set;
extern crate fxhash;

pub mod term;

pub use crate::term::{
    Term,
    TermStore,
    View,
    DenseMap,
    TermMap,
    TermSet,
};
