//! Solver backends
//!
//! - lp: `good_lp` with the pure-Rust minilp simplex (default)

pub mod lp;

pub use lp::*;
