//! Solution Analytics
//!
//! Derived metrics computed from a solved flow graph and the route table,
//! plus the baseline comparison used by the scenario engine.

pub mod comparison;
pub mod metrics;
pub mod resilience;

pub use comparison::*;
pub use metrics::*;
pub use resilience::*;
