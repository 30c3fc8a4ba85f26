//! Analyses and optimization passes (`spec.md` §4).
//!
//! Pass ordering and the SSA/classical mutual-exclusion rule live in
//! [`pipeline`]; every other module here is a single analysis or transform
//! operating on one [`crate::ir::Function`] at a time.

pub mod classical_scp;
pub mod dce;
pub mod dom_frontier;
pub mod dominance;
pub mod pipeline;
pub mod renumber;
pub mod ssa;
pub mod ssa_deconstruct;
pub mod ssa_licm;
pub mod ssa_scp;
