//! Pass-pipeline orchestration (`spec.md` §5).
//!
//! Represents the requested optimization pipeline as a small ordered list
//! of pass tags (`spec.md` §6: "`-opt=<list>` ... Order is meaningful"),
//! rather than branching control flow, so the SSA/classical mutual-
//! exclusion precondition can be enforced in one place (§5: "the driver
//! must not run a classical pass after entering SSA (and vice versa)").

use crate::ir::{Function, Program};

/// One entry of a `-opt=` list (`spec.md` §6: "comma-separated subset of
/// `scp,dse,licm,ssa`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTag {
    /// Constant propagation; classical before `ssa`, SSA-based after.
    Scp,
    /// Dead/dead-store elimination (`opt::dce`), valid in either mode.
    Dse,
    /// SSA-based loop-invariant code motion; requires SSA already entered.
    Licm,
    /// Enters SSA form. At most one per function, and only from classical
    /// form.
    Ssa,
}

/// Runs `passes`, in order, over every function in `program`. Dominance,
/// natural loops, and dominance frontiers are (re)computed unconditionally
/// before the pass list runs (§5: "parse -> build dom -> ..." precedes
/// both the SSA and classical branches). A function that entered SSA form
/// is returned to 3AC via `ssa_deconstruct` once the pass list finishes,
/// before the driver renumbers and emits.
pub fn run(program: &mut Program, passes: &[PassTag]) {
    for &func_id in &program.funcs.clone() {
        run_function(program.func_mut(func_id), passes);
    }
}

fn run_function(func: &mut Function, passes: &[PassTag]) {
    crate::opt::dominance::compute(func);
    crate::opt::dom_frontier::compute(func);

    let mut in_ssa = false;
    for &tag in passes {
        match tag {
            PassTag::Ssa => {
                assert!(!in_ssa, "SSA-prepare must run at most once, and only from classical form (spec §5)");
                crate::opt::ssa::construct(func);
                in_ssa = true;
            }
            PassTag::Scp => {
                if in_ssa {
                    crate::opt::ssa_scp::propagate(func);
                } else {
                    crate::opt::classical_scp::propagate(func);
                }
            }
            PassTag::Dse => {
                crate::opt::dce::eliminate(func);
            }
            PassTag::Licm => {
                assert!(in_ssa, "LICM requires SSA-prepare to have already run (spec §5)");
                crate::opt::ssa_licm::hoist(func);
            }
        }
    }

    if in_ssa {
        crate::opt::ssa_deconstruct::deconstruct(func);
    }
}
