//! SSA de-construction (`spec.md` §4.9): lowers φs back to 3AC MOVEs in
//! predecessor blocks, then clears every SSA index in the function.
//!
//! Grounded in `examples/original_source/src/ssa.cpp`'s
//! `Program::ssa_to_3addr`: a φ operand that is still a `LOCAL` needs no
//! copy at all, since every SSA version of the same variable aliases the
//! same storage once SSA indices are erased; only a slot ssa-constant
//! propagation rewrote to a `CONST` needs an explicit MOVE, appended to
//! the owning predecessor just before its terminator
//! (`Function::append_before_terminator`) so it observes that
//! predecessor's final control flow.
//!
//! This materializes at most one MOVE per φ operand independently; it
//! does not break parallel-copy cycles (the classical swap problem when
//! two φs at the same block exchange values through a shared
//! predecessor). Neither does the source this is grounded on, which
//! assumes the lexical variables these reduce to are never live
//! simultaneously that way.

use crate::ir::{Function, Instruction, LocalID, Opcode, Operand};

/// Requires `func` to be in SSA form. Leaves every operand's SSA index at
/// [`crate::ir::NON_SSA`] and every φ cleared.
pub fn deconstruct(func: &mut Function) {
    let mut inserted = 0;
    for &b in &func.blocks.clone() {
        let vars: Vec<LocalID> = func.block(b).phis.keys().copied().collect();
        for v in vars {
            let phi = func.block(b).phis[&v].clone();
            if phi.is_cleared() {
                continue;
            }
            for i in 0..phi.r.len() {
                if phi.r[i].is_local() {
                    continue;
                }
                let pred = phi.pre[i].expect("a renamed phi has every predecessor slot filled in");
                let mv = func.alloc_inst(Instruction::new(-1, Opcode::Move, [phi.r[i].clone(), Operand::local(v)]));
                func.append_before_terminator(pred, mv);
                inserted += 1;
            }
            func.block_mut(b).phis.get_mut(&v).unwrap().clear();
        }
    }

    for &b in &func.blocks.clone() {
        for &inst_id in &func.block(b).insts.clone() {
            let arity = func.inst(inst_id).operands.len();
            for slot in 0..arity {
                func.inst_mut(inst_id).operand_mut(slot).unwrap().clear_ssa();
            }
        }
    }
    log::debug!("SSA de-construction materialized {inserted} predecessor move(s)");
}
