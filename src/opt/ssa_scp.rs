//! SSA-based constant propagation and folding (`spec.md` §4.5).
//!
//! Grounded in `examples/original_source/src/ssa.cpp`'s
//! `Function::ssa_constant_propagate`: a fixed point over φs and
//! instructions, tracking known constants keyed by SSA-local version and by
//! instruction ("REG") identity.

use crate::ir::{Function, InstID, LocalID, Opcode, Operand};
use std::collections::HashMap;

/// Runs SSA constant propagation/folding to a fixed point. Requires `func`
/// to already be in SSA form ([`crate::opt::ssa::construct`]).
pub fn propagate(func: &mut Function) {
    let mut const_locals: HashMap<(LocalID, i32), i64> = HashMap::new();
    let mut const_regs: HashMap<InstID, i64> = HashMap::new();
    let mut changed = true;
    let mut rounds = 0;
    let mut folded = 0;

    while changed {
        changed = false;
        rounds += 1;
        for &b in &func.blocks.clone() {
            changed |= propagate_phis(func, b, &mut const_locals);
            let (block_changed, block_folded) =
                propagate_insts(func, b, &mut const_locals, &mut const_regs);
            changed |= block_changed;
            folded += block_folded;
        }
    }
    log::debug!("SSA constant propagation converged after {rounds} round(s), folded {folded} instruction(s)");
}

fn propagate_phis(
    func: &mut Function,
    b: crate::ir::BlockID,
    const_locals: &mut HashMap<(LocalID, i32), i64>,
) -> bool {
    let mut changed = false;
    let vars: Vec<LocalID> = func.block(b).phis.keys().copied().collect();
    for v in vars {
        if func.block(b).phis[&v].is_cleared() {
            continue;
        }
        let count = func.block(b).phis[&v].r.len();
        for i in 0..count {
            if let Operand::Local { id, ssa } = func.block(b).phis[&v].r[i] {
                if let Some(&val) = const_locals.get(&(id, ssa)) {
                    func.block_mut(b).phis.get_mut(&v).unwrap().r[i] = Operand::const_value(val);
                    changed = true;
                }
            }
        }
        if let Some(val) = func.block(b).phis[&v].as_agreeing_const() {
            let l = func.block(b).phis[&v].l;
            const_locals.insert((v, l), val);
            func.block_mut(b).phis.get_mut(&v).unwrap().clear();
            changed = true;
        }
    }
    changed
}

fn propagate_insts(
    func: &mut Function,
    b: crate::ir::BlockID,
    const_locals: &mut HashMap<(LocalID, i32), i64>,
    const_regs: &mut HashMap<InstID, i64>,
) -> (bool, usize) {
    let mut changed = false;
    let mut folded = 0;
    for &inst_id in &func.block(b).insts.clone() {
        let opcode = func.inst(inst_id).opcode;
        if opcode == Opcode::Nop {
            continue;
        }
        let arity = func.inst(inst_id).operands.len();
        let is_move = opcode == Opcode::Move;

        for slot in 0..arity {
            if is_move && slot == 1 {
                continue;
            }
            let op = func.inst(inst_id).operand(slot).cloned().unwrap();
            let replacement = match op {
                Operand::Local { id, ssa } => const_locals.get(&(id, ssa)).copied(),
                Operand::Reg(r) => const_regs.get(&r).copied(),
                _ => None,
            };
            if let Some(val) = replacement {
                *func.inst_mut(inst_id).operand_mut(slot).unwrap() = Operand::const_value(val);
                changed = true;
            }
        }

        if !is_foldable(opcode) {
            continue;
        }
        let rhs_slots: &[usize] = if is_move { &[0] } else { &[0, 1] };
        let rhs_slots = &rhs_slots[..arity.min(rhs_slots.len())];
        let vals: Option<Vec<i64>> =
            rhs_slots.iter().map(|&s| func.inst(inst_id).operand(s).and_then(Operand::as_const)).collect();
        let Some(vals) = vals else { continue };
        let Some(result) = fold(opcode, &vals) else { continue };

        const_regs.insert(inst_id, result);
        if is_move {
            if let (Some(local), Some(ssa)) =
                (func.inst(inst_id).move_dest_local(), func.inst(inst_id).move_dest_ssa())
            {
                const_locals.insert((local, ssa), result);
            }
        }
        func.inst_mut(inst_id).erase_to_nop();
        changed = true;
        folded += 1;
    }
    (changed, folded)
}

fn is_foldable(op: Opcode) -> bool {
    use Opcode::*;
    matches!(op, Add | Sub | Mul | Div | Mod | Neg | CmpEq | CmpLe | CmpLt | Move)
}

/// Folds a foldable opcode's RHS constants. Returns `None` when the result
/// is unspecified at the IR level (division/modulo by zero), per §4.5 and
/// §7; overflow wraps per target integer semantics and is never refused.
fn fold(op: Opcode, vals: &[i64]) -> Option<i64> {
    use Opcode::*;
    Some(match op {
        Add => vals[0].wrapping_add(vals[1]),
        Sub => vals[0].wrapping_sub(vals[1]),
        Mul => vals[0].wrapping_mul(vals[1]),
        Div => {
            if vals[1] == 0 {
                return None;
            }
            vals[0].wrapping_div(vals[1])
        }
        Mod => {
            if vals[1] == 0 {
                return None;
            }
            vals[0].wrapping_rem(vals[1])
        }
        Neg => vals[0].wrapping_neg(),
        CmpEq => (vals[0] == vals[1]) as i64,
        CmpLe => (vals[0] <= vals[1]) as i64,
        CmpLt => (vals[0] < vals[1]) as i64,
        Move => vals[0],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction;
    use crate::opt::{dom_frontier, dominance, ssa};
    use crate::testing::fixtures;

    #[test]
    fn folds_a_constant_binary_op() {
        let mut func = Function::new(0, 0, true);
        let b = func.alloc_block();
        func.entry = b;
        func.blocks = vec![b];
        let add = func.alloc_inst(Instruction::new(
            1,
            Opcode::Add,
            [Operand::const_value(2), Operand::const_value(3)],
        ));
        let x = func.intern_local("x", -8);
        let mv = func.alloc_inst(Instruction::new(2, Opcode::Move, [Operand::Reg(add), Operand::local(x)]));
        func.block_mut(b).insts = vec![add, mv];
        propagate(&mut func);
        assert!(func.inst(add).is_nop());
        assert_eq!(func.inst(mv).operand(0).unwrap().as_const(), Some(5));
    }

    #[test]
    fn agreeing_phi_operands_become_a_constant_and_clear() {
        let mut func = fixtures::diamond();
        dominance::compute(&mut func);
        dom_frontier::compute(&mut func);
        ssa::construct(&mut func);
        // The diamond fixture writes 1 and 2 down the two arms, so the
        // join's phi does not agree; overwrite both arms with the same
        // constant to exercise the agreeing-operand path.
        let join = fixtures::find_join(&func);
        let (&v, _) = func.block(join).phis.iter().next().unwrap();
        for &b in &func.blocks.clone() {
            for &inst_id in &func.block(b).insts.clone() {
                if func.inst(inst_id).move_dest_local() == Some(v) {
                    *func.inst_mut(inst_id).operand_mut(0).unwrap() = Operand::const_value(7);
                }
            }
        }
        propagate(&mut func);
        assert!(func.block(join).phis[&v].is_cleared());
    }
}
