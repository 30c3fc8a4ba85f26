//! Dead code elimination (`spec.md` §4.8).
//!
//! A reverse data-flow liveness analysis over both SSA and classical form:
//! live-out/live-in sets of `(LOCAL, SSA)` pairs and REG identities, walked
//! backwards to a fixed point, followed by a single backward sweep that
//! erases any eliminable instruction (§6, `is_eliminable`) whose result is
//! never read. Every other instruction survives, including an eliminable
//! one already folded to NOP by an earlier pass (erasing a NOP is a no-op).

use crate::ir::{BlockID, Function, InstID, LocalID, Opcode, Operand};
use std::collections::{HashMap, HashSet};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Value {
    Local(LocalID, i32),
    Reg(InstID),
}

fn uses(inst_operands: &[Operand], skip_slot: Option<usize>) -> Vec<Value> {
    inst_operands
        .iter()
        .enumerate()
        .filter(|&(slot, _)| Some(slot) != skip_slot)
        .filter_map(|(_, op)| match op {
            Operand::Local { id, ssa } => Some(Value::Local(*id, *ssa)),
            Operand::Reg(r) => Some(Value::Reg(*r)),
            _ => None,
        })
        .collect()
}

fn skip_slot_for(opcode: Opcode) -> Option<usize> {
    (opcode == Opcode::Move).then_some(1)
}

/// Eliminates dead eliminable instructions to a fixed point. Returns the
/// count of instructions erased, split into `(in_loop, out_of_loop)` per
/// SPEC_FULL.md §C.6's elimination-count reporting.
pub fn eliminate(func: &mut Function) -> (usize, usize) {
    let mut total_in_loop = 0;
    let mut total_out_of_loop = 0;
    loop {
        let live_out = liveness(func);
        let (erased, in_loop, out_of_loop) = sweep(func, &live_out);
        total_in_loop += in_loop;
        total_out_of_loop += out_of_loop;
        if erased == 0 {
            break;
        }
    }
    log::debug!(
        "DCE erased {total_in_loop} in-loop and {total_out_of_loop} out-of-loop instruction(s)"
    );
    (total_in_loop, total_out_of_loop)
}

fn liveness(func: &Function) -> HashMap<BlockID, HashSet<Value>> {
    let mut live_in: HashMap<BlockID, HashSet<Value>> =
        func.blocks.iter().map(|&b| (b, HashSet::new())).collect();
    let mut live_out: HashMap<BlockID, HashSet<Value>> =
        func.blocks.iter().map(|&b| (b, HashSet::new())).collect();

    let mut changed = true;
    let mut rounds = 0;
    while changed {
        changed = false;
        rounds += 1;
        for &b in func.blocks.iter().rev() {
            let mut out: HashSet<Value> = HashSet::new();
            for s in func.block(b).successors() {
                out.extend(live_in[&s].iter().cloned());
                for (&v, phi) in &func.block(s).phis {
                    if phi.is_cleared() {
                        continue;
                    }
                    if let Some(i) = func.block(s).pred_index(b) {
                        if let Operand::Local { id, ssa } = phi.r[i] {
                            out.insert(Value::Local(id, ssa));
                        } else if let Operand::Reg(r) = phi.r[i] {
                            out.insert(Value::Reg(r));
                        }
                    }
                    let _ = v;
                }
            }
            if out != live_out[&b] {
                live_out.insert(b, out.clone());
                changed = true;
            }

            let mut cur = out;
            for &inst_id in func.block(b).insts.iter().rev() {
                let inst = func.inst(inst_id);
                let dest = match inst.opcode {
                    Opcode::Move => inst.move_dest_local().zip(inst.move_dest_ssa()).map(|(id, ssa)| Value::Local(id, ssa)),
                    _ if inst.opcode.is_eliminable() => Some(Value::Reg(inst_id)),
                    _ => None,
                };
                if let Some(d) = &dest {
                    cur.remove(d);
                }
                for u in uses(&inst.operands, skip_slot_for(inst.opcode)) {
                    cur.insert(u);
                }
            }
            if cur != live_in[&b] {
                live_in.insert(b, cur);
                changed = true;
            }
        }
    }
    log::debug!("liveness converged after {rounds} round(s)");
    live_out
}

fn sweep(func: &mut Function, live_out: &HashMap<BlockID, HashSet<Value>>) -> (usize, usize, usize) {
    let mut erased = 0;
    let mut in_loop = 0;
    let mut out_of_loop = 0;
    for &b in &func.blocks.clone() {
        let mut cur = live_out[&b].clone();
        let insts = func.block(b).insts.clone();
        for &inst_id in insts.iter().rev() {
            let opcode = func.inst(inst_id).opcode;
            if !opcode.is_eliminable() {
                continue;
            }
            let is_move = opcode == Opcode::Move;
            let dest = if is_move {
                func.inst(inst_id).move_dest_local().zip(func.inst(inst_id).move_dest_ssa()).map(|(id, ssa)| Value::Local(id, ssa))
            } else {
                Some(Value::Reg(inst_id))
            };
            let Some(d) = dest else { continue };
            if !cur.contains(&d) {
                if !func.inst(inst_id).is_nop() {
                    func.inst_mut(inst_id).erase_to_nop();
                    erased += 1;
                    if crate::opt::dominance::containment_count(func, b) > 0 {
                        in_loop += 1;
                    } else {
                        out_of_loop += 1;
                    }
                }
            } else {
                cur.remove(&d);
                for u in uses(&func.inst(inst_id).operands, skip_slot_for(opcode)) {
                    cur.insert(u);
                }
            }
        }
    }
    (erased, in_loop, out_of_loop)
}
