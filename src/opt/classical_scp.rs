//! Classical (non-SSA) constant propagation via reaching definitions
//! (`spec.md` §4.7).
//!
//! A two-stage analysis: stage 1 is a standard forward reaching-definitions
//! dataflow fixed point (a "definition" is a `(variable, defining MOVE)`
//! pair; a use with no reaching definition is implicitly an argument value
//! flowing from `ENTER`, and is never constant). Stage 2 repeatedly
//! substitutes uses whose reaching definitions all agree on one constant,
//! and folds instructions whose operands have all become constant, without
//! erasing them — that is DCE's job (§4.8), run after this pass.

use crate::ir::{BlockID, Function, InstID, LocalID, Opcode, Operand};
use std::collections::{HashMap, HashSet};

type Def = (LocalID, InstID);

/// Runs reaching-definitions constant propagation on a non-SSA function.
pub fn propagate(func: &mut Function) {
    let (gen, kill) = build_gen_kill(func);
    let in_sets = reaching_definitions(func, &gen, &kill);
    let substitutions = fold_to_fixpoint(func, &in_sets);
    log::debug!("classical constant propagation substituted {substitutions} operand(s)");
}

fn build_gen_kill(func: &Function) -> (HashMap<BlockID, HashSet<Def>>, HashMap<BlockID, HashSet<Def>>) {
    let mut all_defs_by_var: HashMap<LocalID, Vec<InstID>> = HashMap::new();
    for &b in &func.blocks {
        for &inst_id in &func.block(b).insts {
            if let Some(local) = func.inst(inst_id).move_dest_local() {
                all_defs_by_var.entry(local).or_default().push(inst_id);
            }
        }
    }

    let mut gen = HashMap::new();
    let mut kill = HashMap::new();
    for &b in &func.blocks {
        let mut last_move: HashMap<LocalID, InstID> = HashMap::new();
        for &inst_id in &func.block(b).insts {
            if let Some(local) = func.inst(inst_id).move_dest_local() {
                last_move.insert(local, inst_id);
            }
        }
        let gen_b: HashSet<Def> = last_move.iter().map(|(&v, &d)| (v, d)).collect();
        let mut kill_b: HashSet<Def> = HashSet::new();
        for (&v, &surviving) in &last_move {
            for &d in &all_defs_by_var[&v] {
                if d != surviving {
                    kill_b.insert((v, d));
                }
            }
        }
        gen.insert(b, gen_b);
        kill.insert(b, kill_b);
    }
    (gen, kill)
}

fn reaching_definitions(
    func: &Function,
    gen: &HashMap<BlockID, HashSet<Def>>,
    kill: &HashMap<BlockID, HashSet<Def>>,
) -> HashMap<BlockID, HashSet<Def>> {
    let mut in_sets: HashMap<BlockID, HashSet<Def>> = func.blocks.iter().map(|&b| (b, HashSet::new())).collect();
    let mut out_sets: HashMap<BlockID, HashSet<Def>> = func.blocks.iter().map(|&b| (b, HashSet::new())).collect();

    let mut changed = true;
    let mut rounds = 0;
    while changed {
        changed = false;
        rounds += 1;
        for &b in &func.blocks {
            let mut new_in: HashSet<Def> = HashSet::new();
            for &p in &func.block(b).preds {
                new_in.extend(out_sets[&p].iter().copied());
            }
            if new_in != in_sets[&b] {
                in_sets.insert(b, new_in);
                changed = true;
            }
            let mut new_out = gen[&b].clone();
            for d in &in_sets[&b] {
                if !kill[&b].contains(d) {
                    new_out.insert(*d);
                }
            }
            if new_out != out_sets[&b] {
                out_sets.insert(b, new_out);
                changed = true;
            }
        }
    }
    log::debug!("reaching definitions converged after {rounds} round(s)");
    in_sets
}

fn fold_to_fixpoint(func: &mut Function, in_sets: &HashMap<BlockID, HashSet<Def>>) -> usize {
    let mut const_of_def: HashMap<InstID, i64> = HashMap::new();
    let mut substitutions = 0;
    let mut changed = true;
    while changed {
        changed = false;
        for &b in &func.blocks.clone() {
            let mut reaching: HashMap<LocalID, HashSet<InstID>> = HashMap::new();
            for &(v, d) in &in_sets[&b] {
                reaching.entry(v).or_default().insert(d);
            }

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
                        Operand::Local { id, .. } => reaching.get(&id).and_then(|defs| {
                            if defs.is_empty() {
                                return None;
                            }
                            let mut vals = defs.iter().map(|d| const_of_def.get(d).copied());
                            let first = vals.next().flatten()?;
                            vals.all(|v| v == Some(first)).then_some(first)
                        }),
                        Operand::Reg(r) => const_of_def.get(&r).copied(),
                        _ => None,
                    };
                    if let Some(val) = replacement {
                        if func.inst(inst_id).operand(slot).and_then(Operand::as_const) != Some(val) {
                            *func.inst_mut(inst_id).operand_mut(slot).unwrap() = Operand::const_value(val);
                            changed = true;
                            substitutions += 1;
                        }
                    }
                }

                if is_foldable(opcode) {
                    let rhs_slots: &[usize] = if is_move { &[0] } else { &[0, 1] };
                    let rhs_slots = &rhs_slots[..arity.min(rhs_slots.len())];
                    let vals: Option<Vec<i64>> = rhs_slots
                        .iter()
                        .map(|&s| func.inst(inst_id).operand(s).and_then(Operand::as_const))
                        .collect();
                    if let Some(vals) = vals {
                        if let Some(result) = fold(opcode, &vals) {
                            if const_of_def.get(&inst_id) != Some(&result) {
                                const_of_def.insert(inst_id, result);
                                changed = true;
                            }
                        }
                    }
                }

                if let Some(local) = func.inst(inst_id).move_dest_local() {
                    reaching.insert(local, HashSet::from([inst_id]));
                }
            }
        }
    }
    substitutions
}

fn is_foldable(op: Opcode) -> bool {
    use Opcode::*;
    matches!(op, Add | Sub | Mul | Div | Mod | Neg | CmpEq | CmpLe | CmpLt | Move)
}

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
