//! SSA construction (`spec.md` §4.4): def-site collection, iterated-
//! dominance-frontier φ-placement, and dominator-tree rename.
//!
//! Grounded in the alloca-to-SSA promotion of
//! `remusys-ir/src/opt/transforms/mem2reg.rs` (`InsertPhi` + `Rename`),
//! which uses the same DF-worklist-then-dominator-preorder shape, adapted
//! here from typed `alloca`/`load`/`store` values to this IR's untagged
//! `LOCAL` operand slots.
//!
//! Requires [`crate::opt::dominance::compute`] and
//! [`crate::opt::dom_frontier::compute`] to have already run.

use crate::base::SlabId;
use crate::ir::{BlockID, Function, LocalID, Operand, Opcode, Phi};
use std::collections::{HashMap, HashSet};

/// Runs def-site collection, φ-placement, and renaming in sequence,
/// putting `func` into SSA form.
pub fn construct(func: &mut Function) {
    collect_defs(func);
    place_phis(func);
    rename(func);
}

fn collect_defs(func: &mut Function) {
    for &b in &func.blocks.clone() {
        let insts = func.block(b).insts.clone();
        let mut defs = HashSet::new();
        for inst_id in insts {
            if let Some(local) = func.inst(inst_id).move_dest_local() {
                defs.insert(local);
            }
        }
        func.block_mut(b).defs = defs;
    }
}

fn all_locals(func: &Function) -> Vec<LocalID> {
    func.locals.iter().map(|(raw, _)| LocalID::from_raw(raw)).collect()
}

/// Iterated dominance-frontier φ-placement (`spec.md` §4.4).
fn place_phis(func: &mut Function) {
    for v in all_locals(func) {
        let defsites: Vec<BlockID> =
            func.blocks.iter().copied().filter(|&b| func.block(b).defs.contains(&v)).collect();
        if defsites.is_empty() {
            continue;
        }
        let defsite_set: HashSet<BlockID> = defsites.iter().copied().collect();
        let mut has_phi: HashSet<BlockID> = HashSet::new();
        let mut worklist = defsites;
        while let Some(b) = worklist.pop() {
            for d in func.block(b).df.clone() {
                if has_phi.insert(d) {
                    let preds_len = func.block(d).preds.len();
                    func.block_mut(d).phis.insert(v, Phi::with_capacity(preds_len));
                    if !defsite_set.contains(&d) {
                        worklist.push(d);
                    }
                }
            }
        }
    }
}

fn fresh(counters: &mut HashMap<LocalID, i32>, v: LocalID) -> i32 {
    let c = counters.entry(v).or_insert(0);
    *c += 1;
    *c
}

/// Dominator-tree pre-order rename (`spec.md` §4.4 "Renaming").
fn rename(func: &mut Function) {
    let locals = all_locals(func);
    let mut stacks: HashMap<LocalID, Vec<i32>> = locals.iter().map(|&v| (v, vec![0])).collect();
    let mut counters: HashMap<LocalID, i32> = locals.iter().map(|&v| (v, 0)).collect();
    rename_block(func, func.entry, &mut stacks, &mut counters);
}

fn rename_block(
    func: &mut Function,
    b: BlockID,
    stacks: &mut HashMap<LocalID, Vec<i32>>,
    counters: &mut HashMap<LocalID, i32>,
) {
    let mut pushed_here: Vec<LocalID> = Vec::new();

    // Step 1: every phi in the block gets a fresh index for its result.
    let phi_vars: Vec<LocalID> = func.block(b).phis.keys().copied().collect();
    for v in phi_vars {
        let idx = fresh(counters, v);
        stacks.get_mut(&v).unwrap().push(idx);
        pushed_here.push(v);
        func.block_mut(b).phis.get_mut(&v).unwrap().l = idx;
    }

    // Step 2: walk instructions in order, reads before the MOVE's write.
    let insts = func.block(b).insts.clone();
    for inst_id in insts {
        let opcode = func.inst(inst_id).opcode;
        let arity = func.inst(inst_id).operands.len();
        for slot in 0..arity {
            if opcode == Opcode::Move && slot == 1 {
                continue;
            }
            let local = func.inst(inst_id).operand(slot).and_then(Operand::as_local);
            if let Some(id) = local {
                let top = *stacks[&id].last().unwrap();
                func.inst_mut(inst_id).operand_mut(slot).unwrap().set_ssa(top);
            }
        }
        if opcode == Opcode::Move {
            if let Some(dest) = func.inst(inst_id).move_dest_local() {
                let idx = fresh(counters, dest);
                stacks.get_mut(&dest).unwrap().push(idx);
                pushed_here.push(dest);
                func.inst_mut(inst_id).operand_mut(1).unwrap().set_ssa(idx);
            }
        }
    }

    // Step 3: feed this block's current values into every successor's phis.
    let successors: Vec<BlockID> =
        [func.block(b).seq_next, func.block(b).br_next].into_iter().flatten().collect();
    for s in successors {
        let i = func.block(s).pred_index(b).expect("rename walks edges in CFG order");
        let phi_vars: Vec<LocalID> = func.block(s).phis.keys().copied().collect();
        for v in phi_vars {
            let top = *stacks[&v].last().unwrap();
            let phi = func.block_mut(s).phis.get_mut(&v).unwrap();
            phi.r[i] = Operand::Local { id: v, ssa: top };
            phi.pre[i] = Some(b);
        }
    }

    // Step 4: recurse into dominator-tree children.
    for c in func.block(b).domc.clone() {
        rename_block(func, c, stacks, counters);
    }

    // Step 5: pop everything this invocation pushed.
    for v in pushed_here {
        stacks.get_mut(&v).unwrap().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opt::{dom_frontier, dominance};
    use crate::testing::fixtures;

    #[test]
    fn diamond_join_gets_a_phi_for_x() {
        let mut func = fixtures::diamond();
        dominance::compute(&mut func);
        dom_frontier::compute(&mut func);
        construct(&mut func);
        let join = fixtures::find_join(&func);
        assert_eq!(func.block(join).phis.len(), 1);
        let (_, phi) = func.block(join).phis.iter().next().unwrap();
        assert_eq!(phi.r.len(), 2);
        assert!(phi.pre.iter().all(Option::is_some));
    }

    #[test]
    fn every_move_gets_a_distinct_ssa_version() {
        let mut func = fixtures::diamond();
        dominance::compute(&mut func);
        dom_frontier::compute(&mut func);
        construct(&mut func);
        let mut versions = HashSet::new();
        for &b in &func.blocks.clone() {
            for &inst_id in &func.block(b).insts.clone() {
                if let Some(ssa) = func.inst(inst_id).move_dest_ssa() {
                    assert!(versions.insert(ssa), "duplicate SSA version assigned");
                }
            }
        }
    }
}
