//! Dominator tree and natural-loop discovery (`spec.md` §4.2).
//!
//! `remusys-ir/src/opt/analysis/dominance.rs` computes dominators with
//! Semi-NCA over a DSU forest; here the classical iterative
//! set-intersection fixed point is used instead, so that part is rebuilt
//! from scratch, but the surrounding shape (mutate `Block::idom` / `domc` /
//! `df` in place, log a per-function summary) follows it.

use crate::base::SlabId;
use crate::ir::{BlockID, Function};
use std::collections::{HashMap, HashSet};

/// Computes `idom`/`domc` for every block and natural loops for every loop
/// header, writing both into `func` in place.
pub fn compute(func: &mut Function) {
    let blocks: Vec<BlockID> = func.order_iter().collect();
    let universe: HashSet<BlockID> = blocks.iter().copied().collect();
    let entry = func.entry;

    let mut dom: HashMap<BlockID, HashSet<BlockID>> = HashMap::new();
    dom.insert(entry, HashSet::from([entry]));
    for &b in &blocks {
        if b != entry {
            dom.insert(b, universe.clone());
        }
    }

    let mut changed = true;
    let mut iterations = 0;
    while changed {
        changed = false;
        iterations += 1;
        for &b in &blocks {
            if b == entry {
                continue;
            }
            let preds = &func.block(b).preds;
            let mut new_set: Option<HashSet<BlockID>> = None;
            for &p in preds {
                let pdom = &dom[&p];
                new_set = Some(match new_set {
                    None => pdom.clone(),
                    Some(acc) => acc.intersection(pdom).copied().collect(),
                });
            }
            let mut new_set = new_set.unwrap_or_default();
            new_set.insert(b);
            if new_set != dom[&b] {
                dom.insert(b, new_set);
                changed = true;
            }
        }
    }
    log::debug!("dominators converged after {iterations} iteration(s)");

    for &b in &blocks {
        func.block_mut(b).idom = None;
        func.block_mut(b).domc.clear();
    }
    for &b in &blocks {
        if b == entry {
            continue;
        }
        let candidates: Vec<BlockID> = dom[&b].iter().copied().filter(|&d| d != b).collect();
        let idom = candidates
            .iter()
            .copied()
            .find(|&m| !candidates.iter().any(|&m2| m2 != m && dom[&m2].contains(&m)));
        func.block_mut(b).idom = idom;
        if let Some(p) = idom {
            func.block_mut(p).domc.push(b);
        }
    }

    compute_natural_loops(func, &blocks, &dom);
}

fn compute_natural_loops(
    func: &mut Function,
    blocks: &[BlockID],
    dom: &HashMap<BlockID, HashSet<BlockID>>,
) {
    let mut tails_by_header: HashMap<BlockID, Vec<BlockID>> = HashMap::new();
    for &u in blocks {
        for v in func.block(u).successors() {
            if dom[&u].contains(&v) {
                tails_by_header.entry(v).or_default().push(u);
            }
        }
    }

    func.loops.clear();
    for (&header, tails) in &tails_by_header {
        let mut members: HashSet<BlockID> = HashSet::from([header]);
        let mut worklist: Vec<BlockID> = tails.clone();
        while let Some(n) = worklist.pop() {
            if members.insert(n) {
                worklist.extend(func.block(n).preds.iter().copied());
            }
        }
        let mut members: Vec<BlockID> = members.into_iter().collect();
        members.sort_by_key(|b| b.raw());
        func.loops.insert(header, members);
    }
}

/// Number of natural loops containing `block` (itself counts as contained
/// in a loop it heads), used by LICM's ascending-containment-count block
/// order (§4.6).
pub fn containment_count(func: &Function, block: BlockID) -> usize {
    func.loops.values().filter(|members| members.contains(&block)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn diamond_join_idom_is_branch_block() {
        let mut func = fixtures::diamond();
        compute(&mut func);
        let entry = func.entry;
        let join = fixtures::find_join(&func);
        assert_eq!(func.block(join).idom, Some(entry));
    }

    #[test]
    fn while_loop_header_dominates_its_own_body() {
        let mut func = fixtures::while_loop();
        compute(&mut func);
        assert_eq!(func.loops.len(), 1);
        let (&header, members) = func.loops.iter().next().unwrap();
        assert!(members.contains(&header));
        assert!(members.len() >= 2);
    }
}
