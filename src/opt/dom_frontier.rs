//! Dominance frontier computation (`spec.md` §4.3): a post-order walk of
//! the dominator tree, each block's frontier built from its CFG successors
//! and its dominator-tree children's already-computed frontiers.

use crate::base::SlabId;
use crate::ir::{BlockID, Function};
use std::collections::HashSet;

/// Computes `Block::df` for every block, assuming [`crate::opt::dominance::compute`]
/// has already populated `idom`/`domc`.
pub fn compute(func: &mut Function) {
    let order = postorder(func);
    for b in order {
        let mut df: HashSet<BlockID> = HashSet::new();
        for s in func.block(b).successors() {
            if func.block(s).idom != Some(b) {
                df.insert(s);
            }
        }
        for c in func.block(b).domc.clone() {
            for w in func.block(c).df.clone() {
                if func.block(w).idom != Some(b) {
                    df.insert(w);
                }
            }
        }
        let mut df: Vec<BlockID> = df.into_iter().collect();
        df.sort_by_key(|b| b.raw());
        func.block_mut(b).df = df;
    }
}

fn postorder(func: &Function) -> Vec<BlockID> {
    let mut order = Vec::new();
    let mut stack = vec![(func.entry, false)];
    while let Some((b, expanded)) = stack.pop() {
        if expanded {
            order.push(b);
            continue;
        }
        stack.push((b, true));
        for &c in &func.block(b).domc {
            stack.push((c, false));
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opt::dominance;
    use crate::testing::fixtures;

    #[test]
    fn diamond_entry_is_in_no_frontier_but_join_is_in_branches() {
        let mut func = fixtures::diamond();
        dominance::compute(&mut func);
        compute(&mut func);
        let join = fixtures::find_join(&func);
        for &b in &func.blocks {
            if b == func.entry || b == join {
                continue;
            }
            assert_eq!(func.block(b).df, vec![join]);
        }
        assert!(func.block(func.entry).df.is_empty());
    }

    #[test]
    fn loop_header_is_in_its_own_frontier() {
        let mut func = fixtures::while_loop();
        dominance::compute(&mut func);
        compute(&mut func);
        let (&header, _) = func.loops.iter().next().unwrap();
        let body = func
            .blocks
            .iter()
            .copied()
            .find(|&b| func.block(b).preds.len() == 1 && func.block(b).br_next.is_some())
            .unwrap();
        assert!(func.block(body).df.contains(&header));
    }
}
