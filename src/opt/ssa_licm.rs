//! SSA-based loop-invariant code motion (`spec.md` §4.6).
//!
//! Grounded in `examples/original_source/src/ssa.cpp`'s
//! `Function::ssa_licm`, `calc_oper2block`, and `calc_loop_order`: a
//! producer map keyed by SSA-local/REG identity, blocks visited in
//! ascending loop-containment-count order (SPEC_FULL.md §C.5), and a
//! dominator-tree climb per candidate instruction that stops at the first
//! invalid enclosing loop.

use crate::ir::{BlockID, Function, InstID, LocalID, Operand};
use std::collections::HashMap;

/// Hoists loop-invariant, eliminable instructions into newly materialized
/// loop pre-headers. Requires `func` to be in SSA form with dominance and
/// natural-loop information already computed.
pub fn hoist(func: &mut Function) {
    let (local_producer, inst_block) = build_producer_maps(func);

    let mut order: Vec<BlockID> = func.blocks.clone();
    order.sort_by_key(|&b| crate::opt::dominance::containment_count(func, b));

    let mut pending: HashMap<BlockID, Vec<InstID>> = HashMap::new();
    let mut hoisted = 0;

    for b in order {
        if crate::opt::dominance::containment_count(func, b) == 0 {
            continue;
        }
        for &inst_id in &func.block(b).insts.clone() {
            let opcode = func.inst(inst_id).opcode;
            if !opcode.is_eliminable() {
                continue;
            }
            let producer_blocks: Vec<BlockID> = func
                .inst(inst_id)
                .operands
                .iter()
                .filter_map(|op| producer_block(op, &local_producer, &inst_block))
                .collect();

            if let Some(target) = find_hoist_target(func, b, &producer_blocks) {
                pending.entry(target).or_default().push(inst_id);
                func.block_mut(b).insts.retain(|&i| i != inst_id);
                hoisted += 1;
            }
        }
    }

    let loop_count = pending.len();
    for (header, insts) in pending {
        materialize_preheader(func, header, insts);
    }
    log::debug!("LICM hoisted {hoisted} instruction(s) into {loop_count} pre-header(s)");
}

fn build_producer_maps(
    func: &Function,
) -> (HashMap<(LocalID, i32), BlockID>, HashMap<InstID, BlockID>) {
    let mut local_producer = HashMap::new();
    let mut inst_block = HashMap::new();
    for &b in &func.blocks {
        for (&v, phi) in &func.block(b).phis {
            if !phi.is_cleared() {
                local_producer.insert((v, phi.l), b);
            }
        }
        for &inst_id in &func.block(b).insts {
            inst_block.insert(inst_id, b);
            if let (Some(local), Some(ssa)) =
                (func.inst(inst_id).move_dest_local(), func.inst(inst_id).move_dest_ssa())
            {
                local_producer.insert((local, ssa), b);
            }
        }
    }
    (local_producer, inst_block)
}

fn producer_block(
    op: &Operand,
    local_producer: &HashMap<(LocalID, i32), BlockID>,
    inst_block: &HashMap<InstID, BlockID>,
) -> Option<BlockID> {
    match op {
        Operand::Local { id, ssa } => local_producer.get(&(*id, *ssa)).copied(),
        Operand::Reg(r) => inst_block.get(r).copied(),
        _ => None,
    }
}

/// Climbs the dominator tree from `start`, testing each loop header in
/// turn; a loop is valid iff no operand producer lives inside it. Stops at
/// the first invalid loop, since its membership is a subset of every
/// enclosing loop's (§4.6: "the outermost such loop header ... determines
/// the target").
fn find_hoist_target(func: &Function, start: BlockID, producer_blocks: &[BlockID]) -> Option<BlockID> {
    let mut best = None;
    let mut cur = Some(start);
    while let Some(node) = cur {
        if let Some(members) = func.loops.get(&node) {
            let valid = producer_blocks.iter().all(|pb| !members.contains(pb));
            if valid {
                best = Some(node);
            } else {
                break;
            }
        }
        cur = func.block(node).idom;
    }
    best
}

fn materialize_preheader(func: &mut Function, header: BlockID, insts: Vec<InstID>) {
    let pre = func.alloc_block();
    func.block_mut(pre).insts = insts;
    func.block_mut(pre).seq_next = Some(header);

    if let Some(splice_after) = func.blocks.iter().copied().find(|&p| func.block(p).order_next == Some(header)) {
        func.block_mut(splice_after).order_next = Some(pre);
    }
    func.block_mut(pre).order_next = Some(header);
    func.blocks.push(pre);

    let loop_members = func.loops[&header].clone();
    let old_preds = func.block(header).preds.clone();
    let (back_edge_preds, forward_preds): (Vec<BlockID>, Vec<BlockID>) =
        old_preds.iter().copied().partition(|p| loop_members.contains(p));

    for &p in &forward_preds {
        let blk = func.block_mut(p);
        if blk.seq_next == Some(header) {
            blk.seq_next = Some(pre);
        }
        if blk.br_next == Some(header) {
            blk.br_next = Some(pre);
        }
        if let Some(&last) = func.block(p).insts.last() {
            if func.inst(last).branch_target() == Some(header) {
                func.inst_mut(last).set_branch_target(pre);
            }
        }
    }
    if forward_preds.len() > 1 {
        log::warn!(
            "LICM pre-header for loop header {header:?} merges {} forward edges; \
             phi precision at the header may be lost for disagreeing values",
            forward_preds.len()
        );
    }

    reindex_header_phis(func, header, pre, &old_preds, &back_edge_preds, &forward_preds);

    func.block_mut(pre).preds = forward_preds;
    let mut new_header_preds = back_edge_preds;
    new_header_preds.push(pre);
    func.block_mut(header).preds = new_header_preds;
}

fn reindex_header_phis(
    func: &mut Function,
    header: BlockID,
    pre: BlockID,
    old_preds: &[BlockID],
    back_edge_preds: &[BlockID],
    forward_preds: &[BlockID],
) {
    let vars: Vec<LocalID> = func.block(header).phis.keys().copied().collect();
    for v in vars {
        let phi = func.block_mut(header).phis.get_mut(&v).unwrap();
        if phi.is_cleared() {
            continue;
        }
        let old_r = phi.r.clone();
        let old_pre = phi.pre.clone();

        let mut new_r = Vec::with_capacity(back_edge_preds.len() + 1);
        let mut new_pre = Vec::with_capacity(back_edge_preds.len() + 1);
        for &p in back_edge_preds {
            let idx = old_preds.iter().position(|&x| x == p).expect("back-edge pred was a header pred");
            new_r.push(old_r[idx].clone());
            new_pre.push(old_pre[idx]);
        }
        if let Some(&first_forward) = forward_preds.first() {
            let idx = old_preds.iter().position(|&x| x == first_forward).expect("forward pred was a header pred");
            new_r.push(old_r[idx].clone());
        } else {
            new_r.push(Operand::const_value(0));
        }
        new_pre.push(Some(pre));

        phi.r = new_r;
        phi.pre = new_pre;
    }
}
