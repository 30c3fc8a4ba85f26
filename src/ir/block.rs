//! Basic block representation (`spec.md` §3, §4.1).

use crate::base::{SlabId, define_slab_id};
use crate::ir::{InstID, LocalID, Phi};
use std::collections::{HashMap, HashSet};

define_slab_id!(
    /// Handle to a [`Block`] inside a [`crate::ir::Function`]'s block arena.
    BlockID -> Block
);

/// A contiguous run of instructions ending in at most one control-transfer
/// instruction.
#[derive(Debug, Clone)]
pub struct Block {
    /// Display name, set to its first live instruction's name by the
    /// renumbering pass (§4.10). `-1` until renumbering runs.
    pub name: i64,
    /// Instructions in this block, in order.
    pub insts: Vec<InstID>,

    /// Fall-through successor; `None` if the terminator is `BR`/`RET` (or
    /// there is no terminator at all, which cannot happen for any block
    /// but the function's last).
    pub seq_next: Option<BlockID>,
    /// Branch successor; `None` unless the terminator is a branch.
    pub br_next: Option<BlockID>,

    /// Predecessors in construction order. φ operand slot `i` always
    /// corresponds to `preds[i]` (§3 block invariant) — this ordering is
    /// never reshuffled once assigned.
    pub preds: Vec<BlockID>,

    /// Next block in the function's source order; `None` for the last
    /// block of a function whose terminator is `RET` (§4.1).
    pub order_next: Option<BlockID>,

    /// Immediate dominator; `None` only for the entry block.
    pub idom: Option<BlockID>,
    /// Children in the dominator tree.
    pub domc: Vec<BlockID>,
    /// Dominance frontier.
    pub df: Vec<BlockID>,

    /// Variables assigned to (by a `MOVE`) inside this block. Populated by
    /// SSA-prepare def-site collection (§4.4); empty otherwise.
    pub defs: HashSet<LocalID>,
    /// φ-node map keyed by local variable.
    pub phis: HashMap<LocalID, Phi>,

    /// Pending instructions to be hoisted here by LICM, keyed by nothing —
    /// just an ordered buffer (§4.6). Drained when the pre-header is
    /// materialized.
    pub licm_pending: Vec<InstID>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            name: -1,
            insts: Vec::new(),
            seq_next: None,
            br_next: None,
            preds: Vec::new(),
            order_next: None,
            idom: None,
            domc: Vec::new(),
            df: Vec::new(),
            defs: HashSet::new(),
            phis: HashMap::new(),
            licm_pending: Vec::new(),
        }
    }

    pub fn successors(&self) -> impl Iterator<Item = BlockID> + '_ {
        self.seq_next.into_iter().chain(self.br_next)
    }

    pub fn pred_index(&self, pred: BlockID) -> Option<usize> {
        self.preds.iter().position(|&p| p == pred)
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
