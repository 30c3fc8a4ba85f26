//! Phi-node representation (`spec.md` §3, §4.4).

use crate::ir::{BlockID, Operand};

/// A φ-node, owned by a `(block, variable)` pair and stored in that
/// block's `phis` map rather than as an `Instruction` — the defined value
/// is just the variable's next SSA version, so a φ never needs its own
/// `REG` identity the way a real instruction does.
///
/// `r` and `pre` are parallel, aligned with the host block's predecessor
/// list: `r[i]`/`pre[i]` is the reaching operand/predecessor for
/// `preds(block)[i]`. A cleared φ (both empty) is semantically absent
/// (§4.5: SSA constant propagation clears a φ that resolves to a constant;
/// §4.9: SSA de-construction clears every φ after materializing its
/// predecessor moves).
#[derive(Debug, Clone, Default)]
pub struct Phi {
    /// The SSA index assigned to this φ's defined value.
    pub l: i32,
    /// Reaching operand for each predecessor, aligned with `pre`.
    pub r: Vec<Operand>,
    /// The predecessor block each `r[i]` came from. `None` until the
    /// dominator-tree rename walk fills in the slot for that predecessor
    /// edge (§4.4 step 3); fully populated once renaming completes.
    pub pre: Vec<Option<BlockID>>,
}

impl Phi {
    pub fn with_capacity(preds: usize) -> Self {
        Self { l: 0, r: vec![Operand::const_value(0); preds], pre: vec![None; preds] }
    }

    pub fn is_cleared(&self) -> bool {
        self.r.is_empty() && self.pre.is_empty()
    }

    pub fn clear(&mut self) {
        self.r.clear();
        self.pre.clear();
    }

    /// If every operand is a constant and they all agree, the φ itself
    /// defines that constant (§4.5).
    pub fn as_agreeing_const(&self) -> Option<i64> {
        if self.r.is_empty() {
            return None;
        }
        let first = self.r[0].as_const()?;
        for op in &self.r[1..] {
            if op.as_const()? != first {
                return None;
            }
        }
        Some(first)
    }
}
