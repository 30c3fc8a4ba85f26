//! Operand representation (`spec.md` §3): a tagged union over GP, FP,
//! CONST, LOCAL, REG, LABEL, and FUNC.
//!
//! Per the REDESIGN FLAGS in §9 ("Tagged unions for operands"), this is a
//! proper Rust enum with one variant per kind carrying only the data that
//! kind needs — the source's "type tag + raw numeric field" union, and the
//! aliasing bugs it invites, have no equivalent here. `Reg`/`Label`/`Func`
//! hold arena handles, never raw integers, so a pass can never
//! accidentally reinterpret a label index as a register index.

use crate::ir::{BlockID, FuncID, InstID, LocalID};

/// Sentinel SSA index meaning "not yet in SSA form" (§3: "LOCAL's SSA index
/// is -1 in non-SSA form; a non-negative integer otherwise").
pub const NON_SSA: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Global-pointer symbol (`GP`).
    Gp,
    /// Frame-pointer symbol (`FP`).
    Fp,
    /// A 64-bit signed constant. `tag` is display-only (the `name` part of
    /// a lexical form like `x_base#4`) and never participates in
    /// semantics.
    Const { value: i64, tag: Option<String> },
    /// A reference to a local variable, optionally SSA-versioned.
    Local { id: LocalID, ssa: i32 },
    /// A reference to the defining instruction's result register.
    Reg(InstID),
    /// A reference to a branch target block.
    Label(BlockID),
    /// A reference to a called function.
    Func(FuncID),
}

impl Operand {
    pub fn const_value(value: i64) -> Self {
        Operand::Const { value, tag: None }
    }

    pub fn local(id: LocalID) -> Self {
        Operand::Local { id, ssa: NON_SSA }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Operand::Local { .. })
    }

    pub fn as_local(&self) -> Option<LocalID> {
        match self {
            Operand::Local { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn as_reg(&self) -> Option<InstID> {
        match self {
            Operand::Reg(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Operand::Const { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<BlockID> {
        match self {
            Operand::Label(b) => Some(*b),
            _ => None,
        }
    }

    /// Rewrites the SSA index of a `Local` operand in place; no-op for any
    /// other variant.
    pub fn set_ssa(&mut self, idx: i32) {
        if let Operand::Local { ssa, .. } = self {
            *ssa = idx;
        }
    }

    /// Clears the SSA index, restoring a `Local` operand to its base form
    /// (§4.9, SSA de-construction).
    pub fn clear_ssa(&mut self) {
        self.set_ssa(NON_SSA);
    }
}
