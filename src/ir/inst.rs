//! Instruction representation (`spec.md` §3).

use crate::base::{SlabId, define_slab_id};
use crate::ir::{Opcode, Operand};
use smallvec::SmallVec;

define_slab_id!(
    /// Handle to an [`Instruction`] inside a [`crate::ir::Function`]'s
    /// instruction arena. Also serves as the "defining instruction" that a
    /// `Operand::Reg` points at — dereferencing is the only way to reach
    /// an instruction's result, so results can never be confused with a
    /// raw name/address (§9, "Instruction identity after renaming").
    InstID -> Instruction
);

/// One instruction: a monotone "name" (used as its pseudo-register and, for
/// the frontend/emitter, the source address), an opcode, and zero to two
/// operands.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// The instruction's address/name as last assigned by a renumbering
    /// pass (§4.10). Never assumed dense or contiguous by any pass other
    /// than the renumbering pass itself. `-1` for an instruction
    /// synthesized by a pass and not yet renumbered.
    pub name: i64,
    pub opcode: Opcode,
    pub operands: SmallVec<[Operand; 2]>,
}

impl Instruction {
    pub fn new(name: i64, opcode: Opcode, operands: impl IntoIterator<Item = Operand>) -> Self {
        Self { name, opcode, operands: operands.into_iter().collect() }
    }

    pub fn with_arity(name: i64, opcode: Opcode) -> Self {
        let arity = opcode.arity();
        let operands = SmallVec::from_elem(Operand::const_value(0), arity);
        Self { name, opcode, operands }
    }

    pub fn operand(&self, slot: usize) -> Option<&Operand> {
        self.operands.get(slot)
    }

    pub fn operand_mut(&mut self, slot: usize) -> Option<&mut Operand> {
        self.operands.get_mut(slot)
    }

    /// For a `MOVE`, the destination `LOCAL` (operand slot 1), if any
    /// (§4.4: "if the instruction is a MOVE whose destination is a
    /// LOCAL").
    pub fn move_dest_local(&self) -> Option<crate::ir::LocalID> {
        if self.opcode != Opcode::Move {
            return None;
        }
        self.operands.get(1)?.as_local()
    }

    /// The SSA index stamped on a `MOVE`'s destination `LOCAL`, if any.
    pub fn move_dest_ssa(&self) -> Option<i32> {
        if self.opcode != Opcode::Move {
            return None;
        }
        match self.operands.get(1)? {
            Operand::Local { ssa, .. } => Some(*ssa),
            _ => None,
        }
    }

    pub fn branch_target(&self) -> Option<crate::ir::BlockID> {
        let slot = self.opcode.branch_target_slot()?;
        self.operands.get(slot)?.as_label()
    }

    pub fn set_branch_target(&mut self, block: crate::ir::BlockID) {
        if let Some(slot) = self.opcode.branch_target_slot() {
            if let Some(op) = self.operands.get_mut(slot) {
                *op = Operand::Label(block);
            }
        }
    }

    /// Turns this instruction into a `NOP`, preserving its `name` (§4.8:
    /// "rewrite each non-live instruction to NOP (preserving its name)").
    pub fn erase_to_nop(&mut self) {
        self.opcode = Opcode::Nop;
        self.operands.clear();
    }

    pub fn is_nop(&self) -> bool {
        self.opcode == Opcode::Nop
    }
}
