//! Final renumbering and emission boundary (`spec.md` §4.10, §6).
//!
//! The driver reserves address 1 for a leading sentinel `NOP` and the
//! address one past the last instruction for a trailing sentinel `NOP`
//! (§6: "First emitted instruction is `instr 1: nop`. Last emitted is a
//! trailing `nop`..."); both sentinels are emitted by `backend::threeac`,
//! not materialized as `Instruction`s here. Between them, every function is
//! numbered in program order: `ENTRYPC` (if `main`), then `ENTER`, then
//! every live (non-NOP) block instruction in block order, skipping NOPs
//! entirely. Each block's display name becomes its first live
//! instruction's new name.

use crate::ir::{Function, Program};

/// Renumbers every function in `program`. Returns `(leading_nop_name,
/// trailing_nop_name)` for the backend to print as the bracketing `NOP`s.
pub fn renumber_program(program: &mut Program) -> (i64, i64) {
    let leading_nop_name = 1;
    let mut next = leading_nop_name + 1;
    for &func_id in &program.funcs.clone() {
        next = renumber_function(program.func_mut(func_id), next);
    }
    log::debug!("renumbered program: leading nop at {leading_nop_name}, trailing nop at {next}");
    (leading_nop_name, next)
}

/// Numbers one function's `ENTRYPC`/`ENTER` markers and live block
/// instructions starting at `start`. Returns the next free address.
fn renumber_function(func: &mut Function, start: i64) -> i64 {
    let mut next = start;
    if func.is_main {
        func.entrypc_name = Some(next);
        next += 1;
    } else {
        func.entrypc_name = None;
    }
    func.enter_name = next;
    next += 1;

    let order: Vec<crate::ir::BlockID> = func.order_iter().collect();
    for b in order {
        let mut block_name: Option<i64> = None;
        for &inst_id in &func.block(b).insts.clone() {
            if func.inst(inst_id).is_nop() {
                continue;
            }
            func.inst_mut(inst_id).name = next;
            block_name.get_or_insert(next);
            next += 1;
        }
        if let Some(name) = block_name {
            func.block_mut(b).name = name;
        }
    }
    log::debug!("renumbered function entering at {start}, ending before {next}");
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, Opcode, Operand};

    #[test]
    fn degenerate_main_matches_the_documented_scenario() {
        let mut program = Program::new();
        let mut func = Function::new(0, 0, true);
        let b = func.alloc_block();
        func.entry = b;
        func.blocks = vec![b];
        let ret = func.alloc_inst(Instruction::new(-1, Opcode::Ret, [Operand::const_value(0)]));
        func.block_mut(b).insts = vec![ret];
        let func_id = program.alloc_func(func);

        let (leading, trailing) = renumber_program(&mut program);
        assert_eq!(leading, 1);
        let f = program.func(func_id);
        assert_eq!(f.entrypc_name, Some(2));
        assert_eq!(f.enter_name, 3);
        assert_eq!(f.inst(ret).name, 4);
        assert_eq!(trailing, 5);
    }

    #[test]
    fn nops_are_skipped_and_block_name_is_its_first_live_instruction() {
        let mut program = Program::new();
        let mut func = Function::new(0, 0, false);
        let b = func.alloc_block();
        func.entry = b;
        func.blocks = vec![b];
        let nop = func.alloc_inst(Instruction::new(-1, Opcode::Nop, []));
        let live = func.alloc_inst(Instruction::new(-1, Opcode::Ret, [Operand::const_value(0)]));
        func.block_mut(b).insts = vec![nop, live];
        let func_id = program.alloc_func(func);

        renumber_program(&mut program);
        let f = program.func(func_id);
        assert_eq!(f.entrypc_name, None);
        assert_eq!(f.inst(live).name, f.enter_name + 1);
        assert_eq!(f.block(b).name, f.inst(live).name);
    }
}
