//! 3AC re-printer (`spec.md` §6, "Output — 3AC").
//!
//! Grounded in `examples/original_source/src/icode.cpp`'s `Operand::icode`/
//! `Instruction::icode`: each operand's lexical form round-trips the
//! frontend's own syntax. The bracketing sentinel `NOP`s (`spec.md` §4.10,
//! §6) are printed here rather than materialized as real `Instruction`s.

use crate::base::SlabId;
use crate::ir::{Function, InstID, Operand, Program, NON_SSA};
use std::fmt::Write as _;

/// Re-emits the whole program as 3AC text: the leading sentinel `NOP`,
/// every function in program order (each function's `ENTRYPC`/`ENTER`
/// markers followed by its live block instructions), and the trailing
/// sentinel `NOP`.
pub fn emit(program: &Program, leading_nop: i64, trailing_nop: i64) -> String {
    let mut out = String::new();
    writeln!(out, "instr {leading_nop}: nop").unwrap();
    for &func_id in &program.funcs {
        emit_function(&mut out, program, program.func(func_id));
    }
    writeln!(out, "instr {trailing_nop}: nop").unwrap();
    out
}

fn emit_function(out: &mut String, program: &Program, func: &Function) {
    if let Some(entrypc) = func.entrypc_name {
        writeln!(out, "instr {entrypc}: entrypc").unwrap();
    }
    writeln!(out, "instr {}: enter {}", func.enter_name, func.frame_size).unwrap();
    for b in func.order_iter() {
        for &inst_id in &func.block(b).insts {
            if func.inst(inst_id).is_nop() {
                continue;
            }
            emit_instruction(out, program, func, inst_id);
        }
    }
}

fn emit_instruction(out: &mut String, program: &Program, func: &Function, inst_id: InstID) {
    let inst = func.inst(inst_id);
    write!(out, "instr {}: {}", inst.name, inst.opcode.name()).unwrap();
    for op in &inst.operands {
        write!(out, " {}", operand_text(program, func, op)).unwrap();
    }
    writeln!(out).unwrap();
}

/// Renders one operand in its lexical 3AC form (`spec.md` §6).
pub fn operand_text(program: &Program, func: &Function, op: &Operand) -> String {
    match op {
        Operand::Gp => "GP".to_string(),
        Operand::Fp => "FP".to_string(),
        Operand::Const { value, tag: Some(tag) } => format!("{tag}#{value}"),
        Operand::Const { value, tag: None } => value.to_string(),
        Operand::Local { id, ssa } => {
            let local = id.get(&func.locals);
            if *ssa == NON_SSA {
                format!("{}#{}", local.name, local.offset)
            } else {
                format!("{}#{}${}", local.name, local.offset, ssa)
            }
        }
        Operand::Reg(r) => format!("({})", func.inst(*r).name),
        Operand::Label(b) => format!("[{}]", func.block(*b).name),
        Operand::Func(f) => format!("[{}]", program.func(*f).enter_name),
    }
}
