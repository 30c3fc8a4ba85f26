//! C backend (`spec.md` §6, "Output — C").
//!
//! Grounded in `examples/original_source/src/icode.cpp`'s `Operand::ccode`/
//! `Instruction::ccode`: each `ENTER`..`RET` region becomes one C function
//! body, every instruction expands to one labeled statement, and `MOVE`'s
//! chained assignment (`r[addr] = dest = src;`) both records the move's
//! `REG` value and performs the store in a single statement. The function
//! wrapper is named `func_<N>` (`SPEC_FULL.md` §A) rather than the
//! original's `instr_<N>`, so a `CALL`'s target never collides with an
//! ordinary branch label.

use crate::base::SlabId;
use crate::ir::{Function, InstID, Opcode, Operand, Program};
use std::fmt::Write as _;

const PRELUDE: &str = "#include <stdio.h>\n\
#define WriteLine() printf(\"\\n\")\n\
#define WriteLong(x) printf(\" %lld\", (long long)(x))\n\
#define ReadLong(a) if (scanf(\"%lld\", &(a)) != 1) (a) = 0\n\
#define MEM(a) (*(long long *)(memory + (a)))\n\
#define LOCAL(a) (*(long long *)(memory + FP + (a)))\n\
\n\
static char memory[65536];\n\
static long long r[65536];\n\
static long long GP = 0;\n\
static long long SP = 65536;\n\
static long long FP = 65536;\n\
\n";

/// Re-emits the whole program as a single C translation unit.
pub fn emit(program: &Program) -> String {
    let mut out = String::new();
    out.push_str(PRELUDE);

    for &func_id in &program.funcs {
        let func = program.func(func_id);
        if func.is_main {
            writeln!(out, "void func_{}(void);", func.enter_name).unwrap();
            writeln!(out, "void (*entry)(void) = func_{};", func.enter_name).unwrap();
        }
    }
    writeln!(out).unwrap();

    for &func_id in &program.funcs {
        emit_function(&mut out, program, program.func(func_id));
    }

    out.push_str("int main(void) {\n\t(*entry)();\n\treturn 0;\n}\n");
    out
}

fn emit_function(out: &mut String, program: &Program, func: &Function) {
    writeln!(out, "void func_{}(void) {{", func.enter_name).unwrap();
    writeln!(out, "\tSP -= 8; MEM(SP) = FP; FP = SP; SP -= {};", func.frame_size).unwrap();
    for b in func.order_iter() {
        for &inst_id in &func.block(b).insts {
            if func.inst(inst_id).is_nop() {
                continue;
            }
            emit_instruction(out, program, func, inst_id);
        }
    }
    writeln!(out, "}}\n").unwrap();
}

fn emit_instruction(out: &mut String, program: &Program, func: &Function, inst_id: InstID) {
    let inst = func.inst(inst_id);
    let n = inst.name;
    write!(out, "\tinstr_{n}: ").unwrap();
    let op = |slot: usize| operand_ccode(program, func, &inst.operands[slot]);

    match inst.opcode {
        Opcode::Add => writeln!(out, "r[{n}] = {} + {};", op(0), op(1)).unwrap(),
        Opcode::Sub => writeln!(out, "r[{n}] = {} - {};", op(0), op(1)).unwrap(),
        Opcode::Mul => writeln!(out, "r[{n}] = {} * {};", op(0), op(1)).unwrap(),
        Opcode::Div => writeln!(out, "r[{n}] = {} / {};", op(0), op(1)).unwrap(),
        Opcode::Mod => writeln!(out, "r[{n}] = {} % {};", op(0), op(1)).unwrap(),
        Opcode::Neg => writeln!(out, "r[{n}] = -{};", op(0)).unwrap(),
        Opcode::CmpEq => writeln!(out, "r[{n}] = {} == {};", op(0), op(1)).unwrap(),
        Opcode::CmpLe => writeln!(out, "r[{n}] = {} <= {};", op(0), op(1)).unwrap(),
        Opcode::CmpLt => writeln!(out, "r[{n}] = {} < {};", op(0), op(1)).unwrap(),
        Opcode::Br => writeln!(out, "goto {};", branch_label(func, &inst.operands[0])).unwrap(),
        Opcode::Blbc => {
            writeln!(out, "if ({} == 0) goto {};", op(0), branch_label(func, &inst.operands[1])).unwrap()
        }
        Opcode::Blbs => {
            writeln!(out, "if ({} != 0) goto {};", op(0), branch_label(func, &inst.operands[1])).unwrap()
        }
        Opcode::Call => {
            let target = match &inst.operands[0] {
                Operand::Func(f) => program.func(*f).enter_name,
                other => panic!("CALL operand must resolve to a function, found {other:?}"),
            };
            writeln!(out, "SP -= 8; MEM(SP) = {n} + 1; func_{target}();").unwrap();
        }
        Opcode::Load => writeln!(out, "r[{n}] = MEM({});", op(0)).unwrap(),
        Opcode::Store => writeln!(out, "MEM({}) = {};", op(1), op(0)).unwrap(),
        Opcode::Move => writeln!(out, "r[{n}] = {} = {};", op(1), op(0)).unwrap(),
        Opcode::Read => writeln!(out, "ReadLong(r[{n}]);").unwrap(),
        Opcode::Write => writeln!(out, "WriteLong({});", op(0)).unwrap(),
        Opcode::Wrl => writeln!(out, "WriteLine();").unwrap(),
        Opcode::Param => writeln!(out, "SP -= 8; MEM(SP) = {};", op(0)).unwrap(),
        Opcode::Ret => writeln!(out, "SP = FP + 16 + {}; FP = MEM(FP);", op(0)).unwrap(),
        Opcode::Enter | Opcode::Entrypc | Opcode::Nop | Opcode::Phi | Opcode::Unknown => {
            writeln!(out, ";").unwrap()
        }
    }
}

fn branch_label(func: &Function, target: &Operand) -> String {
    match target {
        Operand::Label(b) => format!("instr_{}", func.block(*b).name),
        other => panic!("branch target operand must be a label, found {other:?}"),
    }
}

fn operand_ccode(program: &Program, func: &Function, op: &Operand) -> String {
    match op {
        Operand::Gp => "GP".to_string(),
        Operand::Fp => "FP".to_string(),
        Operand::Const { value, .. } => value.to_string(),
        Operand::Local { id, .. } => format!("LOCAL({})", id.get(&func.locals).offset),
        Operand::Reg(r) => format!("r[{}]", func.inst(*r).name),
        Operand::Label(b) => format!("instr_{}", func.block(*b).name),
        Operand::Func(f) => format!("func_{}", program.func(*f).enter_name),
    }
}
