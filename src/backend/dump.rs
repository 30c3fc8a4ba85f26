//! Structural dumps: `cfg`, `dom`, and `rep` (`spec.md` §6, "Output —
//! cfg/dom/rep").
//!
//! Grounded in `examples/original_source/src/debug.cpp`'s `print_cfg` (live
//! code) and its commented-out dom-tree/DF/phi dump blocks at the bottom of
//! `main`. `rep` is this module's own synonym for "every structural dump,
//! one after another" — the original never names such a combined dump, but
//! its commented-out `main` runs exactly this sequence (CFG, then dom tree,
//! then DF, then phi) by hand for every debugging session, so `rep` just
//! gives that sequence a name.

use crate::ir::{Function, Program};
use std::fmt::Write as _;

/// `Function: <name>\nBasic blocks: <names...>\nCFG:\n<b> -> <succs...>\n...`
/// per function, verbatim from `print_cfg`.
pub fn cfg(program: &Program) -> String {
    let mut out = String::new();
    for &func_id in &program.funcs {
        write_cfg(&mut out, program.func(func_id));
    }
    out
}

fn write_cfg(out: &mut String, func: &Function) {
    writeln!(out, "Function: {}", func.enter_name).unwrap();

    write!(out, "Basic blocks:").unwrap();
    for b in func.order_iter() {
        write!(out, " {}", func.block(b).name).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "CFG:").unwrap();
    for b in func.order_iter() {
        write!(out, "{} ->", func.block(b).name).unwrap();
        if let Some(seq) = func.block(b).seq_next {
            write!(out, " {}", func.block(seq).name).unwrap();
        }
        if let Some(br) = func.block(b).br_next {
            write!(out, " {}", func.block(br).name).unwrap();
        }
        writeln!(out).unwrap();
    }
}

/// `<block> -> <dom tree children...>` per function, per block in source
/// order, per the original's commented-out dom-tree dump.
pub fn dom(program: &Program) -> String {
    let mut out = String::new();
    for &func_id in &program.funcs {
        let func = program.func(func_id);
        writeln!(out, "Function: {}", func.enter_name).unwrap();
        writeln!(out, "Dom Tree:").unwrap();
        for b in func.order_iter() {
            write!(out, "{} ->", func.block(b).name).unwrap();
            for &c in &func.block(b).domc {
                write!(out, " {}", func.block(c).name).unwrap();
            }
            writeln!(out).unwrap();
        }
    }
    out
}

/// `<block> : <dominance frontier...>` per function, per the original's
/// commented-out DF dump.
pub fn df(program: &Program) -> String {
    let mut out = String::new();
    for &func_id in &program.funcs {
        let func = program.func(func_id);
        writeln!(out, "DF:").unwrap();
        for b in func.order_iter() {
            write!(out, "{} :", func.block(b).name).unwrap();
            for &f in &func.block(b).df {
                write!(out, " {}", func.block(f).name).unwrap();
            }
            writeln!(out).unwrap();
        }
    }
    out
}

/// `<block> :\n  [<var>] <l> <- <r operands...>` per function, per the
/// original's commented-out phi dump. Cleared φs (§4.5, §4.9) are omitted,
/// matching the original which only ever dumped phi before SSA constant
/// propagation or de-construction could clear any of them.
pub fn phi(program: &Program) -> String {
    let mut out = String::new();
    for &func_id in &program.funcs {
        let func = program.func(func_id);
        writeln!(out, "Phi:").unwrap();
        for b in func.order_iter() {
            writeln!(out, "{} :", func.block(b).name).unwrap();
            for (var, phi) in &func.block(b).phis {
                if phi.is_cleared() {
                    continue;
                }
                let local = {
                    use crate::base::SlabId;
                    var.get(&func.locals)
                };
                write!(out, "  [{}] {} <-", local.name, phi.l).unwrap();
                for op in &phi.r {
                    write!(out, " {}", super::threeac::operand_text(program, func, op)).unwrap();
                }
                writeln!(out).unwrap();
            }
            writeln!(out).unwrap();
        }
    }
    out
}

/// Every structural dump, concatenated: CFG, then dom tree, then DF, then
/// phi, matching the sequence the original author ran by hand.
pub fn rep(program: &Program) -> String {
    let mut out = cfg(program);
    out.push('\n');
    out.push_str(&dom(program));
    out.push('\n');
    out.push_str(&df(program));
    out.push('\n');
    out.push_str(&phi(program));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, Opcode, Operand};
    use crate::opt::{dom_frontier, dominance, renumber};

    #[test]
    fn cfg_reports_one_block_with_no_successors() {
        let mut program = Program::new();
        let mut func = Function::new(0, 0, true);
        let b = func.alloc_block();
        func.entry = b;
        func.blocks = vec![b];
        let ret = func.alloc_inst(Instruction::new(-1, Opcode::Ret, [Operand::const_value(0)]));
        func.block_mut(b).insts = vec![ret];
        program.alloc_func(func);

        renumber::renumber_program(&mut program);
        let text = cfg(&program);
        assert!(text.contains("Basic blocks: 4"));
        assert!(text.contains("4 ->\n"));
    }

    #[test]
    fn dom_tree_of_a_single_block_function_has_no_children() {
        let mut program = Program::new();
        let mut func = Function::new(0, 0, true);
        let b = func.alloc_block();
        func.entry = b;
        func.blocks = vec![b];
        let ret = func.alloc_inst(Instruction::new(-1, Opcode::Ret, [Operand::const_value(0)]));
        func.block_mut(b).insts = vec![ret];
        dominance::compute(&mut func);
        dom_frontier::compute(&mut func);
        program.alloc_func(func);

        renumber::renumber_program(&mut program);
        let text = dom(&program);
        assert!(text.contains("Dom Tree:"));
    }
}
