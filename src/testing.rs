//! Hand-built IR fixtures shared by unit and integration tests, in the
//! style of `remusys-ir/src/testing/cases.rs`. Everything here
//! bypasses the frontend/CFG builder and wires `Block`/`Instruction`
//! directly, so analysis tests can target one CFG shape in isolation.
#![cfg(test)]

use crate::ir::{BlockID, Function, Instruction, Opcode, Operand};

pub mod fixtures {
    use super::*;

    fn link(func: &mut Function, from: BlockID, seq: Option<BlockID>, br: Option<BlockID>) {
        func.block_mut(from).seq_next = seq;
        func.block_mut(from).br_next = br;
        for succ in seq.into_iter().chain(br) {
            func.block_mut(succ).preds.push(from);
        }
    }

    fn chain_order(func: &mut Function, order: &[BlockID]) {
        for w in order.windows(2) {
            func.block_mut(w[0]).order_next = Some(w[1]);
        }
        func.blocks = order.to_vec();
        func.entry = order[0];
    }

    /// `entry` branches to `b1`/`b2`, both falling through to `join`.
    pub fn diamond() -> Function {
        let mut func = Function::new(0, 0, true);
        let entry = func.alloc_block();
        let b1 = func.alloc_block();
        let b2 = func.alloc_block();
        let join = func.alloc_block();

        let x = func.intern_local("x", -8);
        let cmp = func.alloc_inst(Instruction::new(
            1,
            Opcode::CmpLt,
            [Operand::const_value(0), Operand::const_value(1)],
        ));
        let blbc =
            func.alloc_inst(Instruction::new(2, Opcode::Blbc, [Operand::Reg(cmp), Operand::Label(b2)]));
        func.block_mut(entry).insts = vec![cmp, blbc];

        let mv1 =
            func.alloc_inst(Instruction::new(3, Opcode::Move, [Operand::const_value(1), Operand::local(x)]));
        func.block_mut(b1).insts = vec![mv1];

        let mv2 =
            func.alloc_inst(Instruction::new(4, Opcode::Move, [Operand::const_value(2), Operand::local(x)]));
        func.block_mut(b2).insts = vec![mv2];

        let nop = func.alloc_inst(Instruction::new(5, Opcode::Nop, []));
        func.block_mut(join).insts = vec![nop];

        link(&mut func, entry, Some(b1), Some(b2));
        link(&mut func, b1, Some(join), None);
        link(&mut func, b2, Some(join), None);
        chain_order(&mut func, &[entry, b1, b2, join]);
        func
    }

    /// The block with more than one predecessor in a [`diamond`] CFG.
    pub fn find_join(func: &Function) -> BlockID {
        func.blocks
            .iter()
            .copied()
            .find(|&b| func.block(b).preds.len() == 2)
            .expect("no join block in this CFG")
    }

    /// `entry -> header -> body -> header` (back edge), `header -> exit`.
    pub fn while_loop() -> Function {
        let mut func = Function::new(0, 0, true);
        let entry = func.alloc_block();
        let header = func.alloc_block();
        let body = func.alloc_block();
        let exit = func.alloc_block();

        let x = func.intern_local("x", -8);
        let mv0 =
            func.alloc_inst(Instruction::new(1, Opcode::Move, [Operand::const_value(0), Operand::local(x)]));
        func.block_mut(entry).insts = vec![mv0];

        let cmp = func.alloc_inst(Instruction::new(
            2,
            Opcode::CmpLt,
            [Operand::local(x), Operand::const_value(10)],
        ));
        let blbc = func.alloc_inst(Instruction::new(
            3,
            Opcode::Blbc,
            [Operand::Reg(cmp), Operand::Label(exit)],
        ));
        func.block_mut(header).insts = vec![cmp, blbc];

        let add =
            func.alloc_inst(Instruction::new(4, Opcode::Add, [Operand::local(x), Operand::const_value(1)]));
        let mv1 =
            func.alloc_inst(Instruction::new(5, Opcode::Move, [Operand::Reg(add), Operand::local(x)]));
        let br = func.alloc_inst(Instruction::new(6, Opcode::Br, [Operand::Label(header)]));
        func.block_mut(body).insts = vec![add, mv1, br];

        let nop = func.alloc_inst(Instruction::new(7, Opcode::Nop, []));
        func.block_mut(exit).insts = vec![nop];

        link(&mut func, entry, Some(header), None);
        link(&mut func, header, Some(body), Some(exit));
        link(&mut func, body, None, Some(header));
        chain_order(&mut func, &[entry, header, body, exit]);
        func
    }

    /// A `while` loop whose body recomputes a loop-invariant product
    /// (`k * 2`, with `k` never reassigned in the loop) alongside the
    /// induction variable update, for LICM tests.
    pub fn loop_with_invariant() -> Function {
        let mut func = while_loop();
        let body = func
            .blocks
            .iter()
            .copied()
            .find(|&b| func.block(b).preds.len() == 1 && func.block(b).br_next.is_some())
            .expect("body block");
        let k = func.intern_local("k", -16);
        let invariant = func.alloc_inst(Instruction::new(
            100,
            Opcode::Mul,
            [Operand::local(k), Operand::const_value(2)],
        ));
        let mut insts = func.block(body).insts.clone();
        insts.insert(0, invariant);
        func.block_mut(body).insts = insts;
        func
    }
}
