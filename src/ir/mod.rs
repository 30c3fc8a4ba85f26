//! # IR data model
//!
//! The mutable intermediate representation passes operate on: instructions,
//! operands, basic blocks, functions, local variables, φ-nodes, and the
//! top-level program. See `spec.md` §3 for the invariants every node must
//! uphold.

mod block;
mod function;
mod inst;
mod opcode;
mod operand;
mod phi;
mod program;

pub use block::{Block, BlockID};
pub use function::{FuncID, Function, LocalID, LocalVariable};
pub use inst::{InstID, Instruction};
pub use opcode::Opcode;
pub use operand::{NON_SSA, Operand};
pub use phi::Phi;
pub use program::Program;
