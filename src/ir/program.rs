//! Program: the top-level container (`spec.md` §3).

use crate::ir::{FuncID, Function};
use slab::Slab;

/// The whole optimization unit: an ordered function list plus an optional
/// pointer to `main`.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub funcs: Vec<FuncID>,
    pub func_arena: Slab<Function>,
    pub main: Option<FuncID>,
}

impl Program {
    pub fn new() -> Self {
        Self { funcs: Vec::new(), func_arena: Slab::new(), main: None }
    }

    pub fn func(&self, id: FuncID) -> &Function {
        use crate::base::SlabId;
        id.get(&self.func_arena)
    }
    pub fn func_mut(&mut self, id: FuncID) -> &mut Function {
        use crate::base::SlabId;
        id.get_mut(&mut self.func_arena)
    }

    pub fn alloc_func(&mut self, func: Function) -> FuncID {
        use crate::base::SlabId;
        let id = FuncID::from_raw(self.func_arena.insert(func));
        self.funcs.push(id);
        id
    }
}
