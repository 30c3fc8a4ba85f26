//! Small arena/handle helpers shared by the IR.
//!
//! Every IR node (instruction, block, local variable, function) lives in a
//! `slab::Slab` owned by its parent and is referred to everywhere else by a
//! lightweight `Copy` handle, never by pointer or borrow. This removes the
//! cyclic-reference problem `spec.md` §9 calls out (`Block` <-> predecessors
//! <-> successors, `Operand` -> `Instruction`/`Block`/`LocalVariable`):
//! handles are plain integers, and dereferencing is always an explicit
//! `slab.get(handle)` call against the owning arena.

use slab::Slab;
use std::fmt::Debug;

/// A handle into a `Slab<Self::Data>` owned by some parent structure.
///
/// Implementors are newtypes over `usize`; see [`define_slab_id`].
pub trait SlabId: Copy + Eq + std::hash::Hash + Debug {
    type Data;

    fn from_raw(raw: usize) -> Self;
    fn raw(self) -> usize;

    fn get(self, slab: &Slab<Self::Data>) -> &Self::Data {
        slab.get(self.raw())
            .unwrap_or_else(|| panic!("dangling handle {self:?} (use after free?)"))
    }
    fn get_mut(self, slab: &mut Slab<Self::Data>) -> &mut Self::Data {
        slab.get_mut(self.raw())
            .unwrap_or_else(|| panic!("dangling handle {self:?} (use after free?)"))
    }
    fn try_get(self, slab: &Slab<Self::Data>) -> Option<&Self::Data> {
        slab.get(self.raw())
    }
}

/// Defines a `Copy` newtype handle over `usize` and implements [`SlabId`]
/// for it against the given arena element type.
macro_rules! define_slab_id {
    ($(#[$meta:meta])* $name:ident -> $data:ty) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl $crate::base::SlabId for $name {
            type Data = $data;
            fn from_raw(raw: usize) -> Self {
                $name(raw)
            }
            fn raw(self) -> usize {
                self.0
            }
        }
    };
}
pub(crate) use define_slab_id;
