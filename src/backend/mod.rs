//! Output backends (`spec.md` §6, "Output").
//!
//! Every backend consumes the same renumbered [`Program`]; `threeac` and
//! `cemit` re-emit it as executable text, `dump` reports its structure for
//! debugging. Dispatch lives here so the driver only needs a [`BackendKind`]
//! and never has to know which emitter module backs it.

pub mod cemit;
pub mod dump;
pub mod threeac;

use crate::ir::Program;

/// One `-backend=` choice (`spec.md` §6: "one of `3addr, c, cfg, dom, rep`").
/// `Ssa` is accepted as a synonym for `Rep`: the original author's own
/// debugging runs always dumped CFG, dom tree, DF, and phi together by hand
/// (`examples/original_source/src/debug.cpp`), and this spec's `ssa` name
/// for that is this crate's `rep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ThreeAddr,
    C,
    Cfg,
    Dom,
    Rep,
}

impl BackendKind {
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "3addr" => BackendKind::ThreeAddr,
            "c" => BackendKind::C,
            "cfg" => BackendKind::Cfg,
            "dom" => BackendKind::Dom,
            "rep" | "ssa" => BackendKind::Rep,
            _ => return None,
        })
    }
}

/// Renumbers `program` and renders it through `kind`. `threeac` and `cemit`
/// need the sentinel addresses `renumber::renumber_program` hands back;
/// the structural dumps don't, so they're run after renumbering purely so
/// every backend reports block/instruction names from the same final
/// numbering (`spec.md` §4.10: renumbering is the last step before output).
pub fn render(program: &mut Program, kind: BackendKind) -> String {
    let (leading_nop, trailing_nop) = crate::opt::renumber::renumber_program(program);
    match kind {
        BackendKind::ThreeAddr => threeac::emit(program, leading_nop, trailing_nop),
        BackendKind::C => cemit::emit(program),
        BackendKind::Cfg => dump::cfg(program),
        BackendKind::Dom => dump::dom(program),
        BackendKind::Rep => dump::rep(program),
    }
}
