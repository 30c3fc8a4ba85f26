//! An optimizing middle-end for a three-address-code (3AC) intermediate
//! representation: CFG recovery, dominator/loop analysis, SSA construction,
//! a suite of SSA and classical optimizations, SSA de-construction, and
//! textual/C re-emission.
//!
//! The library exposes the whole pipeline so it is testable without the
//! CLI; [`cli`]/`main.rs` is a thin driver wiring stdin/stdout to it.

pub mod backend;
pub mod base;
pub mod cfg;
pub mod cli;
pub mod error;
pub mod frontend;
pub mod ir;
pub mod opt;

#[cfg(test)]
mod testing;

use error::CfgError;

/// Parses, recovers the CFG for, optimizes, and renders one 3AC listing.
/// This is the single entry point both `main.rs` and the end-to-end tests
/// drive.
pub fn run(input: &str, passes: &[opt::pipeline::PassTag], backend: backend::BackendKind) -> Result<String, RunError> {
    let raw = frontend::parse_program(input)?;
    let mut program = cfg::build_program(&raw)?;
    opt::pipeline::run(&mut program, passes);
    Ok(backend::render(&mut program, backend))
}

/// Every way [`run`] can fail short of a driver-misuse error, which is
/// validated earlier by [`cli::parse_args`] and never reaches this function.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] error::ParseError),
    #[error(transparent)]
    Cfg(#[from] CfgError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use opt::pipeline::PassTag;

    #[test]
    fn scp_folds_a_write_of_a_moved_constant() {
        let text = "\
            instr 1: nop\n\
            instr 2: entrypc\n\
            instr 3: enter 0\n\
            instr 4: move 5 x#-8\n\
            instr 5: write x#-8\n\
            instr 6: wrl\n\
            instr 7: ret 0\n\
            instr 8: nop\n";
        let out = run(text, &[PassTag::Scp], backend::BackendKind::ThreeAddr).unwrap();
        assert!(out.contains("write 5"), "expected a folded write, got:\n{out}");
    }
}
