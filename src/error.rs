//! Crate-wide error types.
//!
//! One `thiserror` enum per fallible boundary: a small `#[error("...")]`
//! enum per subsystem rather than a single catch-all error type.

use thiserror::Error;

/// Errors from the textual 3AC frontend (`spec.md` §6).
///
/// An unknown opcode is *not* a `ParseError` — per §7 it is a warning plus an
/// UNKNOWN instruction, and parsing continues.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected 'instr <N>:', found {text:?}")]
    MalformedHeader { line: usize, text: String },
    #[error("line {line}: instruction address is not a valid integer: {text:?}")]
    BadAddress { line: usize, text: String },
    #[error("line {line}: opcode {opname:?} expects {expected} operand(s), found {found}")]
    WrongArity { line: usize, opname: String, expected: usize, found: usize },
    #[error("line {line}: malformed operand {text:?}")]
    BadOperand { line: usize, text: String },
}

/// Structural invariant violations discovered while recovering functions and
/// basic blocks from the flat instruction stream (`spec.md` §4.1, §7).
///
/// These are the "fatal assertion" class from §7: the core does not attempt
/// to recover from them.
#[derive(Debug, Error)]
pub enum CfgError {
    #[error("ENTER at instruction {0} has no matching RET")]
    EnterWithoutRet(i64),
    #[error("RET at instruction {0} has no matching ENTER")]
    RetWithoutEnter(i64),
    #[error("nested ENTER: instruction {inner} appears inside the function opened at {outer}")]
    NestedEnter { outer: i64, inner: i64 },
    #[error("program has no main function (no ENTER preceded by ENTRYPC)")]
    NoMain,
    #[error("branch at instruction {from} targets instruction {target}, which does not exist")]
    DanglingBranchTarget { from: i64, target: i64 },
}

/// CLI / driver misuse (`spec.md` §6, §7). Maps to process exit code 1.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("duplicate -opt flag")]
    DuplicateOpt,
    #[error("duplicate -backend flag")]
    DuplicateBackend,
    #[error("unknown optimization {0:?}")]
    UnknownOpt(String),
    #[error("unknown backend: {0:?}")]
    UnknownBackend(String),
    #[error("no backend")]
    NoBackend,
    #[error("unknown argument: {0:?}")]
    UnknownArgument(String),
}
