//! Textual 3AC frontend (`spec.md` §6).
//!
//! `spec.md` §1 calls the surface parser an "external collaborator" — the
//! core only needs a flat, ordered sequence of instructions with addresses
//! and typed operands from it. This module is exactly that boundary: it
//! knows nothing about functions, blocks, or control flow, only about
//! turning `instr N: op [operand [operand]]` lines into [`RawInstruction`]s.
//! [`crate::cfg`] resolves the back-references these carry into arena
//! handles.

use crate::error::ParseError;
use crate::ir::Opcode;

/// An operand as written in the textual form, with back-references left
/// unresolved (an instruction name for `Reg`/`Label`, not yet an arena
/// handle — `spec.md` §4.1 step 3 is what resolves them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOperand {
    Gp,
    Fp,
    Const { value: i64, tag: Option<String> },
    Local { name: String, offset: i64 },
    Reg(i64),
    Label(i64),
}

/// One parsed line. `opcode` is `None` for an unrecognized opname — per
/// §7 this is a warning, not a parse error, and the instruction is kept as
/// an `UNKNOWN` marker with no operands.
#[derive(Debug, Clone)]
pub struct RawInstruction {
    pub name: i64,
    pub opname: String,
    pub opcode: Option<Opcode>,
    pub operands: Vec<RawOperand>,
}

/// Parses a full 3AC listing into a flat, ordered instruction sequence.
pub fn parse_program(input: &str) -> Result<Vec<RawInstruction>, ParseError> {
    let mut out = Vec::new();
    for (lineno, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        out.push(parse_line(line, lineno + 1)?);
    }
    Ok(out)
}

fn parse_line(line: &str, lineno: usize) -> Result<RawInstruction, ParseError> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next().ok_or_else(|| ParseError::MalformedHeader {
        line: lineno,
        text: line.to_string(),
    })?;
    if head != "instr" {
        return Err(ParseError::MalformedHeader { line: lineno, text: line.to_string() });
    }
    let addr_tok = tokens.next().ok_or_else(|| ParseError::MalformedHeader {
        line: lineno,
        text: line.to_string(),
    })?;
    let addr_digits = addr_tok.strip_suffix(':').ok_or_else(|| ParseError::MalformedHeader {
        line: lineno,
        text: line.to_string(),
    })?;
    let name: i64 = addr_digits
        .parse()
        .map_err(|_| ParseError::BadAddress { line: lineno, text: addr_tok.to_string() })?;

    let opname = tokens
        .next()
        .ok_or_else(|| ParseError::MalformedHeader { line: lineno, text: line.to_string() })?
        .to_string();
    let opcode = Opcode::from_name(&opname);
    if opcode.is_none() {
        log::warn!("line {lineno}: unknown opcode {opname:?}, instruction {name} replaced with UNKNOWN");
        return Ok(RawInstruction { name, opname, opcode: None, operands: Vec::new() });
    }
    let opcode = opcode.unwrap();
    let arity = opcode.arity();

    let mut operands = Vec::with_capacity(arity);
    for _ in 0..arity {
        let tok = tokens.next().ok_or_else(|| ParseError::WrongArity {
            line: lineno,
            opname: opname.clone(),
            expected: arity,
            found: operands.len(),
        })?;
        operands.push(parse_operand(tok, lineno)?);
    }

    Ok(RawInstruction { name, opname, opcode: Some(opcode), operands })
}

fn parse_operand(tok: &str, lineno: usize) -> Result<RawOperand, ParseError> {
    if let Some(inner) = tok.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let v: i64 = inner
            .parse()
            .map_err(|_| ParseError::BadOperand { line: lineno, text: tok.to_string() })?;
        return Ok(RawOperand::Reg(v));
    }
    if let Some(inner) = tok.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let v: i64 = inner
            .parse()
            .map_err(|_| ParseError::BadOperand { line: lineno, text: tok.to_string() })?;
        return Ok(RawOperand::Label(v));
    }
    if tok == "GP" {
        return Ok(RawOperand::Gp);
    }
    if tok == "FP" {
        return Ok(RawOperand::Fp);
    }
    if let Some(hash) = tok.find('#') {
        let name = &tok[..hash];
        let valstr = &tok[hash + 1..];
        let value: i64 = valstr
            .parse()
            .map_err(|_| ParseError::BadOperand { line: lineno, text: tok.to_string() })?;
        if name.ends_with("_base") || name.ends_with("_offset") {
            return Ok(RawOperand::Const { value, tag: Some(name.to_string()) });
        }
        return Ok(RawOperand::Local { name: name.to_string(), offset: value });
    }
    let value: i64 = tok
        .parse()
        .map_err(|_| ParseError::BadOperand { line: lineno, text: tok.to_string() })?;
    Ok(RawOperand::Const { value, tag: None })
}
