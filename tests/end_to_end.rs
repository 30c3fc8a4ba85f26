//! End-to-end scenarios from `spec.md` §8, driven through the whole
//! pipeline (`tacopt::run`: frontend parse -> CFG recovery -> pass pipeline
//! -> renumbering -> backend render) rather than through any one module in
//! isolation.

use pretty_assertions::assert_eq;
use tacopt::backend::BackendKind;
use tacopt::opt::pipeline::PassTag;

fn render(input: &str, passes: &[PassTag], backend: BackendKind) -> String {
    tacopt::run(input, passes, backend).expect("pipeline should not fail on well-formed input")
}

/// S1: a `WRITE` reading a `MOVE`'s own register folds, under SCP, to the
/// `MOVE`'s constant.
#[test]
fn s1_scp_folds_a_write_through_a_register_reference() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 0\n\
        instr 3: move 5 x#-8\n\
        instr 4: write (3)\n\
        instr 5: wrl\n\
        instr 6: ret 0\n";
    let out = render(input, &[PassTag::Scp], BackendKind::ThreeAddr);
    assert!(out.contains("write 5"), "expected a folded write, got:\n{out}");

    let c = render(input, &[PassTag::Scp], BackendKind::C);
    assert!(c.contains("WriteLong(5);"), "expected a folded WriteLong call, got:\n{c}");
}

/// S2: `i = 0; while (i < 10) { i = i + 1; }`. After SCP+LICM+DSE the loop
/// body still has exactly one comparison and one increment, and no MOVE of
/// a bare constant into a temporary survives inside it (there was none to
/// begin with, and none of these passes should manufacture one).
#[test]
fn s2_tight_counting_loop_keeps_only_its_test_and_increment() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 8\n\
        instr 3: move 0 i#-8\n\
        instr 4: cmplt i#-8 10\n\
        instr 5: blbc (4) [10]\n\
        instr 6: add i#-8 1\n\
        instr 7: move (6) i#-8\n\
        instr 8: br [4]\n\
        instr 9: nop\n\
        instr 10: ret 0\n";
    let out = render(input, &[PassTag::Ssa, PassTag::Scp, PassTag::Licm, PassTag::Dse], BackendKind::ThreeAddr);
    assert_eq!(out.matches(": cmplt ").count(), 1);
    assert_eq!(out.matches(": add ").count(), 1);
    let cmplt_line = out.lines().find(|l| l.contains(": cmplt ")).unwrap();
    assert!(cmplt_line.trim_end().ends_with(" 10"), "the loop bound should survive unchanged:\n{cmplt_line}");
}

/// S3: two predecessors joining at a block that reads `x`, one setting
/// x=1, the other x=2. After SSA-SCP the phi's operands disagree and
/// de-construction must materialize one MOVE per predecessor.
#[test]
fn s3_disagreeing_join_materializes_a_move_per_predecessor() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 8\n\
        instr 3: cmplt 0 1\n\
        instr 4: blbc (3) [7]\n\
        instr 5: move 1 x#-8\n\
        instr 6: br [9]\n\
        instr 7: move 2 x#-8\n\
        instr 8: br [9]\n\
        instr 9: write x#-8\n\
        instr 10: wrl\n\
        instr 11: ret 0\n";
    let out = render(input, &[PassTag::Ssa, PassTag::Scp], BackendKind::ThreeAddr);
    assert_eq!(out.matches(": move 1 ").count(), 1, "expected exactly one MOVE of 1:\n{out}");
    assert_eq!(out.matches(": move 2 ").count(), 1, "expected exactly one MOVE of 2:\n{out}");
    // Each inserted MOVE lands before its predecessor's own BR, not after.
    let move1_idx = out.find(": move 1 ").unwrap();
    let first_br_idx = out.find(": br ").unwrap();
    assert!(move1_idx < first_br_idx, "MOVE 1 should precede its predecessor's branch:\n{out}");
}

/// S4: `y = a * b` is invariant inside a loop (`a`, `b` defined outside).
/// LICM must carve out a new pre-header for the multiply, raising the
/// function's block count by exactly one.
#[test]
fn s4_invariant_multiply_gets_its_own_pre_header() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 32\n\
        instr 3: move 2 a#-8\n\
        instr 4: move 3 b#-16\n\
        instr 5: move 0 i#-24\n\
        instr 6: cmplt i#-24 10\n\
        instr 7: blbc (6) [13]\n\
        instr 8: mul a#-8 b#-16\n\
        instr 9: move (8) y#-32\n\
        instr 10: add i#-24 1\n\
        instr 11: move (10) i#-24\n\
        instr 12: br [6]\n\
        instr 13: write y#-32\n\
        instr 14: wrl\n\
        instr 15: ret 0\n";

    let before = render(input, &[], BackendKind::Cfg);
    let before_blocks = before.lines().find(|l| l.starts_with("Basic blocks:")).unwrap();
    let before_count = before_blocks.split_whitespace().count() - 2;

    let after = render(input, &[PassTag::Ssa, PassTag::Licm], BackendKind::Cfg);
    let after_blocks = after.lines().find(|l| l.starts_with("Basic blocks:")).unwrap();
    let after_count = after_blocks.split_whitespace().count() - 2;

    assert_eq!(after_count, before_count + 1, "LICM should add exactly one pre-header block");

    let rendered = render(input, &[PassTag::Ssa, PassTag::Licm], BackendKind::ThreeAddr);
    assert_eq!(rendered.matches(": mul ").count(), 1);
}

/// S5: an unreachable MOVE into a LOCAL that's never read, followed by a
/// WRITE of a different LOCAL. DSE must erase the dead MOVE to NOP, and the
/// renumbering/emission boundary must skip it entirely from the output.
#[test]
fn s5_dead_move_is_erased_and_never_emitted() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 16\n\
        instr 3: move 9 y#-16\n\
        instr 4: move 5 x#-8\n\
        instr 5: write x#-8\n\
        instr 6: wrl\n\
        instr 7: ret 0\n";
    let out = render(input, &[PassTag::Dse], BackendKind::ThreeAddr);
    assert!(!out.contains("y#-16"), "the dead move's destination should not survive:\n{out}");
    assert!(!out.contains("move 9"), "the dead move's constant should not survive:\n{out}");
    assert!(out.contains("move 5"), "the live move should survive:\n{out}");
}

/// S6: a degenerate `main` with only `ENTER`/`RET`. No pass should touch
/// it, and the emitted 3AC matches spec.md §8's literal bracketing.
#[test]
fn s6_degenerate_main_round_trips_exactly() {
    let input = "instr 1: enter 0\ninstr 2: ret 0\n";
    let out = render(input, &[], BackendKind::ThreeAddr);
    assert_eq!(out, "instr 1: nop\ninstr 2: entrypc\ninstr 3: enter 0\ninstr 4: ret 0\ninstr 5: nop\n");
}

/// Property 1 (CFG well-formedness): every successor lists its predecessor
/// back, and a block with two distinct successors never lists the same
/// block twice.
#[test]
fn cfg_well_formedness_holds_for_a_branching_function() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 8\n\
        instr 3: cmplt 0 1\n\
        instr 4: blbc (3) [7]\n\
        instr 5: move 1 x#-8\n\
        instr 6: br [9]\n\
        instr 7: move 2 x#-8\n\
        instr 8: br [9]\n\
        instr 9: write x#-8\n\
        instr 10: wrl\n\
        instr 11: ret 0\n";
    let raw = tacopt::frontend::parse_program(input).unwrap();
    let program = tacopt::cfg::build_program(&raw).unwrap();
    let func = program.func(program.main.unwrap());
    for &b in &func.blocks {
        let block = func.block(b);
        if let (Some(seq), Some(br)) = (block.seq_next, block.br_next) {
            assert_ne!(seq, br, "a block's two successors must differ");
        }
        for succ in block.successors() {
            assert!(func.block(succ).preds.contains(&b), "successor must list this block as a predecessor");
        }
    }
}

/// Property 4/5 (SSA single-assignment, phi operand alignment) on the same
/// branching function once it's in SSA form.
#[test]
fn ssa_form_has_one_definition_per_version_and_aligned_phis() {
    let input = "\
        instr 1: entrypc\n\
        instr 2: enter 8\n\
        instr 3: cmplt 0 1\n\
        instr 4: blbc (3) [7]\n\
        instr 5: move 1 x#-8\n\
        instr 6: br [9]\n\
        instr 7: move 2 x#-8\n\
        instr 8: br [9]\n\
        instr 9: write x#-8\n\
        instr 10: wrl\n\
        instr 11: ret 0\n";
    let raw = tacopt::frontend::parse_program(input).unwrap();
    let mut program = tacopt::cfg::build_program(&raw).unwrap();
    let func_id = program.main.unwrap();
    {
        let func = program.func_mut(func_id);
        tacopt::opt::dominance::compute(func);
        tacopt::opt::dom_frontier::compute(func);
        tacopt::opt::ssa::construct(func);
    }
    let func = program.func(func_id);

    let mut seen_versions = std::collections::HashSet::new();
    for &b in &func.blocks {
        for &inst_id in &func.block(b).insts {
            if let Some(ssa) = func.inst(inst_id).move_dest_ssa() {
                assert!(seen_versions.insert(ssa), "every SSA version must have exactly one definition");
            }
        }
        for (_, phi) in &func.block(b).phis {
            assert_eq!(phi.r.len(), func.block(b).preds.len(), "phi operand count must match predecessor count");
            assert_eq!(phi.pre.len(), func.block(b).preds.len());
        }
    }
}
