use cminus_codegen::compile_to_ir;
use proptest::prelude::*;

fn lower(source: &str) -> String {
    let mut out = cminus_parser::parse(source);
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);
    compile_to_ir(&out.program, &out.diagnostics, &mut out.symbols, &mut out.interner)
        .expect("codegen should succeed on clean input")
}

fn is_terminator(line: &str) -> bool {
    line.starts_with("ret ")
        || line == "ret void"
        || line.starts_with("br ")
        || line.starts_with("switch ")
        || line == "unreachable"
}

/// P3: every labeled block in `ir` contains exactly one terminator, and it
/// is the block's last instruction.
fn assert_one_terminator_per_block(ir: &str) {
    for def in ir.split("\ndefine ").skip(1) {
        let body = def.split_once('{').map(|(_, b)| b).unwrap_or(def);
        let mut terminators = 0;
        let mut saw_block = false;
        for raw in body.lines() {
            let line = raw.trim();
            if line == "}" {
                break;
            }
            if line.is_empty() {
                continue;
            }
            if line.ends_with(':') {
                if saw_block {
                    assert_eq!(terminators, 1, "block closed with {terminators} terminators, ir:\n{ir}");
                }
                saw_block = true;
                terminators = 0;
                continue;
            }
            if is_terminator(line) {
                terminators += 1;
            }
        }
        if saw_block {
            assert_eq!(terminators, 1, "final block closed with {terminators} terminators, ir:\n{ir}");
        }
    }
}

proptest! {
    /// P3: exactly one terminator per block, holds across varied nestings
    /// of if/else and while. `compile_to_ir` itself already refuses a
    /// module `module.verify()` rejects, so a successful lower is a proof
    /// LLVM accepted the block structure; the scan above re-checks it
    /// directly against the generated IR text.
    #[test]
    fn p3_every_block_has_exactly_one_terminator(a in 0i32..50, b in 0i32..50, c in 1i32..10) {
        let source = format!(
            "int main() {{ \
                int x; x = {a}; \
                if (x > {b}) {{ x = x + 1; }} else {{ x = x - 1; }} \
                int i; i = 0; \
                while (i < {c}) {{ x = x + i; i = i + 1; }} \
                return x; \
            }}"
        );
        let ir = lower(&source);
        assert_one_terminator_per_block(&ir);
    }

    /// P4: when both arms of an `if/else` write the very same value to a
    /// variable read past the merge point, the phi Braun's algorithm would
    /// insert there has identical operands on every incoming edge -- a
    /// trivial phi -- and `try_remove_trivial_phi` must delete it rather
    /// than let it survive into the emitted IR.
    #[test]
    fn p4_trivial_phi_does_not_survive_identical_branch_values(k in 1i32..1000) {
        let source = format!("int main() {{ int x; if (1) {{ x = {k}; }} else {{ x = {k}; }} return x; }}");
        let ir = lower(&source);
        prop_assert!(!ir.contains("phi"), "trivial phi should have been eliminated:\n{ir}");
    }
}
