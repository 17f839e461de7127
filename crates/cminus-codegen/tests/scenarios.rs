use cminus_codegen::compile_to_ir;

fn lower(source: &str) -> String {
    let mut out = cminus_parser::parse(source);
    assert!(out.diagnostics.is_empty(), "unexpected diagnostics: {:?}", out.diagnostics);
    compile_to_ir(&out.program, &out.diagnostics, &mut out.symbols, &mut out.interner)
        .expect("codegen should succeed on clean input")
}

#[test]
fn s1_empty_main_returns_zero() {
    let ir = lower("int main() { return 0; }");
    assert!(ir.contains("define i32 @main"));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn s2_arithmetic_expression_lowers_to_int_ops() {
    let ir = lower("int main() { int x; x = 2 + 3 * 4; return x; }");
    assert!(ir.contains("mul"));
    assert!(ir.contains("add"));
}

#[test]
fn s3_if_else_produces_branch_blocks() {
    let ir = lower("int main() { int x = 1; if (x > 0) return 1; else return 2; }");
    assert!(ir.contains("if.then"));
    assert!(ir.contains("if.else"));
    let ret_count = ir.matches("ret i32").count();
    assert_eq!(ret_count, 2);
}

#[test]
fn s6_array_subscript_assignment_round_trips() {
    let ir = lower("int main() { int a[3]; a[0] = 1; a[1] = 2; a[2] = a[0] + a[1]; return a[2]; }");
    assert!(ir.contains("alloca [3 x i32]"));
    assert!(ir.contains("getelementptr"));
}

#[test]
fn while_loop_has_cond_body_end_blocks() {
    let ir = lower("int main() { int i; i = 0; while (i < 10) { i = i + 1; } return i; }");
    assert!(ir.contains("while.cond"));
    assert!(ir.contains("while.body"));
    assert!(ir.contains("while.end"));
}

#[test]
fn for_loop_scopes_its_declaration_and_has_update_block() {
    let ir = lower("int main() { int sum; sum = 0; for (int i = 0; i < 5; i = i + 1) { sum = sum + i; } return sum; }");
    assert!(ir.contains("for.cond"));
    assert!(ir.contains("for.update"));
}

#[test]
fn printf_call_declares_external_and_passes_format_pointer() {
    let ir = lower(r#"int main() { char fmt[] = "hi\n"; printf(fmt); return 0; }"#);
    assert!(ir.contains("declare i32 @printf"));
    assert!(ir.contains("call i32 (i8*, ...) @printf") || ir.contains("call i32 (ptr, ...) @printf"));
}

#[test]
fn user_function_call_lowers_to_a_direct_call() {
    let ir = lower("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    assert!(ir.contains("define i32 @add"));
    assert!(ir.contains("call i32 @add"));
}

#[test]
fn logical_and_short_circuits_through_a_merge_block() {
    let ir = lower("int main() { int x; int y; x = 1; y = 0; return x && y; }");
    assert!(ir.contains("and.rhs"));
    assert!(ir.contains("and.end"));
}

#[test]
fn double_arithmetic_uses_float_instructions() {
    let ir = lower("int main() { double a; double b; a = 1.5; b = 2.5; double c; c = a + b; return 0; }");
    assert!(ir.contains("fadd"));
}
