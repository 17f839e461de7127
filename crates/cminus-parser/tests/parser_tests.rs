use cminus_ast::Stmt;
use cminus_core::Type;

#[test]
fn s1_empty_main_returning_zero_has_no_diagnostics() {
    let out = cminus_parser::parse("int main() { return 0; }");
    assert!(out.diagnostics.is_empty());
    assert_eq!(out.program.functions.len(), 1);
    assert_eq!(out.program.functions[0].return_ty, Type::Int);
}

#[test]
fn s4_undeclared_identifier_is_diagnosed_at_its_column() {
    let out = cminus_parser::parse("int main() { int x; x = y; return 0; }");
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].message, "Use of undeclared identifier 'y'");
    // parsing still produced a complete Function AST despite the error.
    assert_eq!(out.program.functions.len(), 1);
}

#[test]
fn s5_redeclared_function_is_diagnosed_once() {
    let out = cminus_parser::parse("int f() { return 1; } int f() { return 2; }");
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].message, "Invalid redeclaration of function 'f'");
    assert_eq!(out.program.functions.len(), 2);
    assert_eq!(out.program.functions[1].ident, out.symbols.dummy_function());
}

#[test]
fn s3_if_else_both_returning_has_no_diagnostics() {
    let out = cminus_parser::parse("int main() { int x = 1; if (x > 0) return 1; else return 2; }");
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn s6_array_declaration_and_subscripts_parse_clean() {
    let out = cminus_parser::parse(
        "int main() { int a[3]; a[0] = 1; a[1] = 2; a[2] = a[0] + a[1]; return a[2]; }",
    );
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn redeclaration_within_same_scope_is_diagnosed() {
    let out = cminus_parser::parse("int main() { int x; int x; return 0; }");
    assert_eq!(out.diagnostics.len(), 1);
    assert!(out.diagnostics[0].message.contains("redeclaration of variable 'x'"));
}

#[test]
fn mismatched_binary_math_operand_types_diagnosed() {
    let out = cminus_parser::parse("int main() { double d = 1.5; int x = 2; return x + d; }");
    assert!(!out.diagnostics.is_empty());
}

#[test]
fn recovery_continues_after_malformed_statement_p6() {
    let out = cminus_parser::parse(
        "int good() { return 1; } int bad() { return ; int z z; return 2; } int also_good() { return 3; }",
    );
    // every well-formed function still yields a Function AST node (P6).
    assert_eq!(out.program.functions.len(), 3);
    assert!(!out.diagnostics.is_empty());
}

#[test]
fn for_loop_declares_init_variable_scoped_to_the_loop() {
    let out = cminus_parser::parse(
        "int main() { for (int i = 0; i < 10; i = i + 1) { } return 0; }",
    );
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    let body = &out.program.functions[0].body;
    let Stmt::Compound(stmts) = body else { panic!("expected compound body") };
    assert!(matches!(stmts[0], Stmt::For { .. }));
}

#[test]
fn call_arity_mismatch_is_diagnosed() {
    let out = cminus_parser::parse("int f(int x) { return x; } int main() { return f(1, 2); }");
    assert!(out.diagnostics.iter().any(|d| d.message.contains("expects 1 argument")));
}

#[test]
fn printf_requires_char_array_first_argument() {
    let out = cminus_parser::parse(r#"int main() { printf(1); return 0; }"#);
    assert!(out.diagnostics.iter().any(|d| d.message.contains("printf")));
}
