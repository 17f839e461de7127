use cminus_ast::{Expr, ExprKind, Stmt};
use proptest::prelude::*;

/// Walks every expression reachable from `stmt`, calling `visit` on each.
fn walk_stmt(stmt: &Stmt, visit: &mut impl FnMut(&Expr)) {
    match stmt {
        Stmt::Compound(stmts) => stmts.iter().for_each(|s| walk_stmt(s, visit)),
        Stmt::Declaration { init, .. } => {
            if let Some(e) = init {
                walk_expr(e, visit);
            }
        }
        Stmt::If { cond, then_branch, else_branch } => {
            walk_expr(cond, visit);
            walk_stmt(then_branch, visit);
            if let Some(e) = else_branch {
                walk_stmt(e, visit);
            }
        }
        Stmt::While { cond, body } => {
            walk_expr(cond, visit);
            walk_stmt(body, visit);
        }
        Stmt::For { init, cond, update, body, .. } => {
            if let Some(s) = init {
                walk_stmt(s, visit);
            }
            if let Some(e) = cond {
                walk_expr(e, visit);
            }
            if let Some(e) = update {
                walk_expr(e, visit);
            }
            walk_stmt(body, visit);
        }
        Stmt::Return { expr, .. } => {
            if let Some(e) = expr {
                walk_expr(e, visit);
            }
        }
        Stmt::ExprStmt(e) => walk_expr(e, visit),
        Stmt::Null => {}
    }
}

fn walk_expr(expr: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(expr);
    match &expr.kind {
        ExprKind::ArraySubscript { index, .. } | ExprKind::AddrOfArrayElement { index, .. } => {
            walk_expr(index, visit)
        }
        ExprKind::FunctionCall { args, .. } => args.iter().for_each(|a| walk_expr(a, visit)),
        ExprKind::Assign { lhs, rhs, .. } => {
            walk_expr(lhs, visit);
            walk_expr(rhs, visit);
        }
        ExprKind::LogicalAnd(a, b) | ExprKind::LogicalOr(a, b) => {
            walk_expr(a, visit);
            walk_expr(b, visit);
        }
        ExprKind::BinaryCmp { lhs, rhs, .. } | ExprKind::BinaryMath { lhs, rhs, .. } => {
            walk_expr(lhs, visit);
            walk_expr(rhs, visit);
        }
        ExprKind::Not(e) => walk_expr(e, visit),
        ExprKind::IdentRef(_)
        | ExprKind::PreIncrement(_)
        | ExprKind::PreDecrement(_)
        | ExprKind::StringLit(_)
        | ExprKind::IntLit(_)
        | ExprKind::DoubleLit(_)
        | ExprKind::CharLit(_) => {}
    }
}

proptest! {
    /// P1: every IdentRef surviving into the AST resolves to a binding
    /// visible from that point in the function's scope tree (checked
    /// indirectly here: a source using only declared names never produces
    /// an "undeclared identifier" diagnostic).
    #[test]
    fn p1_scope_closure_on_well_formed_programs(a in 1i32..1000, b in 1i32..1000) {
        let source = format!(
            "int main() {{ int x; int y; x = {a}; y = {b}; return x + y; }}"
        );
        let out = cminus_parser::parse(&source);
        prop_assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    }

    /// P2: a binary-math node with mismatched operand types never survives
    /// parsing silently -- it always produces a diagnostic.
    #[test]
    fn p2_mismatched_math_always_diagnosed(i in 1i32..1000) {
        let source = format!(
            "int main() {{ int x; double d; x = {i}; d = 1.5; return x + d; }}"
        );
        let out = cminus_parser::parse(&source);
        prop_assert!(!out.diagnostics.is_empty());
    }

    /// P5: two string literals with identical decoded text intern to the
    /// same StringId, regardless of how many times they appear.
    #[test]
    fn p5_identical_string_literals_share_one_record(reps in 2usize..6) {
        let calls = (0..reps).map(|_| "printf(msg);").collect::<Vec<_>>().join(" ");
        let source = format!(
            r#"int main() {{ char msg[] = "same text"; {calls} return 0; }}"#
        );
        let out = cminus_parser::parse(&source);
        prop_assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        prop_assert_eq!(out.interner.len(), 1);
    }

    /// P6: a file with one malformed function sandwiched between two
    /// well-formed ones still yields three Function AST nodes and at least
    /// one diagnostic.
    #[test]
    fn p6_recovery_preserves_well_formed_neighbors(n in 1i32..100) {
        let source = format!(
            "int good_before() {{ return {n}; }} \
             int bad() {{ return ; int z z; return 2; }} \
             int good_after() {{ return {n}; }}"
        );
        let out = cminus_parser::parse(&source);
        prop_assert_eq!(out.program.functions.len(), 3);
        prop_assert!(!out.diagnostics.is_empty());
    }
}

#[test]
fn every_ident_ref_in_a_clean_program_has_no_undeclared_diagnostic() {
    let out = cminus_parser::parse(
        "int main() { int a; int b; a = 1; b = a + 1; return b; }",
    );
    assert!(out.diagnostics.is_empty());
    let mut ref_count = 0;
    for function in &out.program.functions {
        walk_stmt(&function.body, &mut |e| {
            if matches!(e.kind, ExprKind::IdentRef(_)) {
                ref_count += 1;
            }
        });
    }
    assert!(ref_count >= 2);
}
