//! The node types themselves. See the crate-level docs for the dispatch
//! philosophy.

use cminus_core::{IdentId, ScopeId, StringId, Type};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-unique handle for a [`Function`] within a [`Program`], used as
/// an identifier's non-owning back-reference to the function it names
/// (resolving the reference design's cyclic scope/function ownership
/// concern without a raw pointer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// An expression node: its kind, finalized result type, and source
/// position (needed for diagnostics raised against it after the fact, and
/// for P2's line/column cross-check).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub line: u32,
    pub col: u32,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, line: u32, col: u32) -> Self {
        Expr { kind, ty, line, col }
    }

    /// True for the two lvalue-capable expression kinds; used by the
    /// parser to validate assignment targets (§4.E's Assign finalization
    /// rule) and by the IR builder to pick the write path.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, ExprKind::IdentRef(_) | ExprKind::ArraySubscript { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    IdentRef(IdentId),
    ArraySubscript {
        array: IdentId,
        index: Box<Expr>,
    },
    FunctionCall {
        callee: IdentId,
        args: Vec<Expr>,
    },
    Assign {
        op: AssignOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    LogicalAnd(Box<Expr>, Box<Expr>),
    LogicalOr(Box<Expr>, Box<Expr>),
    BinaryCmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    BinaryMath {
        op: MathOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    PreIncrement(IdentId),
    PreDecrement(IdentId),
    AddrOfArrayElement {
        array: IdentId,
        index: Box<Expr>,
    },
    StringLit(StringId),
    IntLit(i64),
    DoubleLit(f64),
    CharLit(u8),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Compound(Vec<Stmt>),
    Declaration {
        ident: IdentId,
        init: Option<Expr>,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        /// The scope spanning the whole for-statement (init through body),
        /// entered before `init` is parsed and exited once the statement
        /// completes -- see the design note on loop-scoped declarations.
        scope: ScopeId,
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Return {
        expr: Option<Expr>,
        line: u32,
        col: u32,
    },
    ExprStmt(Expr),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgDecl {
    pub ident: IdentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub id: FunctionId,
    pub ident: IdentId,
    pub return_ty: Type,
    pub args: Vec<ArgDecl>,
    pub body: Stmt,
    /// Scope hosting both parameters and body, entered by `parseFunction`
    /// before arguments are parsed and exited only after the body.
    pub scope: ScopeId,
    /// Set when the parser observed a call to `printf` anywhere in this
    /// function's body, for the emitter's external declaration decision.
    pub needs_printf: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

impl Program {
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn needs_printf(&self) -> bool {
        self.functions.iter().any(|f| f.needs_printf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lvalue_classification() {
        let ident = Expr::new(ExprKind::IdentRef(IdentId(0)), Type::Int, 1, 1);
        assert!(ident.is_lvalue());

        let lit = Expr::new(ExprKind::IntLit(1), Type::Int, 1, 1);
        assert!(!lit.is_lvalue());

        let sub = Expr::new(
            ExprKind::ArraySubscript {
                array: IdentId(0),
                index: Box::new(Expr::new(ExprKind::IntLit(0), Type::Int, 1, 1)),
            },
            Type::Int,
            1,
            1,
        );
        assert!(sub.is_lvalue());
    }

    #[test]
    fn program_detects_printf_usage() {
        let mut program = Program::default();
        program.functions.push(Function {
            id: FunctionId(0),
            ident: IdentId(0),
            return_ty: Type::Void,
            args: vec![],
            body: Stmt::Null,
            scope: ScopeId(0),
            needs_printf: true,
        });
        assert!(program.needs_printf());
    }
}
