//! AST node family (component E): a closed sum-of-products tree built by
//! the parser. Dispatch throughout the codegen crate is a `match` on node
//! kind rather than virtual calls, and assignment targets (identifier vs.
//! array element) are distinct variants so no runtime ambiguity can arise
//! between them.

pub mod finalize;
pub mod node;

pub use finalize::FinalizeError;
pub use node::{
    ArgDecl, AssignOp, CmpOp, Expr, ExprKind, Function, FunctionId, MathOp, Program, Stmt,
};
