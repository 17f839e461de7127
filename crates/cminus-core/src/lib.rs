//! Core data model shared by the lexer, parser, and codegen stages: token
//! representation, the closed type lattice, the string interner, the
//! scope-tree symbol model, positioned diagnostics, and compile options.

pub mod diagnostic;
pub mod intern;
pub mod options;
pub mod symbol;
pub mod token;
pub mod types;

pub use diagnostic::{Diagnostic, Severity};
pub use intern::{StringId, StringInterner};
pub use options::{CompileOptions, OptLevel};
pub use symbol::{IdentId, Identifier, ScopeId, SymbolTable};
pub use token::{Token, TokenType};
pub use types::Type;
