//! Codegen error types covering LLVM emission and the ambient
//! object/link pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// The source had one or more parse/semantic diagnostics; codegen
    /// never runs against a program with recorded diagnostics (§7 policy).
    #[error("refusing to emit IR: {0} diagnostic(s) were recorded during parsing")]
    HadDiagnostics(usize),

    /// LLVM API failure (module verification, pass failures).
    #[error("LLVM error: {0}")]
    Llvm(String),

    /// System linker (`cc`) subprocess failure.
    #[error("linker failed: {0}")]
    LinkerFailed(String),

    /// Filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal invariant violated during emission -- not a user-facing
    /// diagnostic, since it indicates a codegen bug rather than a
    /// malformed source program (the parser should never hand codegen an
    /// AST that trips one of these).
    #[error("internal codegen error: {0}")]
    Internal(String),
}
