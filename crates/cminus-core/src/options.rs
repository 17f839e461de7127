//! Compile-time option plumbing (ambient; out of the core scope per §1, but
//! threaded by value rather than through global state).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    O3,
}

impl Default for OptLevel {
    fn default() -> Self {
        OptLevel::O0
    }
}

/// Everything the CLI gathers from argv and hands to the pipeline as a
/// single immutable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    pub source_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub opt_level: OptLevel,
    /// `-c`: stop after producing an object file, skip linking.
    pub object_only: bool,
    /// `-a`: print the AST (debug form) instead of / alongside compiling.
    pub print_ast: bool,
    /// `-b`: print the textual IR.
    pub print_ir: bool,
    /// `--json`: report a `CompileResult` as JSON instead of human text.
    pub json_output: bool,
}

impl CompileOptions {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        CompileOptions {
            source_path: source_path.into(),
            output_path: None,
            opt_level: OptLevel::default(),
            object_only: false,
            print_ast: false,
            print_ir: false,
            json_output: false,
        }
    }
}
