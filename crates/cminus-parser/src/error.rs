//! Parser-internal fallibility (§7). The reference's C++ exception
//! hierarchy (`EOFExcept`, `ParseExceptMsg`, `UnknownToken`,
//! `TokenMismatch`, `OperandMissing`) becomes ordinary `Result` values
//! propagated with `?`; every variant here is caught and converted into a
//! buffered `cminus_core::Diagnostic` at the nearest recovery boundary,
//! except `UnexpectedEof`, which terminates the parse.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// A syntactic or embedded-semantic failure at a known position,
    /// recoverable by synchronizing to the next boundary token.
    #[error("{message}")]
    Syntax { message: String, line: u32, col: u32 },

    /// End of file reached while trying to recover from a prior error.
    /// Matches the reference's `EOFExcept`: fatal, terminates the parse.
    #[error("unexpected end of file")]
    UnexpectedEof,
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, line: u32, col: u32) -> Self {
        ParseError::Syntax {
            message: message.into(),
            line,
            col,
        }
    }
}
