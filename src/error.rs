use thiserror::Error;

use crate::object::Object;
use crate::token::Token;

/// Everything that can interrupt the pipeline.
///
/// `Break` and `Return` are not user-visible errors: they are the unwind
/// signals for `break` statements and `return` statements, consumed by the
/// enclosing loop and the active function call respectively. They travel
/// through the same `Result` channel but must never reach the diagnostic
/// output of a correct program.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("An error occurred at line {line}: {message}")]
    Lex { line: usize, message: String },

    #[error("An error occurred at line {} {}: {message}", .token.line, .token.location())]
    Parse { token: Token, message: String },

    #[error("An error occurred at line {} {}: {message}", .token.line, .token.location())]
    Resolve { token: Token, message: String },

    #[error("A runtime error occurred at line {} {}: {message}", .token.line, .token.location())]
    Runtime { token: Token, message: String },

    // Unwind signals, caught before they can surface.
    #[error("internal 'break' signal escaped its loop")]
    Break,

    #[error("internal 'return' signal escaped its function")]
    Return { value: Object },
}
