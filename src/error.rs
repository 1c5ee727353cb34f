//! The crate-wide error type.
//!
//! Every public fallible function in this crate returns `Result<T,
//! Error>`; only `main` prints an error and exits the process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{file}:{line}: {message} (in {text:?})")]
    Parse {
        file: String,
        line: usize,
        message: String,
        text: String,
    },

    #[error("parsing line: {0}")]
    Line(#[from] crate::line::Error),

    #[error("lexing line: {0}")]
    Lexer(#[from] crate::lexer::Error),

    #[error("building table: {0}")]
    Table(String),

    #[error("zone {zone:?}: {message}")]
    Semantic { zone: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unknown zone or link {0:?}")]
    UnknownZone(String),
}
