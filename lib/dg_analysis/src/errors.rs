//! Analysis errors definition.

use dg_code::errors::CodeError;
use regex::Error as RegexError;
use std::io;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("code error: {0}")]
    Code(#[from] CodeError),

    #[error("regex error: {0}")]
    Regex(#[from] RegexError),

    #[error("I/O error: {0}")]
    IO(#[from] io::Error),

    #[error("the method has no implementation")]
    NoCode,

    #[error("the image contains no class")]
    EmptyImage,

    #[error("registration table, line {line}: {reason}")]
    Registration { line: usize, reason: String },
}
