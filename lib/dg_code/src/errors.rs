//! Code model errors definitions.

use crate::Addr;
use thiserror::Error;

/// An alias for result that can be a [`CodeError`].
pub type CodeResult<T> = Result<T, CodeError>;

/// The code model error type.
#[derive(Debug, Error)]
pub enum CodeError {
    /// Instructions of a method body do not tile `[0, code length)`.
    #[error("instruction at {found} does not follow previous instruction (expected {expected})")]
    NonContiguous { expected: Addr, found: Addr },

    #[error("instruction at {0} has a zero length")]
    EmptyInstruction(Addr),

    /// The end of an instruction does not fit in a 32 bits offset.
    #[error("instruction at {addr} of length {length} overflows code offsets")]
    OffsetOverflow { addr: Addr, length: u32 },

    #[error("try item [{start}, {end}) is empty or reversed")]
    BadTryRange { start: Addr, end: Addr },

    /// Method signature text could not be split into class, name and descriptor.
    #[error("malformed method signature: {0}")]
    MalformedSignature(String),
}
