//! Method bodies: instructions plus exception descriptors.

use crate::errors::{CodeError, CodeResult};
use crate::{Addr, Instruction};
use serde::{Deserialize, Serialize};

/// One `catch` clause of a try item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchHandler {
    /// Caught exception type, `None` for a catch-all clause.
    pub type_name: Option<String>,
    pub addr: Addr,
}

impl CatchHandler {
    pub fn new(type_name: Option<&str>, addr: Addr) -> Self {
        Self {
            type_name: type_name.map(str::to_string),
            addr,
        }
    }
}

/// A protected range `[start, end)` and its handlers, as listed by the
/// decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryItem {
    pub start: Addr,
    pub end: Addr,
    pub handlers: Vec<CatchHandler>,
}

impl TryItem {
    pub fn new(start: Addr, end: Addr, handlers: Vec<CatchHandler>) -> Self {
        Self {
            start,
            end,
            handlers,
        }
    }
}

/// Deserialized method bodies go through the same layout checks as
/// [`Code::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCode")]
pub struct Code {
    instructions: Vec<Instruction>,
    tries: Vec<TryItem>,
}

#[derive(Deserialize)]
struct RawCode {
    instructions: Vec<Instruction>,
    #[serde(default)]
    tries: Vec<TryItem>,
}

impl TryFrom<RawCode> for Code {
    type Error = CodeError;

    fn try_from(raw: RawCode) -> CodeResult<Self> {
        Self::new(raw.instructions, raw.tries)
    }
}

impl Code {
    /// Checks the instruction layout and builds a method body.
    ///
    /// Instructions must start at offset 0 and be contiguous: each one
    /// begins where the previous ends. Try items must be non-empty ranges.
    pub fn new(instructions: Vec<Instruction>, tries: Vec<TryItem>) -> CodeResult<Self> {
        let mut expected = Addr::entry();
        for instr in &instructions {
            if instr.addr() != expected {
                return Err(CodeError::NonContiguous {
                    expected,
                    found: instr.addr(),
                });
            }
            if instr.length() == 0 {
                return Err(CodeError::EmptyInstruction(instr.addr()));
            }
            expected = instr
                .addr()
                .checked_advance(instr.length())
                .ok_or(CodeError::OffsetOverflow {
                    addr: instr.addr(),
                    length: instr.length(),
                })?;
        }
        for try_ in &tries {
            if try_.start >= try_.end {
                return Err(CodeError::BadTryRange {
                    start: try_.start,
                    end: try_.end,
                });
            }
        }
        Ok(Self {
            instructions,
            tries,
        })
    }

    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[inline]
    pub fn tries(&self) -> &[TryItem] {
        &self.tries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Offset just past the last instruction.
    pub fn code_length(&self) -> u32 {
        self.instructions
            .last()
            .map_or(0, |instr| instr.next_addr().0)
    }

    /// Index in [`Self::instructions`] of the instruction at `addr`.
    pub fn position(&self, addr: Addr) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&addr, Instruction::addr)
            .ok()
    }
}
