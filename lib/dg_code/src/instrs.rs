//! Decoded instructions.
//!
//! Instructions are produced by the bytecode decoder: every operand has
//! already been resolved (branch targets are absolute offsets, method,
//! field, type and string indexes are replaced by their symbolic values).
//! Analyses only need to know the opcode class, which is captured by
//! [`InstrKind`].

use crate::{Addr, FieldRef, MethodRef};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrKind {
    /// Unconditional jump.
    Goto(Addr),
    /// Conditional jump, falls through when the condition does not hold.
    If(Addr),
    /// Packed or sparse switch, falls through on the default case.
    Switch(Vec<Addr>),
    Return,
    Throw,
    /// Any `invoke-*` flavour.
    Invoke(MethodRef),
    NewInstance(String),
    ConstClass(String),
    /// `iget-*` and `sget-*`.
    FieldGet(FieldRef),
    /// `iput-*` and `sput-*`.
    FieldPut(FieldRef),
    ConstString(String),
    Other,
    /// The decoder failed on this instruction; the reason is kept for logs.
    Invalid(String),
}

impl InstrKind {
    /// Mnemonic used when the decoder did not provide opcode text.
    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Goto(_) => "goto",
            Self::If(_) => "if",
            Self::Switch(_) => "switch",
            Self::Return => "return",
            Self::Throw => "throw",
            Self::Invoke(_) => "invoke",
            Self::NewInstance(_) => "new-instance",
            Self::ConstClass(_) => "const-class",
            Self::FieldGet(_) => "get",
            Self::FieldPut(_) => "put",
            Self::ConstString(_) => "const-string",
            Self::Other => "nop",
            Self::Invalid(_) => "<invalid>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    addr: Addr,
    length: u32,
    kind: InstrKind,
    opcode: String,
    operands: String,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.opcode)
        } else {
            write!(f, "{} {}", self.opcode, self.operands)
        }
    }
}

impl Instruction {
    #[must_use]
    pub fn new(addr: Addr, length: u32, kind: InstrKind) -> Self {
        let opcode = kind.mnemonic().to_string();
        Self {
            addr,
            length,
            kind,
            opcode,
            operands: String::new(),
        }
    }

    /// Replaces the default mnemonic by the decoder textual output.
    #[must_use]
    pub fn with_text(self, opcode: impl Into<String>, operands: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            operands: operands.into(),
            ..self
        }
    }

    #[inline]
    pub fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    #[inline]
    pub fn next_addr(&self) -> Addr {
        self.addr.advance(self.length)
    }

    #[inline]
    pub fn kind(&self) -> &InstrKind {
        &self.kind
    }

    #[inline]
    pub fn opcode(&self) -> &str {
        &self.opcode
    }

    #[inline]
    pub fn operands(&self) -> &str {
        &self.operands
    }

    /// Branch-kind instructions end a basic block. Returns and throws are
    /// included: they transfer control out of the straight-line sequence.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.kind,
            InstrKind::Goto(_)
                | InstrKind::If(_)
                | InstrKind::Switch(_)
                | InstrKind::Return
                | InstrKind::Throw
        )
    }

    #[must_use]
    pub fn is_call(&self) -> bool {
        matches!(self.kind, InstrKind::Invoke(_))
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self.kind, InstrKind::Invalid(_))
    }

    /// Whether execution may continue with the next instruction in offset
    /// order.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.kind,
            InstrKind::Goto(_) | InstrKind::Return | InstrKind::Throw
        )
    }

    /// Explicit jump targets, as resolved by the decoder. Fallthrough is not
    /// part of this list.
    #[must_use]
    pub fn branch_targets(&self) -> Vec<Addr> {
        match &self.kind {
            InstrKind::Goto(target) | InstrKind::If(target) => vec![*target],
            InstrKind::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }
}
