//! Code address representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte offset of an instruction inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Addr(pub u32);

impl Addr {
    #[inline]
    #[must_use]
    pub const fn entry() -> Self {
        Self(0)
    }

    /// Offset `length` bytes further, saturating at `u32::MAX`.
    #[inline]
    #[must_use]
    pub const fn advance(self, length: u32) -> Self {
        Self(self.0.saturating_add(length))
    }

    #[inline]
    #[must_use]
    pub const fn checked_advance(self, length: u32) -> Option<Self> {
        match self.0.checked_add(length) {
            Some(offset) => Some(Self(offset)),
            None => None,
        }
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<u32> for Addr {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}
