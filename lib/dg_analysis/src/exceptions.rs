//! Exception regions of a method body.

use dg_code::{Addr, TryItem};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handler {
    /// Caught exception type, `None` for a catch-all clause.
    pub type_name: Option<String>,
    pub addr: Addr,
    /// Start of the block containing the handler entry, `None` when the
    /// handler points outside of the method code.
    pub block: Option<Addr>,
}

/// A protected range `[start, end)` and the handlers catching the
/// exceptions raised inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionRegion {
    start: Addr,
    end: Addr,
    handlers: Vec<Handler>,
}

impl fmt::Display for ExceptionRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}:{:x}", self.start, self.end)?;
        for handler in &self.handlers {
            write!(
                f,
                " ({} -> {:x})",
                handler.type_name.as_deref().unwrap_or("*"),
                handler.addr
            )?;
        }
        Ok(())
    }
}

impl ExceptionRegion {
    pub(crate) fn new<F>(try_: &TryItem, block_of: F) -> Self
    where
        F: Fn(Addr) -> Option<Addr>,
    {
        let handlers = try_
            .handlers
            .iter()
            .map(|catch| {
                let block = block_of(catch.addr);
                if block.is_none() {
                    log::warn!(
                        "exception handler at {:x} is outside of method code",
                        catch.addr
                    );
                }
                Handler {
                    type_name: catch.type_name.clone(),
                    addr: catch.addr,
                    block,
                }
            })
            .collect();
        Self {
            start: try_.start,
            end: try_.end,
            handlers,
        }
    }

    #[inline]
    pub fn start(&self) -> Addr {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Addr {
        self.end
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.iter()
    }

    /// Loose range matching: the region matches `[start, end)` if it
    /// contains it, if it is contained by it, or if the two ranges overlap
    /// at either end. This is an approximation of interval containment
    /// tolerating decoder boundary mismatches, not an exact match.
    #[must_use]
    pub fn matches(&self, start: Addr, end: Addr) -> bool {
        let contains = self.start <= start && end <= self.end;
        let contained = start <= self.start && self.end <= end;
        let overlaps_end = start < self.start && self.start < end;
        let overlaps_start = start < self.end && self.end < end;
        contains || contained || overlaps_end || overlaps_start
    }
}

/// First region matching `[start, end)`, see [`ExceptionRegion::matches`].
pub(crate) fn lookup(regions: &[ExceptionRegion], start: Addr, end: Addr) -> Option<usize> {
    regions.iter().position(|region| region.matches(start, end))
}
