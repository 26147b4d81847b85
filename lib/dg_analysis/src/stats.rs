//! Counters over a built call graph.

use crate::callgraph::{CallGraph, CallKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallGraphStats {
    pub nb_nodes: usize,
    pub nb_edges: usize,
    pub nb_placeholders: usize,
    pub edges_per_kind: BTreeMap<CallKind, usize>,
}

impl CallGraphStats {
    pub(crate) fn compute(cg: &CallGraph) -> Self {
        let mut edges_per_kind = BTreeMap::new();
        for (_, _, call) in cg.iter_edges() {
            *edges_per_kind.entry(call.kind).or_insert(0) += 1;
        }
        Self {
            nb_nodes: cg.nb_nodes(),
            nb_edges: cg.nb_edges(),
            nb_placeholders: cg.nb_placeholders(),
            edges_per_kind,
        }
    }

    pub fn nb_edges_of(&self, kind: CallKind) -> usize {
        self.edges_per_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for CallGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} placeholders), {} edges",
            self.nb_nodes, self.nb_placeholders, self.nb_edges
        )?;
        for (kind, count) in &self.edges_per_kind {
            write!(f, ", {kind}: {count}")?;
        }
        Ok(())
    }
}
