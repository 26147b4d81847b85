//! Control flow graph representation.

use crate::callgraph::CallKind;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::exceptions::{self, ExceptionRegion};
use dg_code::{Addr, Code, Instruction, MethodDef, MethodRef};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Nature of an edge leaving a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EdgeKind {
    /// Jump or fallthrough inside the method.
    Intra,
    /// Call into another method (or placeholder).
    Inter(CallKind),
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Intra => write!(f, "<intra>"),
            Self::Inter(kind) => write!(f, "<inter {kind}>"),
        }
    }
}

/// A maximal straight-line run of instructions `[start, end)`.
#[derive(Debug)]
pub struct Block<'a> {
    start: Addr,
    end: Addr,
    instrs: &'a [Instruction],
    region: Option<usize>,
}

impl<'a> fmt::Display for Block<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for instr in self.instrs {
            writeln!(f, "{:5}: {}", instr.addr(), instr)?;
        }
        Ok(())
    }
}

impl<'a> Block<'a> {
    #[inline]
    pub fn start(&self) -> Addr {
        self.start
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> Addr {
        self.end
    }

    #[inline]
    pub fn contains(&self, addr: Addr) -> bool {
        self.start <= addr && addr < self.end
    }

    #[inline]
    pub fn instructions(&self) -> &'a [Instruction] {
        self.instrs
    }

    pub fn last_instruction(&self) -> Option<&'a Instruction> {
        self.instrs.last()
    }
}

/// Intra-method edge: the instruction at `site` transfers control to the
/// block containing `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockEdge {
    pub site: Addr,
    pub target: Addr,
}

impl BlockEdge {
    #[inline]
    pub fn kind(&self) -> EdgeKind {
        EdgeKind::Intra
    }
}

/// Basic blocks and exception regions of one method body.
#[derive(Debug)]
pub struct MethodGraph<'a> {
    method: MethodRef,
    inner: DiGraph<Block<'a>, BlockEdge>,
    node_ids: BTreeMap<Addr, NodeIndex>,
    regions: Vec<ExceptionRegion>,
    code_length: u32,
}

impl<'a> MethodGraph<'a> {
    /// Partitions the method code into basic blocks, links them and
    /// attaches exception regions.
    pub fn build(method: MethodRef, def: &'a MethodDef) -> AnalysisResult<Self> {
        let code = def.code().ok_or(AnalysisError::NoCode)?;
        let code_length = code.code_length();

        let mut inner = DiGraph::new();
        let mut node_ids = BTreeMap::new();

        let leaders = compute_block_leaders(code, &method);
        for block in split_into_blocks(code, &leaders) {
            node_ids.insert(block.start, inner.add_node(block));
        }

        let mut graph = Self {
            method,
            inner,
            node_ids,
            regions: Vec::new(),
            code_length,
        };
        graph.link_blocks();
        graph.attach_regions(code);

        log::trace!(
            "{}: {} blocks, {} edges, {} exception regions",
            graph.method,
            graph.inner.node_count(),
            graph.inner.edge_count(),
            graph.regions.len()
        );
        Ok(graph)
    }

    fn link_blocks(&mut self) {
        let mut edges = Vec::new();
        for id in self.node_ids.values() {
            let block = &self.inner[*id];
            let Some(last) = block.last_instruction() else {
                continue;
            };
            if last.is_branch() {
                for target in last.branch_targets() {
                    match self.block_id_at(target) {
                        Some(dst) => edges.push((*id, dst, last.addr(), target)),
                        None => log::warn!(
                            "{}: branch at {:x} targets {:x}, outside of method code",
                            self.method,
                            last.addr(),
                            target
                        ),
                    }
                }
            }
            if last.falls_through() {
                if let Some(dst) = self.node_ids.get(&block.end) {
                    edges.push((*id, *dst, last.addr(), block.end));
                }
            }
        }
        for (src, dst, site, target) in edges {
            self.inner.add_edge(src, dst, BlockEdge { site, target });
        }
    }

    fn attach_regions(&mut self, code: &Code) {
        let regions: Vec<ExceptionRegion> = code
            .tries()
            .iter()
            .map(|try_| ExceptionRegion::new(try_, |addr| self.block_at(addr).map(Block::start)))
            .collect();
        for id in self.inner.node_indices() {
            let (start, end) = (self.inner[id].start, self.inner[id].end);
            self.inner[id].region = exceptions::lookup(&regions, start, end);
        }
        self.regions = regions;
    }

    fn block_id_at(&self, addr: Addr) -> Option<NodeIndex> {
        let (_, id) = self.node_ids.range(..=addr).next_back()?;
        self.inner[*id].contains(addr).then_some(*id)
    }

    #[inline]
    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    #[inline]
    pub fn code_length(&self) -> u32 {
        self.code_length
    }

    #[inline]
    pub fn nb_blocks(&self) -> usize {
        self.inner.node_count()
    }

    #[inline]
    pub fn nb_edges(&self) -> usize {
        self.inner.edge_count()
    }

    /// Block whose range contains `addr`.
    pub fn block_at(&self, addr: Addr) -> Option<&Block<'a>> {
        self.block_id_at(addr).map(|id| &self.inner[id])
    }

    /// Block starting exactly at `addr`.
    pub fn block_starting_at(&self, addr: Addr) -> Option<&Block<'a>> {
        self.node_ids.get(&addr).map(|id| &self.inner[*id])
    }

    /// Blocks in offset order.
    pub fn iter_blocks(&self) -> impl Iterator<Item = &Block<'a>> {
        self.node_ids.values().map(move |id| &self.inner[*id])
    }

    /// Edges leaving the block containing `addr`, with their target block.
    pub fn successors(&self, addr: Addr) -> Vec<(BlockEdge, &Block<'a>)> {
        self.neighbors(addr, Direction::Outgoing)
    }

    /// Edges entering the block containing `addr`, with their source block.
    pub fn predecessors(&self, addr: Addr) -> Vec<(BlockEdge, &Block<'a>)> {
        self.neighbors(addr, Direction::Incoming)
    }

    fn neighbors(&self, addr: Addr, dir: Direction) -> Vec<(BlockEdge, &Block<'a>)> {
        let Some(id) = self.block_id_at(addr) else {
            return Vec::new();
        };
        let mut res: Vec<(BlockEdge, &Block<'a>)> = self
            .inner
            .edges_directed(id, dir)
            .map(|edge| {
                let other = match dir {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (*edge.weight(), &self.inner[other])
            })
            .collect();
        // petgraph lists edges in reverse insertion order
        res.reverse();
        res
    }

    pub fn regions(&self) -> &[ExceptionRegion] {
        &self.regions
    }

    /// Exception region attached to the block containing `addr`.
    pub fn region_of(&self, addr: Addr) -> Option<&ExceptionRegion> {
        let block = self.block_at(addr)?;
        block.region.map(|idx| &self.regions[idx])
    }

    /// First region matching `[start, end)` with the loose matching of
    /// [`ExceptionRegion::matches`].
    pub fn lookup_region(&self, start: Addr, end: Addr) -> Option<&ExceptionRegion> {
        exceptions::lookup(&self.regions, start, end).map(|idx| &self.regions[idx])
    }
}

// Block leaders are the offsets where a new block must start:
//   - targets of branching instructions
//   - starts of try ranges
//   - exception handlers entry points
// The instruction following a branch is handled while splitting.
fn compute_block_leaders(code: &Code, method: &MethodRef) -> BTreeSet<Addr> {
    let mut leaders = BTreeSet::new();

    for instr in code.instructions() {
        if instr.is_invalid() {
            log::warn!(
                "{}: skipping invalid instruction at {:x} ({})",
                method,
                instr.addr(),
                instr
            );
            continue;
        }
        if instr.is_branch() {
            leaders.extend(instr.branch_targets());
        }
    }

    for try_ in code.tries() {
        leaders.insert(try_.start);
        leaders.extend(try_.handlers.iter().map(|handler| handler.addr));
    }

    leaders
}

fn split_into_blocks<'a>(code: &'a Code, leaders: &BTreeSet<Addr>) -> Vec<Block<'a>> {
    let instrs = code.instructions();
    let mut blocks = Vec::new();
    let mut first = 0;

    for (i, instr) in instrs.iter().enumerate() {
        let after_branch = i > 0 && instrs[i - 1].is_branch();
        if i > first && (after_branch || leaders.contains(&instr.addr())) {
            blocks.push(make_block(&instrs[first..i]));
            first = i;
        }
    }
    if first < instrs.len() {
        blocks.push(make_block(&instrs[first..]));
    }

    blocks
}

fn make_block(instrs: &[Instruction]) -> Block<'_> {
    // slices are never empty here
    let start = instrs[0].addr();
    let end = instrs[instrs.len() - 1].next_addr();
    Block {
        start,
        end,
        instrs,
        region: None,
    }
}
