//! Interprocedural graph of the calls between the basic blocks of the
//! application methods.
//!
//! Nodes are either the block of a method (caller blocks and callee entry
//! blocks) or a placeholder standing for a framework method. Framework code
//! is never expanded: every call crossing the boundary ends on the
//! placeholder of the first framework class found while walking up the
//! callee class hierarchy.
//!
//! Virtual calls are over-approximated: once a call resolves to a declaring
//! class, every override found among its transitive subclasses is also a
//! target, whether or not intermediate classes override the method.

use crate::callbacks::{self, RegistrationTable};
use crate::controlflow::EdgeKind;
use crate::lifecycle::{self, ComponentTable};
use crate::repo::Repo;
use crate::stats::CallGraphStats;
use dg_code::{Addr, InstrKind, MethodRef};
use petgraph::prelude::*;
use petgraph::visit::{Dfs, Reversed};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CallKind {
    /// Call to the method resolved from the callee reference, possibly
    /// inherited from an ancestor.
    Direct,
    /// Call to an override found in a subclass of the resolved class.
    VirtualResolved,
    /// Call crossing the framework boundary.
    FrameworkBridge,
    /// Framework call back into the application, triggered by a
    /// registration call.
    ImplicitCallback,
    /// Framework driving a component from one lifecycle callback to the
    /// next.
    Lifecycle,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::VirtualResolved => write!(f, "virtual"),
            Self::FrameworkBridge => write!(f, "framework"),
            Self::ImplicitCallback => write!(f, "callback"),
            Self::Lifecycle => write!(f, "lifecycle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CallNode {
    /// Basic block of an application method, identified by its start.
    Block(MethodRef, Addr),
    /// Framework method summary.
    Placeholder(MethodRef),
}

impl fmt::Display for CallNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Block(method, addr) => write!(f, "{}@0x{:x}", method.signature(), addr),
            Self::Placeholder(method) => write!(f, "{}0x0000", method.signature()),
        }
    }
}

impl CallNode {
    #[inline]
    pub fn method(&self) -> &MethodRef {
        match self {
            Self::Block(method, _) | Self::Placeholder(method) => method,
        }
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Identifier used in edge exports.
    #[must_use]
    pub fn id(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Call {
    /// Offset of the invoke instruction in the caller.
    pub site: Addr,
    pub kind: CallKind,
}

/// A call site and one of the methods it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ResolvedCall {
    pub caller: MethodRef,
    /// Start of the caller block containing the call site.
    pub block: Addr,
    pub site: Addr,
    pub callee: MethodRef,
    pub kind: CallKind,
}

/// One edge leaving a basic block, either inside its method or towards
/// another call graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Successor {
    pub site: Addr,
    pub kind: EdgeKind,
    pub target: CallNode,
}

/// Outcome of walking up the callee class hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// Declared by an application (or unknown scope) class.
    Method(MethodRef),
    /// First framework class met on the way.
    Framework(MethodRef),
    Unresolved,
}

/// Walks up the superclass chain of the callee class until it finds a
/// framework class or a class declaring the method.
pub(crate) fn resolve(repo: &Repo, callee: &MethodRef) -> Resolution {
    for class in repo.hierarchy().superclass_chain(callee.class_name()) {
        if repo.is_framework(class) {
            return Resolution::Framework(callee.with_class(class));
        }
        let declared = repo
            .get_class(class)
            .and_then(|def| def.find_method(callee.name(), callee.descriptor()));
        if declared.is_some() {
            return Resolution::Method(callee.with_class(class));
        }
    }
    Resolution::Unresolved
}

/// Node of the entry block of `method`, `None` when the method has no
/// graph or an empty body.
pub(crate) fn entry_node(repo: &Repo, method: &MethodRef) -> Option<CallNode> {
    repo.method_graph(method)?
        .block_starting_at(Addr::entry())
        .map(|block| CallNode::Block(method.clone(), block.start()))
}

#[derive(Debug, Clone)]
pub struct CallGraph {
    inner: DiGraph<CallNode, Call>,
    node_ids: BTreeMap<CallNode, NodeIndex>,
    resolved: Vec<ResolvedCall>,
    entries: Vec<CallNode>,
}

impl Default for CallGraph {
    fn default() -> Self {
        Self {
            inner: DiGraph::new(),
            node_ids: BTreeMap::new(),
            resolved: Vec::new(),
            entries: Vec::new(),
        }
    }
}

impl CallGraph {
    /// Resolves every invoke instruction of every method graph of the
    /// repository. When a registration table is given, implicit callback
    /// edges are added as well.
    pub fn build(repo: &Repo, registrations: Option<&RegistrationTable>) -> Self {
        let mut cg = Self::default();

        for graph in repo.iter_method_graphs() {
            for block in graph.iter_blocks() {
                for instr in block.instructions() {
                    let InstrKind::Invoke(callee) = instr.kind() else {
                        continue;
                    };
                    let caller = CallNode::Block(graph.method().clone(), block.start());
                    cg.add_explicit_call(repo, &caller, instr.addr(), callee);
                    if let Some(table) = registrations {
                        callbacks::add_implicit_calls(
                            &mut cg,
                            repo,
                            table,
                            &caller,
                            instr.addr(),
                            callee,
                        );
                    }
                }
            }
        }

        log::debug!(
            "callgraph: {} nodes, {} edges, {} resolved calls",
            cg.inner.node_count(),
            cg.inner.edge_count(),
            cg.resolved.len()
        );
        cg
    }

    fn add_explicit_call(
        &mut self,
        repo: &Repo,
        caller: &CallNode,
        site: Addr,
        callee: &MethodRef,
    ) {
        match resolve(repo, callee) {
            Resolution::Unresolved => {
                log::trace!("{caller}: call at {site:x} to {callee} is unresolved");
            }
            Resolution::Framework(target) => {
                self.add_call(
                    caller,
                    CallNode::Placeholder(target.clone()),
                    site,
                    CallKind::FrameworkBridge,
                );
                self.record(caller, site, target, CallKind::FrameworkBridge);
            }
            Resolution::Method(target) => {
                if let Some(entry) = entry_node(repo, &target) {
                    self.add_call(caller, entry, site, CallKind::Direct);
                }
                self.record(caller, site, target.clone(), CallKind::Direct);

                for class in repo.hierarchy().descendants(target.class_name()) {
                    let candidate = target.with_class(class);
                    if let Some(entry) = entry_node(repo, &candidate) {
                        self.add_call(caller, entry, site, CallKind::VirtualResolved);
                        self.record(caller, site, candidate, CallKind::VirtualResolved);
                    }
                }
            }
        }
    }

    fn record(&mut self, caller: &CallNode, site: Addr, callee: MethodRef, kind: CallKind) {
        let CallNode::Block(method, block) = caller else {
            return;
        };
        self.resolved.push(ResolvedCall {
            caller: method.clone(),
            block: *block,
            site,
            callee,
            kind,
        });
    }

    fn node_id(&mut self, node: CallNode) -> NodeIndex {
        if let Some(id) = self.node_ids.get(&node) {
            return *id;
        }
        let id = self.inner.add_node(node.clone());
        self.node_ids.insert(node, id);
        id
    }

    /// Chains the lifecycle callbacks of every component, see
    /// [`lifecycle`](crate::lifecycle).
    pub fn link_components(&mut self, repo: &Repo, components: &ComponentTable) {
        lifecycle::add_lifecycle_calls(self, repo, components);
    }

    pub(crate) fn add_entry(&mut self, node: CallNode) {
        if !self.entries.contains(&node) {
            self.entries.push(node);
        }
    }

    /// First lifecycle callback of each linked component, in linking order.
    pub fn entry_nodes(&self) -> &[CallNode] {
        &self.entries
    }

    /// Adds an edge, creating (or reusing) both end nodes.
    pub(crate) fn add_call(&mut self, src: &CallNode, dst: CallNode, site: Addr, kind: CallKind) {
        let src = self.node_id(src.clone());
        let dst = self.node_id(dst);
        self.inner.add_edge(src, dst, Call { site, kind });
    }

    #[inline]
    pub fn nb_nodes(&self) -> usize {
        self.inner.node_count()
    }

    #[inline]
    pub fn nb_edges(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn nb_placeholders(&self) -> usize {
        self.node_ids.keys().filter(|node| node.is_placeholder()).count()
    }

    pub fn contains_node(&self, node: &CallNode) -> bool {
        self.node_ids.contains_key(node)
    }

    /// Nodes in a stable order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.node_ids.keys()
    }

    /// Every edge as `(source, target, call)`, in insertion order.
    pub fn iter_edges(&self) -> impl Iterator<Item = (&CallNode, &CallNode, &Call)> {
        self.inner.edge_references().map(move |edge| {
            (
                &self.inner[edge.source()],
                &self.inner[edge.target()],
                edge.weight(),
            )
        })
    }

    /// Edges leaving `node`, in insertion order.
    pub fn calls_from(&self, node: &CallNode) -> Vec<(&CallNode, Call)> {
        let Some(id) = self.node_ids.get(node) else {
            return Vec::new();
        };
        let mut res: Vec<(&CallNode, Call)> = self
            .inner
            .edges_directed(*id, Outgoing)
            .map(|edge| (&self.inner[edge.target()], *edge.weight()))
            .collect();
        res.reverse();
        res
    }

    /// Edges entering `node`, in insertion order.
    pub fn calls_to(&self, node: &CallNode) -> Vec<(&CallNode, Call)> {
        let Some(id) = self.node_ids.get(node) else {
            return Vec::new();
        };
        let mut res: Vec<(&CallNode, Call)> = self
            .inner
            .edges_directed(*id, Incoming)
            .map(|edge| (&self.inner[edge.source()], *edge.weight()))
            .collect();
        res.reverse();
        res
    }

    /// Call sites together with the methods they resolved to, including
    /// resolved targets without a body (hence without edge).
    pub fn resolved_calls(&self) -> &[ResolvedCall] {
        &self.resolved
    }

    /// Every edge leaving the block of `method` containing `addr`: jumps and
    /// fallthroughs first, then calls.
    pub fn successors(&self, repo: &Repo, method: &MethodRef, addr: Addr) -> Vec<Successor> {
        let Some(graph) = repo.method_graph(method) else {
            return Vec::new();
        };
        let Some(block) = graph.block_at(addr) else {
            return Vec::new();
        };
        let mut res: Vec<Successor> = graph
            .successors(block.start())
            .into_iter()
            .map(|(edge, target)| Successor {
                site: edge.site,
                kind: edge.kind(),
                target: CallNode::Block(method.clone(), target.start()),
            })
            .collect();
        let node = CallNode::Block(method.clone(), block.start());
        res.extend(self.calls_from(&node).into_iter().map(|(target, call)| Successor {
            site: call.site,
            kind: EdgeKind::Inter(call.kind),
            target: target.clone(),
        }));
        res
    }

    /// One `"src" -> "dst"` line per edge, sorted.
    #[must_use]
    pub fn export_edges(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .iter_edges()
            .map(|(src, dst, _)| format!("\"{src}\" -> \"{dst}\""))
            .collect();
        lines.sort();
        lines
    }

    pub fn write_edges<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for line in self.export_edges() {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }

    /// Keeps only the nodes lying on a path leading to a node matching
    /// `predicate`.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&CallNode) -> bool,
    {
        // Since we remove nodes while keeping ids collection,
        // we need to switch to the stable graph representation so
        // that ids are preserved.
        let mut stable_graph: StableDiGraph<_, _> = self.inner.clone().into();

        let mut to_remove: BTreeSet<NodeIndex> = stable_graph.node_indices().collect();

        // backward traversal from matching nodes
        let reversed = Reversed(&stable_graph);
        let mut dfs = Dfs::empty(reversed);
        for id in stable_graph.node_indices() {
            if predicate(&stable_graph[id]) {
                dfs.move_to(id);
                while let Some(keep_id) = dfs.next(reversed) {
                    to_remove.remove(&keep_id);
                }
            }
        }

        stable_graph.retain_nodes(|_, id| !to_remove.contains(&id));

        let inner: DiGraph<CallNode, Call> = stable_graph.into();
        let node_ids: BTreeMap<CallNode, NodeIndex> = inner
            .node_indices()
            .map(|id| (inner[id].clone(), id))
            .collect();
        let resolved = self
            .resolved
            .iter()
            .filter(|call| {
                node_ids.contains_key(&CallNode::Block(call.caller.clone(), call.block))
            })
            .cloned()
            .collect();
        let entries = self
            .entries
            .iter()
            .filter(|node| node_ids.contains_key(*node))
            .cloned()
            .collect();

        Self {
            inner,
            node_ids,
            resolved,
            entries,
        }
    }

    pub fn stats(&self) -> CallGraphStats {
        CallGraphStats::compute(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::FrameworkBoundary;
    use crate::testutils::*;
    use dg_code::{ClassDef, Image, MethodDef};

    fn block(class: &str, name: &str, addr: u32) -> CallNode {
        CallNode::Block(MethodRef::new(class, name, "()V"), Addr(addr))
    }

    fn entry(class: &str, name: &str) -> CallNode {
        block(class, name, 0)
    }

    fn placeholder(class: &str, name: &str, descriptor: &str) -> CallNode {
        CallNode::Placeholder(MethodRef::new(class, name, descriptor))
    }

    fn kinds_to(cg: &CallGraph, node: &CallNode) -> Vec<CallKind> {
        cg.calls_to(node).into_iter().map(|(_, call)| call.kind).collect()
    }

    fn virtual_image() -> Image {
        Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .extends("Ljava/lang/Object;")
                    .with_method(method_calling("run", &[("Lapp/A;", "m", "()V")])),
            )
            .with_class(
                ClassDef::new("Lapp/A;")
                    .extends("Ljava/lang/Object;")
                    .with_method(method_returning("m")),
            )
            .with_class(
                ClassDef::new("Lapp/B;")
                    .extends("Lapp/A;")
                    .with_method(method_returning("m")),
            )
            .with_class(
                ClassDef::new("Lapp/C;")
                    .extends("Lapp/B;")
                    .with_method(method_returning("m")),
            )
    }

    #[test]
    fn virtual_fanout() {
        let image = virtual_image();
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        let caller = entry("Lapp/Main;", "run");
        let targets: Vec<(CallNode, CallKind)> = cg
            .calls_from(&caller)
            .into_iter()
            .map(|(node, call)| (node.clone(), call.kind))
            .collect();
        assert_eq!(
            targets,
            vec![
                (entry("Lapp/A;", "m"), CallKind::Direct),
                (entry("Lapp/B;", "m"), CallKind::VirtualResolved),
                (entry("Lapp/C;", "m"), CallKind::VirtualResolved),
            ]
        );
        assert!(cg.calls_from(&caller).iter().all(|(_, call)| call.site == Addr(0)));
    }

    #[test]
    fn fanout_does_not_stop_at_missing_override() {
        // only the grandchild overrides m
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling("run", &[("Lapp/A;", "m", "()V")])),
            )
            .with_class(ClassDef::new("Lapp/A;").with_method(method_returning("m")))
            .with_class(ClassDef::new("Lapp/B;").extends("Lapp/A;"))
            .with_class(
                ClassDef::new("Lapp/C;")
                    .extends("Lapp/B;")
                    .with_method(method_returning("m")),
            )
            .with_class(
                ClassDef::new("Lapp/D;")
                    .extends("Lapp/C;")
                    .with_method(method_returning("m")),
            );
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        assert_eq!(kinds_to(&cg, &entry("Lapp/A;", "m")), vec![CallKind::Direct]);
        assert!(!cg.contains_node(&entry("Lapp/B;", "m")));
        assert_eq!(kinds_to(&cg, &entry("Lapp/C;", "m")), vec![CallKind::VirtualResolved]);
        assert_eq!(kinds_to(&cg, &entry("Lapp/D;", "m")), vec![CallKind::VirtualResolved]);
    }

    #[test]
    fn inherited_method() {
        // B inherits m from A, the call through B resolves to A
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling("run", &[("Lapp/B;", "m", "()V")])),
            )
            .with_class(ClassDef::new("Lapp/A;").with_method(method_returning("m")))
            .with_class(ClassDef::new("Lapp/B;").extends("Lapp/A;"));
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        assert_eq!(kinds_to(&cg, &entry("Lapp/A;", "m")), vec![CallKind::Direct]);
        assert_eq!(cg.resolved_calls().len(), 1);
        assert_eq!(cg.resolved_calls()[0].callee, MethodRef::new("Lapp/A;", "m", "()V"));
    }

    #[test]
    fn abstract_declaration_still_fans_out() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling("run", &[("Lapp/I;", "m", "()V")])),
            )
            .with_class(ClassDef::new("Lapp/I;").with_method(MethodDef::new("m", "()V", None)))
            .with_class(
                ClassDef::new("Lapp/Impl;")
                    .implements("Lapp/I;")
                    .with_method(method_returning("m")),
            );
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        assert!(!cg.contains_node(&entry("Lapp/I;", "m")));
        assert_eq!(
            kinds_to(&cg, &entry("Lapp/Impl;", "m")),
            vec![CallKind::VirtualResolved]
        );
    }

    #[test]
    fn empty_bodies_get_no_edge() {
        // A.m and B.m have a code item without any instruction
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling("run", &[("Lapp/A;", "m", "()V")])),
            )
            .with_class(ClassDef::new("Lapp/A;").with_method(method_with_body("m", "()V", vec![])))
            .with_class(
                ClassDef::new("Lapp/B;")
                    .extends("Lapp/A;")
                    .with_method(method_with_body("m", "()V", vec![])),
            )
            .with_class(
                ClassDef::new("Lapp/C;")
                    .extends("Lapp/B;")
                    .with_method(method_returning("m")),
            );
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        assert!(repo.has_method_graph(&MethodRef::new("Lapp/A;", "m", "()V")));
        assert!(!cg.contains_node(&entry("Lapp/A;", "m")));
        assert!(!cg.contains_node(&entry("Lapp/B;", "m")));
        assert_eq!(
            cg.export_edges(),
            vec!["\"Lapp/Main;run()V@0x0\" -> \"Lapp/C;m()V@0x0\"".to_string()]
        );
        // the direct resolution is still known to cross references
        assert_eq!(cg.resolved_calls()[0].callee, MethodRef::new("Lapp/A;", "m", "()V"));
    }

    #[test]
    fn framework_boundary() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .extends("Landroid/app/Activity;")
                    .with_method(method_calling(
                        "run",
                        &[
                            ("Landroid/util/Log;", "d", "(Ljava/lang/String;)I"),
                            ("Landroid/util/Log;", "d", "(Ljava/lang/String;)I"),
                        ],
                    ))
                    .with_method(method_calling(
                        "other",
                        &[("Landroid/util/Log;", "d", "(Ljava/lang/String;)I")],
                    )),
            )
            .with_class(ClassDef::new("Landroid/util/Log;").with_method(method_returning("d")));
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        let log = placeholder("Landroid/util/Log;", "d", "(Ljava/lang/String;)I");
        assert_eq!(cg.nb_placeholders(), 1);
        assert_eq!(kinds_to(&cg, &log), vec![CallKind::FrameworkBridge; 3]);
        assert!(cg
            .iter_edges()
            .all(|(_, _, call)| call.kind == CallKind::FrameworkBridge));
        assert_eq!(cg.nb_nodes(), 3);
        assert_eq!(cg.nb_edges(), 3);
    }

    #[test]
    fn inherited_framework_method() {
        // finish is not declared by the app class, the walk stops at the
        // first framework ancestor
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .extends("Lapp/Base;")
                    .with_method(method_calling("run", &[("Lapp/Main;", "finish", "()V")])),
            )
            .with_class(ClassDef::new("Lapp/Base;").extends("Landroid/app/Activity;"));
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        assert_eq!(
            kinds_to(&cg, &placeholder("Landroid/app/Activity;", "finish", "()V")),
            vec![CallKind::FrameworkBridge]
        );
    }

    #[test]
    fn unresolved_calls_are_dropped() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling(
                        "run",
                        &[("Lobf/a;", "b", "()V"), ("Lapp/X;", "m", "()V")],
                    )),
            )
            .with_class(ClassDef::new("Lapp/X;").extends("Lapp/Y;"))
            .with_class(ClassDef::new("Lapp/Y;").extends("Lapp/X;"));
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);
        assert_eq!(cg.nb_edges(), 0);
        assert!(cg.resolved_calls().is_empty());
    }

    #[test]
    fn cycle_safety() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/X;")
                    .extends("Lapp/Y;")
                    .with_method(method_calling("m", &[("Lapp/Y;", "n", "()V")])),
            )
            .with_class(
                ClassDef::new("Lapp/Y;")
                    .extends("Lapp/X;")
                    .with_method(method_calling("n", &[("Lapp/X;", "k", "()V")])),
            );
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        // Y.n resolves, with X as a subclass of Y that does not override it
        assert_eq!(kinds_to(&cg, &entry("Lapp/Y;", "n")), vec![CallKind::Direct]);
        // k exists nowhere in the cycle
        assert!(cg
            .resolved_calls()
            .iter()
            .all(|call| call.callee.name() != "k"));
    }

    #[test]
    fn unified_successors() {
        // 0: if -> 10 ; 2: invoke A.m ; 8: return ; 10: return
        let image = Image::new()
            .with_class(ClassDef::new("Lapp/Main;").with_method(method_with_code(
                "run",
                vec![
                    branch(InstrKind::If(Addr(10))),
                    invoke("Lapp/A;", "m", "()V"),
                    ret(),
                    ret(),
                ],
                vec![],
            )))
            .with_class(ClassDef::new("Lapp/A;").with_method(method_returning("m")));
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);
        let main = MethodRef::new("Lapp/Main;", "run", "()V");

        let succs = cg.successors(&repo, &main, Addr(0));
        let kinds: Vec<EdgeKind> = succs.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::Intra, EdgeKind::Intra]);

        let succs = cg.successors(&repo, &main, Addr(4));
        assert_eq!(succs.len(), 1);
        assert_eq!(succs[0].kind, EdgeKind::Inter(CallKind::Direct));
        assert_eq!(succs[0].site, Addr(2));
        assert_eq!(succs[0].target, entry("Lapp/A;", "m"));
    }

    #[test]
    fn export_is_sorted_and_stable() {
        let image = virtual_image();
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let first = repo.build_callgraph(None).export_edges();
        let second = repo.build_callgraph(None).export_edges();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "\"Lapp/Main;run()V@0x0\" -> \"Lapp/A;m()V@0x0\"".to_string(),
                "\"Lapp/Main;run()V@0x0\" -> \"Lapp/B;m()V@0x0\"".to_string(),
                "\"Lapp/Main;run()V@0x0\" -> \"Lapp/C;m()V@0x0\"".to_string(),
            ]
        );

        let mut buffer = Vec::new();
        repo.build_callgraph(None).write_edges(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 3);
    }

    #[test]
    fn placeholder_ids() {
        let node = placeholder("Landroid/util/Log;", "d", "(Ljava/lang/String;)I");
        assert_eq!(node.id(), "Landroid/util/Log;d(Ljava/lang/String;)I0x0000");
        assert_eq!(block("LA;", "m", 26).id(), "LA;m()V@0x1a");
    }

    #[test]
    fn filter_keeps_paths_to_matches() {
        let image = virtual_image()
            .with_class(
                ClassDef::new("Lapp/Other;")
                    .with_method(method_calling("go", &[("Lapp/B;", "m", "()V")])),
            );
        let repo = Repo::new(&image, FrameworkBoundary::android()).unwrap();
        let cg = repo.build_callgraph(None);

        let filtered = cg.filter(|node| node.method().class_name() == "Lapp/A;");
        assert!(filtered.contains_node(&entry("Lapp/Main;", "run")));
        assert!(filtered.contains_node(&entry("Lapp/A;", "m")));
        assert!(!filtered.contains_node(&entry("Lapp/Other;", "go")));
        assert!(!filtered.contains_node(&entry("Lapp/B;", "m")));
        assert_eq!(filtered.nb_edges(), 1);
        assert!(filtered
            .resolved_calls()
            .iter()
            .all(|call| call.caller.class_name() == "Lapp/Main;"));
    }
}
