//! Classes hierarchy graph representation.
//!
//! Nodes are classes, edges go from a class to its superclass
//! ([`Inheritance::Extends`]) or to one of its interfaces
//! ([`Inheritance::Implements`]). Subclass sets are the incoming edges, so
//! they are only complete once every class of the image has been inserted.

use crate::repo::FrameworkBoundary;
use dg_code::Image;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Inheritance {
    Extends,
    Implements,
}

impl fmt::Display for Inheritance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Extends => write!(f, "<extends>"),
            Self::Implements => write!(f, "<implements>"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassNode {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    defined: bool,
    framework: bool,
}

impl ClassNode {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(String::as_str)
    }

    /// Whether the class is defined in the image, as opposed to only being
    /// referenced as a superclass or an interface.
    #[inline]
    pub fn is_defined(&self) -> bool {
        self.defined
    }

    #[inline]
    pub fn is_framework(&self) -> bool {
        self.framework
    }
}

#[derive(Debug)]
pub struct Hierarchy {
    inner: DiGraph<ClassNode, Inheritance>,
    node_ids: BTreeMap<String, NodeIndex>,
}

impl Hierarchy {
    /// Indexes every class of the image, then links them. Classes that are
    /// only referenced get a node without definition.
    pub fn build(image: &Image, boundary: &FrameworkBoundary) -> Self {
        let mut hierarchy = Self {
            inner: DiGraph::new(),
            node_ids: BTreeMap::new(),
        };

        for class in image.iter_classes() {
            hierarchy.insert_class(ClassNode {
                name: class.name.clone(),
                superclass: class.superclass.clone(),
                interfaces: class.interfaces.clone(),
                defined: true,
                framework: boundary.contains(&class.name),
            });
        }

        for class in image.iter_classes() {
            if let Some(superclass) = &class.superclass {
                hierarchy.insert_link(&class.name, superclass, Inheritance::Extends, boundary);
            }
            for interface in &class.interfaces {
                hierarchy.insert_link(&class.name, interface, Inheritance::Implements, boundary);
            }
        }

        log::debug!(
            "hierarchy: {} classes ({} referenced only), {} links",
            hierarchy.inner.node_count(),
            hierarchy.inner.node_weights().filter(|c| !c.defined).count(),
            hierarchy.inner.edge_count()
        );
        hierarchy
    }

    fn insert_class(&mut self, class: ClassNode) -> NodeIndex {
        let name = class.name.clone();
        let id = self.inner.add_node(class);
        self.node_ids.insert(name, id);
        id
    }

    fn insert_link(
        &mut self,
        from: &str,
        to: &str,
        link: Inheritance,
        boundary: &FrameworkBoundary,
    ) {
        let src = self.node_ids[from];
        let dst = match self.node_ids.get(to) {
            Some(id) => *id,
            None => {
                log::trace!("class {to} referenced by {from} is not defined");
                self.insert_class(ClassNode {
                    name: to.to_string(),
                    superclass: None,
                    interfaces: Vec::new(),
                    defined: false,
                    framework: boundary.contains(to),
                })
            }
        };
        self.inner.add_edge(src, dst, link);
    }

    #[must_use]
    pub fn get_class(&self, class_name: &str) -> Option<&ClassNode> {
        self.node_ids.get(class_name).map(|id| &self.inner[*id])
    }

    #[inline]
    pub fn contains_class(&self, class_name: &str) -> bool {
        self.node_ids.contains_key(class_name)
    }

    pub fn iter_classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.node_ids.values().map(move |id| &self.inner[*id])
    }

    #[inline]
    pub fn nb_classes(&self) -> usize {
        self.inner.node_count()
    }

    /// Classes directly extending or implementing `class_name`.
    #[must_use]
    pub fn subclasses(&self, class_name: &str) -> BTreeSet<&str> {
        let Some(id) = self.node_ids.get(class_name) else {
            return BTreeSet::new();
        };
        self.inner
            .edges_directed(*id, Direction::Incoming)
            .map(|edge| self.inner[edge.source()].name())
            .collect()
    }

    /// Walks up the superclass links, starting with `class_name` itself.
    ///
    /// The walk stops at the first class that is not indexed (after
    /// yielding its name) or when a class is visited twice.
    pub fn superclass_chain<'h>(&'h self, class_name: &'h str) -> SuperclassChain<'h> {
        SuperclassChain {
            hierarchy: self,
            next: Some(class_name),
            visited: BTreeSet::new(),
        }
    }

    /// Every transitive subclass of `class_name`, breadth first, without
    /// `class_name` itself.
    #[must_use]
    pub fn descendants(&self, class_name: &str) -> Vec<&str> {
        let mut res = Vec::new();
        let Some(start) = self.node_ids.get(class_name) else {
            return res;
        };
        let mut visited = BTreeSet::from([*start]);
        let mut queue = VecDeque::from([*start]);
        while let Some(id) = queue.pop_front() {
            let mut children: Vec<NodeIndex> = self
                .inner
                .edges_directed(id, Direction::Incoming)
                .map(|edge| edge.source())
                .collect();
            children.sort_by(|a, b| self.inner[*a].name.cmp(&self.inner[*b].name));
            for child in children {
                if visited.insert(child) {
                    res.push(self.inner[child].name());
                    queue.push_back(child);
                }
            }
        }
        res
    }

    /// Whether `ancestor` is reachable from `class_name` through extends or
    /// implements links. A class is not its own subclass.
    #[must_use]
    pub fn is_subclass_of(&self, class_name: &str, ancestor: &str) -> bool {
        let (Some(start), Some(target)) =
            (self.node_ids.get(class_name), self.node_ids.get(ancestor))
        else {
            return false;
        };
        let mut visited = BTreeSet::from([*start]);
        let mut todo = vec![*start];
        while let Some(id) = todo.pop() {
            for parent in self.inner.neighbors_directed(id, Direction::Outgoing) {
                if parent == *target {
                    return true;
                }
                if visited.insert(parent) {
                    todo.push(parent);
                }
            }
        }
        false
    }
}

/// Iterator returned by [`Hierarchy::superclass_chain`].
pub struct SuperclassChain<'h> {
    hierarchy: &'h Hierarchy,
    next: Option<&'h str>,
    visited: BTreeSet<&'h str>,
}

impl<'h> Iterator for SuperclassChain<'h> {
    type Item = &'h str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if !self.visited.insert(current) {
            log::debug!("superclass cycle detected on {current}");
            return None;
        }
        self.next = self
            .hierarchy
            .get_class(current)
            .and_then(ClassNode::superclass);
        Some(current)
    }
}
