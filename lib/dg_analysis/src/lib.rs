//! This crate provides the control flow and call graph construction
//! algorithms of the `DroidGraph` project.
//!
//! Analyses run in a fixed order, enforced by the types:
//!  1. a [`repo::Repo`] indexes the whole image: classes hierarchy, then
//!     one [`controlflow::MethodGraph`] per in-scope method body,
//!  2. a [`callgraph::CallGraph`] is built from the complete repository,
//!     then optionally linked with the [`lifecycle`] of the components,
//!  3. a [`xref::XrefIndex`] is built from the repository and the call graph.

pub mod callbacks;
pub mod callgraph;
pub mod controlflow;
pub mod errors;
pub mod exceptions;
pub mod hierarchy;
pub mod lifecycle;
pub mod repo;
pub mod stats;
pub mod xref;

#[cfg(test)]
mod testutils;
