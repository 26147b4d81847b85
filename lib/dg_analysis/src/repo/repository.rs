//! A repository to centralize the analysed image and its per-method graphs.

use crate::callbacks::RegistrationTable;
use crate::callgraph::CallGraph;
use crate::controlflow::MethodGraph;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::hierarchy::Hierarchy;
use crate::repo::FrameworkBoundary;
use crate::xref::XrefIndex;
use dg_code::{ClassDef, FieldDef, FieldRef, Image, MethodDef, MethodRef};
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;

/// Immutable whole-program view. The hierarchy and every method graph are
/// complete once [`Repo::new`] returns, so call resolution always sees
/// complete subclass sets.
pub struct Repo<'a> {
    image: &'a Image,
    boundary: FrameworkBoundary,
    hierarchy: Hierarchy,
    graphs: BTreeMap<MethodRef, MethodGraph<'a>>,
}

impl<'a> Repo<'a> {
    pub fn new(image: &'a Image, boundary: FrameworkBoundary) -> AnalysisResult<Self> {
        if image.is_empty() {
            return Err(AnalysisError::EmptyImage);
        }

        let hierarchy = Hierarchy::build(image, &boundary);

        let bodies: Vec<(MethodRef, &'a MethodDef)> = image
            .iter_classes()
            .filter(|class| {
                let framework = boundary.contains(&class.name);
                if framework {
                    log::trace!("skipping framework class '{}'", class.name);
                }
                !framework
            })
            .flat_map(|class| class.iter_method_refs())
            .filter(|(_, method)| method.has_code())
            .collect();

        let graphs = bodies
            .into_par_iter()
            .map(|(method_ref, method)| {
                let graph = MethodGraph::build(method_ref.clone(), method)?;
                Ok((method_ref, graph))
            })
            .collect::<AnalysisResult<Vec<_>>>()?
            .into_iter()
            .collect::<BTreeMap<_, _>>();

        log::debug!(
            "repository: {} classes, {} methods, {} method graphs",
            image.nb_classes(),
            image.nb_methods(),
            graphs.len()
        );

        Ok(Self {
            image,
            boundary,
            hierarchy,
            graphs,
        })
    }

    #[inline]
    #[must_use]
    pub const fn image(&self) -> &'a Image {
        self.image
    }

    #[inline]
    #[must_use]
    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[inline]
    #[must_use]
    pub const fn boundary(&self) -> &FrameworkBoundary {
        &self.boundary
    }

    #[inline]
    pub fn is_framework(&self, class_name: &str) -> bool {
        self.boundary.contains(class_name)
    }

    pub fn get_class(&self, name: &str) -> Option<&'a ClassDef> {
        self.image.get_class(name)
    }

    /// Method declared by exactly the referenced class.
    pub fn find_method(&self, method: &MethodRef) -> Option<&'a MethodDef> {
        self.get_class(method.class_name())?
            .find_method(method.name(), method.descriptor())
    }

    /// Field declared by exactly the referenced class.
    pub fn find_field(&self, field: &FieldRef) -> Option<&'a FieldDef> {
        self.get_class(field.class_name())?.find_field(field.name())
    }

    pub fn find_classes<'r>(
        &'r self,
        pattern: &'r Regex,
    ) -> impl Iterator<Item = &'a ClassDef> + 'r {
        self.image
            .iter_classes()
            .filter(move |class| pattern.is_match(&class.name))
    }

    #[inline]
    pub fn method_graph(&self, method: &MethodRef) -> Option<&MethodGraph<'a>> {
        self.graphs.get(method)
    }

    #[inline]
    pub fn has_method_graph(&self, method: &MethodRef) -> bool {
        self.graphs.contains_key(method)
    }

    /// Method graphs, ordered by method reference.
    pub fn iter_method_graphs(&self) -> impl Iterator<Item = &MethodGraph<'a>> {
        self.graphs.values()
    }

    #[inline]
    pub fn nb_method_graphs(&self) -> usize {
        self.graphs.len()
    }

    pub fn build_callgraph(&self, registrations: Option<&RegistrationTable>) -> CallGraph {
        CallGraph::build(self, registrations)
    }

    pub fn build_xrefs(&self, callgraph: &CallGraph) -> XrefIndex {
        XrefIndex::build(self, callgraph)
    }
}
