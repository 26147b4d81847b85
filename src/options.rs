//! Analysis pipeline configuration.

use crate::errors::{DgError, DgResult};
use dg_analysis::callbacks::RegistrationTable;
use dg_analysis::callgraph::CallNode;
use dg_analysis::lifecycle::{Component, ComponentKind, ComponentTable};
use dg_analysis::repo::{FrameworkBoundary, Repo, ANDROID_PREFIXES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options of the [`run`](crate::run) pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    framework_prefixes: Vec<String>,
    registrations: Option<PathBuf>,
    skip_xrefs: bool,
    components: Vec<Component>,
    skip_component_inference: bool,
    filter_class: Option<String>,
    filter_method: Option<String>,
    jobs: Option<usize>,
}

/// Default values use the Android platform boundary, no registration table,
/// infer components from the hierarchy and compute cross references.
impl Default for Options {
    fn default() -> Self {
        Self {
            framework_prefixes: ANDROID_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            registrations: None,
            skip_xrefs: false,
            components: Vec::new(),
            skip_component_inference: false,
            filter_class: None,
            filter_method: None,
            jobs: None,
        }
    }
}

impl Options {
    /// Replaces the framework package prefixes.
    #[must_use]
    pub fn with_framework_prefixes<S: AsRef<str>>(self, prefixes: &[S]) -> Self {
        Self {
            framework_prefixes: prefixes.iter().map(|p| p.as_ref().to_string()).collect(),
            ..self
        }
    }

    /// Resolves implicit callbacks with the registration table stored in
    /// the given file.
    #[must_use]
    pub fn with_registrations<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            registrations: Some(path.as_ref().to_path_buf()),
            ..self
        }
    }

    #[must_use]
    pub fn dont_compute_xrefs(self) -> Self {
        Self {
            skip_xrefs: true,
            ..self
        }
    }

    /// Declares an application component, as listed in its manifest.
    #[must_use]
    pub fn with_component(mut self, class_name: &str, kind: ComponentKind) -> Self {
        self.components.push(Component::new(class_name, kind));
        self
    }

    /// Links only the declared components.
    #[must_use]
    pub fn dont_infer_components(self) -> Self {
        Self {
            skip_component_inference: true,
            ..self
        }
    }

    /// Keeps in the resulting call graph only the paths leading to methods
    /// whose class name matches the pattern.
    #[must_use]
    pub fn filter_class(self, pattern: &str) -> Self {
        Self {
            filter_class: Some(pattern.to_string()),
            ..self
        }
    }

    /// Keeps in the resulting call graph only the paths leading to methods
    /// whose name matches the pattern.
    #[must_use]
    pub fn filter_method(self, pattern: &str) -> Self {
        Self {
            filter_method: Some(pattern.to_string()),
            ..self
        }
    }

    /// Number of worker threads used to build the method graphs.
    #[must_use]
    pub fn jobs(self, jobs: usize) -> Self {
        Self {
            jobs: Some(jobs),
            ..self
        }
    }

    #[inline]
    pub fn framework_prefixes(&self) -> &[String] {
        &self.framework_prefixes
    }

    #[inline]
    pub fn computes_xrefs(&self) -> bool {
        !self.skip_xrefs
    }

    #[inline]
    pub fn nb_jobs(&self) -> Option<usize> {
        self.jobs
    }

    pub fn boundary(&self) -> DgResult<FrameworkBoundary> {
        Ok(FrameworkBoundary::from_prefixes(&self.framework_prefixes)?)
    }

    /// Components to link: the inferred ones (unless disabled), then the
    /// declared ones, which take precedence.
    pub fn components(&self, repo: &Repo) -> ComponentTable {
        let mut table = if self.skip_component_inference {
            ComponentTable::new()
        } else {
            ComponentTable::infer(repo)
        };
        for component in &self.components {
            table.insert(component.clone());
        }
        table
    }

    pub fn registrations(&self) -> DgResult<Option<RegistrationTable>> {
        let Some(path) = &self.registrations else {
            return Ok(None);
        };
        Ok(Some(RegistrationTable::open(path)?))
    }

    /// Node predicate built from the class and method filters, `None` when
    /// no filter is set.
    pub fn node_filter(&self) -> DgResult<Option<impl Fn(&CallNode) -> bool>> {
        if self.filter_class.is_none() && self.filter_method.is_none() {
            return Ok(None);
        }
        let class_pattern = self.filter_class.as_deref().map(Regex::new).transpose()?;
        let method_pattern = self.filter_method.as_deref().map(Regex::new).transpose()?;
        log::debug!(
            "filtering callgraph on class pattern {:?}, method pattern {:?}",
            class_pattern,
            method_pattern
        );
        Ok(Some(move |node: &CallNode| {
            let method = node.method();
            class_pattern
                .as_ref()
                .map_or(true, |re| re.is_match(method.class_name()))
                && method_pattern
                    .as_ref()
                    .map_or(true, |re| re.is_match(method.name()))
        }))
    }

    pub(crate) fn check(&self) -> DgResult<()> {
        if self.jobs == Some(0) {
            return Err(DgError::BadOptions(
                "at least one job is needed".to_string(),
            ));
        }
        Ok(())
    }
}
