//! Whole analysis of an image, phases chained in order.

use crate::errors::DgResult;
use crate::options::Options;
use dg_analysis::callgraph::CallGraph;
use dg_analysis::repo::Repo;
use dg_analysis::xref::XrefIndex;
use dg_code::Image;

/// Results of [`run`].
pub struct Analysis<'a> {
    pub repo: Repo<'a>,
    pub callgraph: CallGraph,
    pub xrefs: Option<XrefIndex>,
}

impl<'a> Analysis<'a> {
    /// Sorted edge list of the call graph.
    #[must_use]
    pub fn export_edges(&self) -> Vec<String> {
        self.callgraph.export_edges()
    }
}

/// Indexes the image, builds the call graph then the cross references.
///
/// The only fatal conditions are bad options, an unreadable registration
/// table and an image without any class. Unresolvable references inside
/// the image only lead to a partial graph.
pub fn run<'a>(image: &'a Image, options: &Options) -> DgResult<Analysis<'a>> {
    options.check()?;
    let boundary = options.boundary()?;
    let registrations = options.registrations()?;
    let filter = options.node_filter()?;

    log::info!(
        "analysing {} classes, {} methods",
        image.nb_classes(),
        image.nb_methods()
    );

    let repo = match options.nb_jobs() {
        Some(jobs) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
            pool.install(|| Repo::new(image, boundary))?
        }
        None => Repo::new(image, boundary)?,
    };
    log::info!("{} method graphs built", repo.nb_method_graphs());

    let mut callgraph = repo.build_callgraph(registrations.as_ref());
    let components = options.components(&repo);
    if !components.is_empty() {
        callgraph.link_components(&repo, &components);
        log::info!(
            "{} components linked, {} entry points",
            components.len(),
            callgraph.entry_nodes().len()
        );
    }
    log::info!("callgraph: {}", callgraph.stats());

    let xrefs = options.computes_xrefs().then(|| repo.build_xrefs(&callgraph));

    let callgraph = match filter {
        Some(predicate) => {
            let filtered = callgraph.filter(predicate);
            log::info!("filtered callgraph: {}", filtered.stats());
            filtered
        }
        None => callgraph,
    };

    Ok(Analysis {
        repo,
        callgraph,
        xrefs,
    })
}
