//! # `DroidGraph`
//!
//! `droidgraph` is the main crate of the `DroidGraph` Android application
//! analysis project. It rebuilds the control flow of every method of a
//! decoded application image, then links methods together into an
//! interprocedural call graph, including the calls the Android framework
//! makes back into the application (listeners, lifecycle callbacks).
//!
//! The project is subdivided into multiple crates, `droidgraph` acts as
//! entry point by reexporting important structs and functions from those
//! sub-crates. Most of the reexport are done within the `droidgraph::prelude`
//! namespace.
//!
//! ## Library basics
//!
//! Decoding bytecode is not the job of this project: a decoder hands over
//! an [`Image`](dg_code::Image), the class table of the application, where
//! every instruction operand is already resolved.
//!
//! ```rust
//! use droidgraph::prelude::*;
//!
//! let body = Code::new(
//!     vec![
//!         Instruction::new(
//!             Addr(0),
//!             6,
//!             InstrKind::Invoke(MethodRef::new("Landroid/util/Log;", "d", "()I")),
//!         ),
//!         Instruction::new(Addr(6), 2, InstrKind::Return),
//!     ],
//!     vec![],
//! )?;
//! let image = Image::new().with_class(
//!     ClassDef::new("Lcom/example/Main;")
//!         .extends("Landroid/app/Activity;")
//!         .with_method(MethodDef::new("onCreate", "()V", Some(body))),
//! );
//!
//! let analysis = droidgraph::run(&image, &Options::default())?;
//! for line in analysis.export_edges() {
//!     println!("{line}");
//! }
//! # Ok::<(), DgError>(())
//! ```
//!
//! The phases can also be chained by hand through the [`Repo`] API:
//!
//! ```rust
//! use droidgraph::prelude::*;
//!
//! # let image = Image::new().with_class(ClassDef::new("Lcom/example/Main;"));
//! let repo = Repo::new(&image, FrameworkBoundary::android())?;
//! let callgraph = repo.build_callgraph(None);
//! let xrefs = repo.build_xrefs(&callgraph);
//! println!("{}", callgraph.stats());
//! # Ok::<(), DgError>(())
//! ```
//!
//! ## Sub-crates
//!
//!  - [`dg_code`] contains the decoded image data model (classes, methods,
//!    instructions, exception descriptors),
//!  - [`dg_analysis`] contains the analysis algorithms: basic blocks and
//!    exception regions, classes hierarchy, explicit and implicit call
//!    resolution, cross references.

mod errors;
mod options;
mod pipeline;

pub use dg_analysis as analysis;
pub use dg_code as code;

pub use options::Options;
pub use pipeline::{run, Analysis};

/// Options of [`prelude::init_logger`], usually filled from command line
/// flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Log everything (trace level).
    pub verbose: bool,
    /// Log up to debug level.
    pub debug: bool,
    /// Output logs in the Elastic Common Schema JSON format.
    pub ecslog: bool,
}

/// Reexport module of commonly used structures and functions from `DroidGraph` project
/// sub-crates:
///
/// ```rust
/// use droidgraph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{DgError, DgResult};
    pub use crate::{Analysis, LogOptions, Options};

    pub use dg_analysis::callbacks::{CallbackPosition, RegistrationTable};
    pub use dg_analysis::callgraph::{CallGraph, CallKind, CallNode};
    pub use dg_analysis::controlflow::{EdgeKind, MethodGraph};
    pub use dg_analysis::hierarchy::Hierarchy;
    pub use dg_analysis::lifecycle::{Component, ComponentKind, ComponentTable};
    pub use dg_analysis::repo::{FrameworkBoundary, Repo};
    pub use dg_analysis::xref::XrefIndex;

    pub use dg_code::{
        Addr, CatchHandler, ClassDef, Code, FieldDef, FieldRef, Image, InstrKind, Instruction,
        MethodDef, MethodRef, TryItem,
    };

    /// Configures the global logger from the `DG_LOG` and `DG_LOG_STYLE`
    /// environment variables (default level is `info`), then applies the
    /// given options.
    pub fn init_logger(options: &LogOptions) {
        let env = env_logger::Env::new()
            .filter_or("DG_LOG", "info")
            .write_style("DG_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if options.verbose {
            builder.filter_level(log::LevelFilter::Trace);
        } else if options.debug {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if options.ecslog {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }
}
