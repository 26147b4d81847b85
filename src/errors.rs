//! Global error handling.
//!
//! Each sub-crate of the project defines its own type error.
//! Their types can be unified, for example in a main function,
//! when winding results at the top-level.
//!
//! ```rust
//! use droidgraph::prelude::*;
//!
//! fn main() -> DgResult<()> { // can return a DgError
//!    let _table = RegistrationTable::parse("")?; // can return an AnalysisError
//!    Ok(())
//! }
//! ```

use dg_analysis::errors::AnalysisError;
use dg_code::errors::CodeError;
use std::io;
use thiserror::Error;

/// An alias for result that can be a [`DgError`].
pub type DgResult<T> = Result<T, DgError>;

/// The main error type for error winding at the top-level.
/// It mainly consists of transparent wrapper over error types that
/// are defined in dependencies.
#[derive(Debug, Error)]
pub enum DgError {
    /// Custom error for reporting inconsistent analysis options.
    #[error("bad options: {0}")]
    BadOptions(String),

    /// Error that can be returned from [I/O operations](std::io).
    #[error(transparent)]
    IO(#[from] io::Error),

    /// Error that can be returned from regex compilation.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Error that can be returned when setting up the worker threads.
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Error that can be returned from [`dg_analysis`] functions.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Error that can be returned from [`dg_code`] functions.
    #[error(transparent)]
    Code(#[from] CodeError),
}
