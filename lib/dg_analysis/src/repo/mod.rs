//! The analysed image, indexed once: framework boundary, classes hierarchy
//! and control flow graphs of every in-scope method.

mod boundary;
mod repository;

pub use boundary::{FrameworkBoundary, ANDROID_PREFIXES};
pub use repository::Repo;
