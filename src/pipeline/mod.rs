//! File-set pipelines.
//!
//! A task reads the files its [`PathSpec`] resolves to, hands them to one or
//! more [`Pipeline`]s and writes whatever comes out. Each pipeline is an
//! explicit, ordered list of [`Stage`]s; nothing is wired implicitly.
//!
//! ```text
//! PathSpec ──resolve──▶ FileSet ──Stage──▶ FileSet ──Stage──▶ … ──▶ artifacts
//! ```
//!
//! Stages either work on the whole set (filters, concatenation) or on one
//! file at a time through [`FileTransform`], which fans out over rayon while
//! keeping the input order.

mod file;
mod source;
mod stage;

pub use file::{FileSet, VirtualFile};
pub use source::PathSpec;
pub use stage::{FileTransform, Pipeline, Stage, StageError};
