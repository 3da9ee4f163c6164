//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
mod common;
pub mod dev;
pub mod list;
pub mod run;

pub use args::{Cli, Commands};
