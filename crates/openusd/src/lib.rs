//! Support library for the `openusd` command line tool.
//!
//! The tool drives helper binaries (currently only `git`) as subprocesses
//! and reports how they ended.

pub mod error;
pub mod quoting;
pub mod runner;
pub mod update;

pub use error::ProcessError;
pub use quoting::quoted_if_necessary;
pub use runner::{check_status, find_executable, Invocation, Tool, ENV_LAUNCHER};
pub use update::UpdateRequest;
