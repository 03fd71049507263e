//! Branch status reconciliation against the `git` and `gh` command lines.

pub mod resolver;
pub mod runner;

pub use resolver::{GitBranchStatusResolver, GitStatusTransition};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
