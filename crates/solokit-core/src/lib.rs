pub mod config;
pub mod error;
pub mod git;
pub mod io;
pub mod paths;
pub mod queue;
pub mod repository;
pub mod session;
pub mod types;
pub mod updater;
pub mod validator;
pub mod work_item;

pub use error::{Result, SolokitError};
