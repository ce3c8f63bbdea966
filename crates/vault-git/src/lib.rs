//! Version-control backends for vault-sync
//!
//! The coordinator talks to git only through the [`GitBackend`] capability
//! interface. Two interchangeable drivers implement it:
//!
//! - [`CliBackend`] shells out to the native `git` executable and can
//!   detect merge conflicts left behind by a pull.
//! - [`Git2Backend`] runs in-process on top of libgit2. It only ever
//!   fast-forwards, so it never produces conflicts and does not report them.

pub mod backend;
pub mod cli;
pub mod error;
pub mod git2_backend;
pub mod porcelain;

pub use backend::{BranchInfo, GitBackend, Readiness, RepositoryStatus};
pub use cli::CliBackend;
pub use error::{Error, Result};
pub use git2_backend::{Git2Backend, Git2Options};
