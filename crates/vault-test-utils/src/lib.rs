//! Shared test utilities for the vault-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: git repository fixtures, from a bare `git2` repository up to
//!   a clone wired to a local upstream
//! - [`backend`]: [`FakeBackend`], a scripted backend that records calls
//! - [`vault`]: [`MemoryVault`], an in-memory file tree

pub mod backend;
pub mod git;
pub mod vault;

pub use backend::{Call, FakeBackend};
pub use vault::MemoryVault;
