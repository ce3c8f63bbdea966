//! File-tree abstraction for vault-sync
//!
//! Provides vault-relative path handling and the [`Vault`] interface the
//! coordinator uses to write, delete and open its conflict report.

pub mod error;
pub mod io;
pub mod path;
pub mod vault;

pub use error::{Error, Result};
pub use path::VaultPath;
pub use vault::{LocalVault, Vault};
