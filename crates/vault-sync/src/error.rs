//! Error types for vault-sync

use std::path::PathBuf;

/// Result type for vault-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings file exists but is not valid TOML for [`crate::SyncSettings`]
    #[error("Invalid settings in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A queued task finished without handing back its result
    #[error("Queued task was aborted before completing")]
    TaskAborted,

    // Transparent wrappers for underlying crate errors
    /// File-tree error from vault-fs
    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    /// Backend error from vault-git
    #[error(transparent)]
    Git(#[from] vault_git::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_errors_display_unchanged() {
        let err: Error = vault_git::Error::CommandFailed {
            command: "git push".to_string(),
            message: "rejected".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "`git push` failed: rejected");
    }

    #[test]
    fn test_task_aborted_display() {
        assert_eq!(
            Error::TaskAborted.to_string(),
            "Queued task was aborted before completing"
        );
    }
}
