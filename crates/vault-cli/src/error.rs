//! Error types for vault-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from vault-sync
    #[error(transparent)]
    Sync(#[from] vault_sync::Error),

    /// Error from vault-fs
    #[error(transparent)]
    Fs(#[from] vault_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The failure was already shown to the user
    #[error("operation did not complete")]
    Reported,
}
