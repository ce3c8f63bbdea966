//! Error types for vault-git

/// Result type for vault-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vault-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },

    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("Branch '{branch}' has no upstream branch")]
    NoUpstream { branch: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("No commit author configured")]
    MissingAuthor,

    #[error("Background git task failed: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = Error::CommandFailed {
            command: "git push".to_string(),
            message: "rejected".to_string(),
        };
        assert_eq!(err.to_string(), "`git push` failed: rejected");
    }

    #[test]
    fn test_no_upstream_display() {
        let err = Error::NoUpstream {
            branch: "main".to_string(),
        };
        assert!(err.to_string().contains("'main'"));
    }
}
