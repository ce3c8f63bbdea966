//! File-tree access used by the sync coordinator

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Error, Result, VaultPath, io};

/// Read/write access to the vault's file tree plus the views a user has
/// open on it.
///
/// The coordinator only touches the tree to maintain its conflict report,
/// but the interface is general enough for any host: a desktop editor, a
/// headless daemon or an in-memory fake.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Read a file's text content.
    async fn read(&self, path: &VaultPath) -> Result<String>;

    /// Write a file, replacing any previous content.
    async fn write(&self, path: &VaultPath, content: &str) -> Result<()>;

    /// Delete a file. Fails if the file does not exist.
    async fn delete(&self, path: &VaultPath) -> Result<()>;

    /// Whether a regular file exists at `path`.
    async fn exists(&self, path: &VaultPath) -> bool;

    /// Navigable link text for a file, `None` if `path` is not a file.
    async fn link_text(&self, path: &VaultPath) -> Option<String> {
        if self.exists(path).await {
            Some(path.link_text().to_string())
        } else {
            None
        }
    }

    /// Paths currently displayed to the user.
    fn open_views(&self) -> Vec<VaultPath>;

    /// Display a file to the user.
    async fn open(&self, path: &VaultPath) -> Result<()>;
}

/// A vault backed by a directory on the local filesystem.
///
/// There is no editor attached, so "opening" a file records it as an open
/// view and logs where it lives.
#[derive(Debug)]
pub struct LocalVault {
    root: PathBuf,
    views: Mutex<Vec<VaultPath>>,
}

impl LocalVault {
    /// Create a vault rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            views: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Vault for LocalVault {
    async fn read(&self, path: &VaultPath) -> Result<String> {
        let native = path.to_native(&self.root);
        tokio::fs::read_to_string(&native)
            .await
            .map_err(|e| Error::io(native, e))
    }

    async fn write(&self, path: &VaultPath, content: &str) -> Result<()> {
        let native = path.to_native(&self.root);
        let bytes = content.as_bytes().to_vec();
        let target = native.clone();
        tokio::task::spawn_blocking(move || io::write_atomic(&target, &bytes))
            .await
            .map_err(|e| Error::io(&native, std::io::Error::other(e)))?
    }

    async fn delete(&self, path: &VaultPath) -> Result<()> {
        let native = path.to_native(&self.root);
        tokio::fs::remove_file(&native)
            .await
            .map_err(|e| Error::io(native, e))
    }

    async fn exists(&self, path: &VaultPath) -> bool {
        if path.is_root() {
            return false;
        }
        tokio::fs::metadata(path.to_native(&self.root))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    fn open_views(&self) -> Vec<VaultPath> {
        self.views.lock().map(|v| v.clone()).unwrap_or_default()
    }

    async fn open(&self, path: &VaultPath) -> Result<()> {
        let native = path.to_native(&self.root);
        tracing::info!(path = %native.display(), "Opening file");
        let mut views = self.views.lock().map_err(|_| Error::LockFailed {
            path: native.clone(),
        })?;
        if !views.contains(path) {
            views.push(path.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = LocalVault::new(temp.path().join("missing"));
        assert!(matches!(result, Err(Error::NotADirectory { .. })));
    }

    #[tokio::test]
    async fn test_open_records_view_once() {
        let temp = TempDir::new().unwrap();
        let vault = LocalVault::new(temp.path()).unwrap();
        let path = VaultPath::new("report.md");

        vault.open(&path).await.unwrap();
        vault.open(&path).await.unwrap();

        assert_eq!(vault.open_views(), vec![path]);
    }

    #[tokio::test]
    async fn test_root_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        let vault = LocalVault::new(temp.path()).unwrap();
        assert!(!vault.exists(&VaultPath::new("")).await);
    }
}
