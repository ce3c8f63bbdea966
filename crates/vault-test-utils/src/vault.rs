//! In-memory [`Vault`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use vault_fs::{Error, Result, Vault, VaultPath};

/// A file tree held in memory, with a record of every `open` request.
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<VaultPath, String>>,
    views: Mutex<Vec<VaultPath>>,
    opened: Mutex<Vec<VaultPath>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(VaultPath::new(path), content.to_string());
        self
    }

    /// Pretend `path` is already displayed to the user.
    pub fn with_open_view(self, path: &str) -> Self {
        self.views.lock().unwrap().push(VaultPath::new(path));
        self
    }

    /// Content of a file, if present.
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(&VaultPath::new(path)).cloned()
    }

    /// Every path passed to `open`, in order.
    pub fn opened(&self) -> Vec<VaultPath> {
        self.opened.lock().unwrap().clone()
    }
}

fn not_found(path: &VaultPath) -> Error {
    Error::io(
        PathBuf::from(path.as_str()),
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    )
}

#[async_trait]
impl Vault for MemoryVault {
    async fn read(&self, path: &VaultPath) -> Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn write(&self, path: &VaultPath, content: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &VaultPath) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    async fn exists(&self, path: &VaultPath) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn open_views(&self) -> Vec<VaultPath> {
        self.views.lock().unwrap().clone()
    }

    async fn open(&self, path: &VaultPath) -> Result<()> {
        self.opened.lock().unwrap().push(path.clone());
        let mut views = self.views.lock().unwrap();
        if !views.contains(path) {
            views.push(path.clone());
        }
        Ok(())
    }
}
