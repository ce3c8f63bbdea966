//! Vault-relative path handling

use std::path::{Path, PathBuf};

/// A path relative to the vault root, normalized to forward slashes.
///
/// Backends report paths the way git prints them and the file tree is
/// addressed the same way, so both sides compare equal after
/// normalization. Leading slashes, `.` and empty components are dropped
/// and `..` cannot climb above the vault root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VaultPath {
    inner: String,
}

impl VaultPath {
    /// Create a new VaultPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let mut parts: Vec<&str> = Vec::new();
        for component in raw.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        Self {
            inner: parts.join("/"),
        }
    }

    /// Get the normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this path points at the vault root itself.
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolve against a vault root directory for I/O.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        self.inner
            .split('/')
            .filter(|c| !c.is_empty())
            .fold(root.to_path_buf(), |acc, c| acc.join(c))
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|n| !n.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// The path as written inside a wiki link: markdown notes drop their
    /// `.md` extension, every other file keeps it.
    pub fn link_text(&self) -> &str {
        match self.extension() {
            Some("md") => &self.inner[..self.inner.len() - 3],
            _ => &self.inner,
        }
    }
}

impl AsRef<Path> for VaultPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for VaultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for VaultPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VaultPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for VaultPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}
