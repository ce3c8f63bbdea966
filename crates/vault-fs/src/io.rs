//! Atomic file replacement

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;

use crate::{Error, Result};

static NEXT_TEMP: AtomicU64 = AtomicU64::new(0);

/// Replace `target` with `content` in one step.
///
/// The bytes go to a sibling temp file held under an exclusive lock, which
/// is then renamed over the target. On failure the temp file is removed.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp = temp_sibling(target);
    let result = fill_locked(&temp, target, content)
        .and_then(|()| fs::rename(&temp, target).map_err(|e| Error::io(target, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

/// `.<name>.<pid>.<n>.tmp` next to `target`, unique within this process.
fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = NEXT_TEMP.fetch_add(1, Ordering::Relaxed);
    target.with_file_name(format!(".{name}.{}.{n}.tmp", std::process::id()))
}

fn fill_locked(temp: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp)
        .map_err(|e| Error::io(temp, e))?;

    FileExt::lock_exclusive(&file).map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(temp, e))?;
    file.sync_all().map_err(|e| Error::io(temp, e))?;
    FileExt::unlock(&file).map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}
