//! Local file reads and crash-safe writes

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Replace `path` with `content` so readers see either the old file or the
/// new one, never a partial write.
///
/// The bytes go to a locked sibling file that is synced and then renamed
/// over the target. Missing parent directories are created.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let staging = staging_path(&target);
    let result = write_staged(&staging, &target, content)
        .and_then(|()| fs::rename(&staging, &target).map_err(|e| Error::io(&target, e)));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn write_staged(staging: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(staging).map_err(|e| Error::io(staging, e))?;
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(staging, e))?;
    file.sync_all().map_err(|e| Error::io(staging, e))?;
    // Dropping the handle releases the lock
    Ok(())
}

/// Hidden sibling of `target`, unique per process, on the same filesystem.
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.partial", std::process::id()))
}

/// Read a UTF-8 file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(native, e))
}

/// [`write_atomic`] for text.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
