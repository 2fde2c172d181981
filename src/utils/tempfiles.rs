use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::utils::config::PackagePaths;

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Scratch path next to `path`: `dir/.<name>.<pid>-<seq>.imgbatch.tmp`.
/// Every call returns a fresh name, so concurrent writers aimed at one target never share a scratch file.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    path.parent().unwrap_or(Path::new(".")).join(format!(
        ".{name}.{}-{seq}{}",
        std::process::id(),
        PackagePaths::get().temp_suffix()
    ))
}

/// Best-effort removal of a stale or failed scratch file.
pub fn remove_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path)
        && e.kind() != io::ErrorKind::NotFound
    {
        log::debug!("could not remove {}: {}", temp_path.display(), e);
    }
}

/// Let `write` produce the file at a scratch path, then rename it over `final_path`.
/// On failure the scratch file is removed and `final_path` is left as it was.
pub fn write_via_temp<E, F>(final_path: &Path, write: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&Path) -> Result<(), E>,
{
    let temp_path = temp_path_for(final_path);
    if let Err(e) = write(&temp_path) {
        remove_temp(&temp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp_path, final_path) {
        remove_temp(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
