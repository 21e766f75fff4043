//! Durable file primitives: all-or-nothing replacement and the cache lock.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use fd_lock::{RwLock, RwLockWriteGuard};
use tracing::debug;

/// Replace `path` with `data` so readers see either the old or the new
/// content, never a prefix. The temp file lives next to the target so the
/// final rename stays on one filesystem.
pub fn write_atomic(
    path: &Path,
    data: &[u8],
) -> io::Result<()>
{
    let dir = match path.parent()
    {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".reel-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file()
        .sync_all()?;

    tmp.persist(path)
        .map_err(|e| e.error)?;

    // Durably record the rename.
    #[cfg(unix)]
    if let Err(e) = File::open(dir).and_then(|parent| parent.sync_all())
    {
        debug!(dir = %dir.display(), error = %e, "directory fsync failed");
    }

    Ok(())
}

/// Advisory lock file guarding one cache against concurrent writers.
pub struct CacheLock
{
    path: PathBuf,
    lock: RwLock<File>,
}

impl CacheLock
{
    /// Open (creating if needed) `<cache>.lock` beside the cache file.
    pub fn open(cache_path: &Path) -> io::Result<Self>
    {
        let mut name = cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache".into());
        name.push(".lock");
        let path = cache_path.with_file_name(name);

        match path.parent()
        {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
            _ => {}
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        Ok(Self { path, lock: RwLock::new(file) })
    }

    /// Take the exclusive lock without blocking.
    pub fn try_acquire(&mut self) -> io::Result<RwLockWriteGuard<'_, File>>
    {
        self.lock.try_write()
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }
}
