//! Mock I/O helpers: temporary directories on disk and pre-populated in-memory
//! filesystems.

use crate::fs::{FileSystem, MemoryFs};
use crate::split::FileEntry;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `filename` inside this directory (not created).
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Write `contents` to `filename` inside this directory, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, filename: &str, contents: impl AsRef<[u8]>) -> std::io::Result<PathBuf> {
        let p = self.file_path(filename);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&p, contents)?;
        Ok(p)
    }
}

impl Default for TempDirPath {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// Write several text files into `dir`, returning their paths in the given order.
///
/// # Errors
///
/// Returns an error if any file cannot be written.
pub fn write_text_files(
    dir: &TempDirPath,
    files: &[(&str, &str)],
) -> std::io::Result<Vec<PathBuf>> {
    files
        .iter()
        .map(|(name, contents)| dir.write(name, contents))
        .collect()
}

/// A [`MemoryFs`] holding the given `(path, contents)` pairs.
#[must_use]
pub fn memory_fs_with(files: &[(&str, &str)]) -> MemoryFs {
    let fs = MemoryFs::new();
    for (path, contents) in files {
        fs.insert(*path, contents);
    }
    fs
}

/// [`FileEntry`]s for `paths` as reported by `fs`, in the given order.
///
/// # Panics
///
/// Panics if a path is unknown to `fs`.
#[must_use]
pub fn entries_for(fs: &dyn FileSystem, paths: &[&str]) -> Vec<FileEntry> {
    paths
        .iter()
        .map(|p| FileEntry::from_fs(fs, p).unwrap_or_else(|e| panic!("stat {p}: {e}")))
        .collect()
}
