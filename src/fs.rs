//! Filesystem abstraction used by the planner and readers.
//!
//! The core only ever needs three things from storage: the length of a file, its
//! locality hosts, and a seekable read handle. [`LocalFs`] serves the local disk;
//! [`MemoryFs`] keeps files in memory and records every open, which makes it the
//! filesystem of choice for tests that assert on I/O behaviour.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A readable, seekable file handle.
pub trait SeekRead: Read + Seek {}

impl<T: Read + Seek> SeekRead for T {}

/// Storage backend consulted by the planner and the readers.
pub trait FileSystem: Send + Sync {
    /// Open `path` for streaming read. The handle is released when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be read.
    fn open(&self, path: &Path) -> io::Result<Box<dyn SeekRead>>;

    /// Length of `path` in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing.
    fn file_len(&self, path: &Path) -> io::Result<u64>;

    /// Hosts holding a local copy of `path`; empty when locality is unknown.
    fn hosts(&self, _path: &Path) -> Vec<String> {
        Vec::new()
    }
}

/// The local disk. Every file is reported as living on `localhost`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn SeekRead>> {
        let f = std::fs::File::open(path)?;
        Ok(Box::new(f))
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn hosts(&self, _path: &Path) -> Vec<String> {
        vec!["localhost".to_string()]
    }
}

// ============================================================================
// MemoryFs
// ============================================================================

#[derive(Clone)]
struct MemFile {
    data: Arc<[u8]>,
    hosts: Vec<String>,
}

#[derive(Default)]
struct OpenStats {
    opens: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: Mutex<Vec<PathBuf>>,
}

/// In-memory filesystem with open instrumentation.
///
/// Clones share both the file table and the counters.
#[derive(Clone, Default)]
pub struct MemoryFs {
    files: Arc<Mutex<HashMap<PathBuf, MemFile>>>,
    denied: Arc<Mutex<Vec<PathBuf>>>,
    stats: Arc<OpenStats>,
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file with no locality hosts.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl AsRef<[u8]>) {
        self.insert_on_hosts(path, data, &[]);
    }

    /// Add (or replace) a file stored on the given hosts.
    pub fn insert_on_hosts(
        &self,
        path: impl Into<PathBuf>,
        data: impl AsRef<[u8]>,
        hosts: &[&str],
    ) {
        let file = MemFile {
            data: Arc::from(data.as_ref()),
            hosts: hosts.iter().map(|h| (*h).to_string()).collect(),
        };
        self.files
            .lock()
            .expect("file table mutex poisoned")
            .insert(path.into(), file);
    }

    /// Make every later `open` of `path` fail with `PermissionDenied`.
    /// The file still reports its length.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.denied
            .lock()
            .expect("deny list mutex poisoned")
            .push(path.into());
    }

    /// Total number of successful opens.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.stats.opens.load(Ordering::SeqCst)
    }

    /// Number of handles currently alive.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.stats.live.load(Ordering::SeqCst)
    }

    /// Highest number of handles that were alive at the same time.
    #[must_use]
    pub fn max_live_handles(&self) -> usize {
        self.stats.max_live.load(Ordering::SeqCst)
    }

    /// Paths opened so far, in open order.
    #[must_use]
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.stats
            .opened
            .lock()
            .expect("open log mutex poisoned")
            .clone()
    }

    fn lookup(&self, path: &Path) -> io::Result<MemFile> {
        self.files
            .lock()
            .expect("file table mutex poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
            })
    }
}

impl FileSystem for MemoryFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn SeekRead>> {
        let file = self.lookup(path)?;
        if self
            .denied
            .lock()
            .expect("deny list mutex poisoned")
            .iter()
            .any(|p| p == path)
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not readable", path.display()),
            ));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(live, Ordering::SeqCst);
        self.stats
            .opened
            .lock()
            .expect("open log mutex poisoned")
            .push(path.to_path_buf());
        Ok(Box::new(MemHandle {
            cursor: Cursor::new(file.data),
            stats: Arc::clone(&self.stats),
        }))
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        Ok(self.lookup(path)?.data.len() as u64)
    }

    fn hosts(&self, path: &Path) -> Vec<String> {
        self.lookup(path).map(|f| f.hosts).unwrap_or_default()
    }
}

struct MemHandle {
    cursor: Cursor<Arc<[u8]>>,
    stats: Arc<OpenStats>,
}

impl Read for MemHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MemHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl Drop for MemHandle {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
    }
}
