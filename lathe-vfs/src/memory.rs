//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A single in-memory file: content plus a modification timestamp.
#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: SystemTime,
}

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired. Every file
/// carries a modification timestamp; writes advance an internal tick so
/// later writes always compare newer, and tests can pin arbitrary times
/// with [`MemoryFileSystem::set_modified`].
///
/// # Example
/// ```
/// use lathe_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.lathe"), b"r = 1;");
/// let content = fs.read_file(Path::new("/test.lathe")).unwrap();
/// assert_eq!(content, b"r = 1;");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, MemoryFile>>>,
    tick: Arc<RwLock<u64>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            tick: Arc::new(RwLock::new(0)),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.write_file(Path::new(path.as_ref()), &content);
        }
        fs
    }

    /// Write a file, stamping it with the next internal tick.
    ///
    /// Unlike the read-only `VirtualFileSystem` surface, writes are an
    /// inherent method: only tests and tools mutate the store.
    pub fn write_file(&self, path: &Path, content: &[u8]) {
        let normalized = self.normalize_path(path);
        let modified = self.next_tick();
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(
            normalized,
            MemoryFile {
                content: content.to_vec(),
                modified,
            },
        );
    }

    /// Pin an explicit modification time on an existing file.
    ///
    /// Returns false if the file does not exist.
    pub fn set_modified(&self, path: &Path, modified: SystemTime) -> bool {
        let normalized = self.normalize_path(path);
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        match files.get_mut(&normalized) {
            Some(file) => {
                file.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Bump an existing file's modification time to the next tick without
    /// changing its content. Returns false if the file does not exist.
    pub fn touch(&self, path: &Path) -> bool {
        let modified = self.next_tick();
        self.set_modified(path, modified)
    }

    fn next_tick(&self) -> SystemTime {
        let mut tick = self.tick.write().unwrap_or_else(|e| e.into_inner());
        *tick += 1;
        UNIX_EPOCH + Duration::from_secs(*tick)
    }

    /// Normalize a path string for internal storage.
    /// Uses forward slashes consistently for cross-platform compatibility.
    fn normalize_path(&self, path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;

        files
            .get(&normalized)
            .map(|f| f.content.clone())
            .ok_or_else(|| VfsError::NotFound {
                path: normalized.clone(),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        let files = match self.files.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        files.contains_key(&normalized)
    }

    fn is_file(&self, path: &Path) -> bool {
        // In memory FS, if it exists, it's a file (no directory support)
        self.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let _ = path;
        false
    }

    fn modified_time(&self, path: &Path) -> VfsResult<SystemTime> {
        let normalized = self.normalize_path(path);
        let files = self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })?;

        files
            .get(&normalized)
            .map(|f| f.modified)
            .ok_or_else(|| VfsError::NotFound {
                path: normalized.clone(),
            })
    }
}
