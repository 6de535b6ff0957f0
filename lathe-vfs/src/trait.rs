//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::time::SystemTime;

/// Virtual File System trait
///
/// Provides a unified read-only interface for file access, decoupling the
/// resolver from specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system with settable timestamps
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Arguments
    /// * `path` - File path
    ///
    /// # Returns
    /// File contents as bytes, or VfsError
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Last modification time of a file
    ///
    /// # Arguments
    /// * `path` - File path
    ///
    /// # Returns
    /// The modification timestamp, or VfsError if the file does not exist
    /// or the backend cannot report one
    fn modified_time(&self, path: &Path) -> VfsResult<SystemTime>;
}
