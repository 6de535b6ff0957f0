//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::Path;
use std::time::SystemTime;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

fn map_io_error(err: std::io::Error, path: &Path) -> VfsError {
    match err.kind() {
        std::io::ErrorKind::NotFound => VfsError::NotFound {
            path: path.to_string_lossy().to_string(),
        },
        std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied {
            path: path.to_string_lossy().to_string(),
        },
        _ => err.into(),
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| map_io_error(e, path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified_time(&self, path: &Path) -> VfsResult<SystemTime> {
        let metadata = std::fs::metadata(path).map_err(|e| map_io_error(e, path))?;
        metadata.modified().map_err(|e| map_io_error(e, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lathe_vfs_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_native_exists() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("exists");

        // Clean up if exists
        let _ = std::fs::remove_file(&temp_file);

        assert!(!fs.exists(&temp_file));

        {
            let mut file = std::fs::File::create(&temp_file).unwrap();
            file.write_all(b"test").unwrap();
        }

        assert!(fs.exists(&temp_file));

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_read() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("read");

        let _ = std::fs::remove_file(&temp_file);
        std::fs::write(&temp_file, b"hello native").unwrap();

        let content = fs.read_file(&temp_file).unwrap();
        assert_eq!(content, b"hello native");

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_read_nonexistent() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("nonexistent");

        let _ = std::fs::remove_file(&temp_file);

        let result = fs.read_file(&temp_file);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_native_modified_time() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("mtime");

        let _ = std::fs::remove_file(&temp_file);
        std::fs::write(&temp_file, b"stamp me").unwrap();

        let modified = fs.modified_time(&temp_file).unwrap();
        assert!(modified <= SystemTime::now());

        std::fs::remove_file(&temp_file).unwrap();
    }

    #[test]
    fn test_native_modified_time_nonexistent() {
        let fs = NativeFileSystem::new();
        let temp_file = temp_file("mtime_missing");

        let _ = std::fs::remove_file(&temp_file);

        let result = fs.modified_time(&temp_file);
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_native_is_file_and_dir() {
        let fs = NativeFileSystem::new();
        let temp_file_path = temp_file("type_file");
        let temp_dir_path = temp_file("type_dir");

        let _ = std::fs::remove_file(&temp_file_path);
        let _ = std::fs::remove_dir(&temp_dir_path);

        std::fs::write(&temp_file_path, b"test").unwrap();
        std::fs::create_dir(&temp_dir_path).unwrap();

        assert!(fs.is_file(&temp_file_path));
        assert!(!fs.is_dir(&temp_file_path));

        assert!(!fs.is_file(&temp_dir_path));
        assert!(fs.is_dir(&temp_dir_path));

        std::fs::remove_file(&temp_file_path).unwrap();
        std::fs::remove_dir(&temp_dir_path).unwrap();
    }
}
