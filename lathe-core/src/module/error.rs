//! Resolution error types

use crate::parser::SyntaxError;
use std::fmt;
use std::path::PathBuf;

/// Why a reference could not be resolved.
///
/// Every variant is recorded against the reference that produced it;
/// resolution of sibling references always continues. The caller decides
/// whether any recorded failure makes the overall compilation fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Referenced file not found, with every path that was tried
    FileNotFound {
        filename: String,
        tried: Vec<PathBuf>,
    },
    /// Referenced file was read but failed to parse
    ParseFailure {
        path: PathBuf,
        errors: Vec<SyntaxError>,
    },
    /// A reference re-entered a file that is still being resolved
    /// (a cross-file cycle; direct self-references stay silent)
    CyclicReference { path: PathBuf },
    /// Referenced file exists but could not be read
    IoFailure { path: PathBuf, message: String },
    /// Reference chain exceeded the configured recursion depth
    DepthExceeded { filename: String, limit: usize },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::FileNotFound { filename, tried } => {
                write!(f, "File '{}' not found. Tried:", filename)?;
                for path in tried {
                    write!(f, "\n  - {}", path.display())?;
                }
                Ok(())
            }
            ResolveError::ParseFailure { path, errors } => {
                write!(f, "Failed to parse '{}':", path.display())?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
            ResolveError::CyclicReference { path } => {
                write!(f, "Cyclic reference to '{}'", path.display())
            }
            ResolveError::IoFailure { path, message } => {
                write!(f, "Failed to read '{}': {}", path.display(), message)
            }
            ResolveError::DepthExceeded { filename, limit } => {
                write!(
                    f,
                    "Reference to '{}' exceeds maximum include depth {}",
                    filename, limit
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// A recorded per-reference failure, aggregated session-wide so the caller
/// can surface everything after one resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveDiagnostic {
    /// The referenced filename as written in the source
    pub reference: String,
    pub error: ResolveError,
}

impl fmt::Display for ResolveDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reference, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_tried_paths() {
        let err = ResolveError::FileNotFound {
            filename: "lib.lathe".to_string(),
            tried: vec![PathBuf::from("/proj/lib.lathe"), PathBuf::from("/usr/lib.lathe")],
        };
        let msg = err.to_string();
        assert!(msg.contains("lib.lathe"));
        assert!(msg.contains("/proj/lib.lathe"));
        assert!(msg.contains("/usr/lib.lathe"));
    }

    #[test]
    fn test_depth_exceeded_names_limit() {
        let err = ResolveError::DepthExceeded {
            filename: "deep.lathe".to_string(),
            limit: 64,
        };
        assert!(err.to_string().contains("64"));
    }
}
