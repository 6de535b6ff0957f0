//! API error types
//!
//! One error enum for the session surface plus a structured, serializable
//! report form for tools that want data instead of prose (JSON output,
//! editor integrations).

use lathe_core::{ResolveDiagnostic, ResolveError};
use serde::Serialize;
use thiserror::Error;

/// Lathe error type
#[derive(Error, Debug, Clone)]
pub enum LatheError {
    /// The entry file itself could not be loaded
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// A query that needs a compiled module was made before `compile`
    #[error("no module has been compiled yet")]
    NotCompiled,
}

/// Structured error report
///
/// CLI callers print it; web/editor callers serialize it.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    /// Which stage produced the error ("parser" or "resolver")
    pub phase: &'static str,
    /// The reference as written in the source, when the error belongs to one
    pub reference: Option<String>,
    /// The file the error points into
    pub path: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub error_kind: String,
    pub message: String,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.phase)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path)?;
            if let (Some(line), Some(column)) = (self.line, self.column) {
                write!(f, ":{}:{}", line, column)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{}", self.message)
    }
}

fn kind_name(error: &ResolveError) -> &'static str {
    match error {
        ResolveError::FileNotFound { .. } => "FileNotFound",
        ResolveError::ParseFailure { .. } => "ParseFailure",
        ResolveError::CyclicReference { .. } => "CyclicReference",
        ResolveError::IoFailure { .. } => "IoFailure",
        ResolveError::DepthExceeded { .. } => "DepthExceeded",
    }
}

/// Expand recorded resolution diagnostics into flat reports.
///
/// A parse failure fans out into one report per underlying syntax error so
/// every report carries a concrete position.
pub fn reports_for(diagnostics: &[ResolveDiagnostic]) -> Vec<ErrorReport> {
    let mut reports = Vec::new();
    for diagnostic in diagnostics {
        match &diagnostic.error {
            ResolveError::ParseFailure { path, errors } => {
                for error in errors {
                    reports.push(ErrorReport {
                        phase: "parser",
                        reference: Some(diagnostic.reference.clone()),
                        path: Some(path.to_string_lossy().to_string()),
                        line: Some(error.line),
                        column: Some(error.column),
                        error_kind: format!("{:?}", error.kind),
                        message: error.to_string(),
                    });
                }
            }
            other => {
                let path = match other {
                    ResolveError::CyclicReference { path }
                    | ResolveError::IoFailure { path, .. } => {
                        Some(path.to_string_lossy().to_string())
                    }
                    _ => None,
                };
                reports.push(ErrorReport {
                    phase: "resolver",
                    reference: Some(diagnostic.reference.clone()),
                    path,
                    line: None,
                    column: None,
                    error_kind: kind_name(other).to_string(),
                    message: other.to_string(),
                });
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathe_core::SyntaxError;
    use std::path::PathBuf;

    #[test]
    fn test_parse_failure_fans_out_per_syntax_error() {
        use lathe_core::parser::SyntaxErrorKind;
        let diagnostics = vec![ResolveDiagnostic {
            reference: "bad.lathe".to_string(),
            error: ResolveError::ParseFailure {
                path: PathBuf::from("/proj/bad.lathe"),
                errors: vec![
                    SyntaxError::at(SyntaxErrorKind::UnexpectedEndOfInput, 1, 5),
                    SyntaxError::at(SyntaxErrorKind::UnterminatedString, 2, 1),
                ],
            },
        }];
        let reports = reports_for(&diagnostics);
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.phase == "parser"));
        assert_eq!(reports[0].line, Some(1));
        assert_eq!(reports[1].line, Some(2));
    }

    #[test]
    fn test_not_found_report_keeps_reference() {
        let diagnostics = vec![ResolveDiagnostic {
            reference: "missing.lathe".to_string(),
            error: ResolveError::FileNotFound {
                filename: "missing.lathe".to_string(),
                tried: vec![PathBuf::from("/proj/missing.lathe")],
            },
        }];
        let reports = reports_for(&diagnostics);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error_kind, "FileNotFound");
        assert_eq!(reports[0].reference.as_deref(), Some("missing.lathe"));
    }

    #[test]
    fn test_report_serializes() {
        let report = ErrorReport {
            phase: "resolver",
            reference: Some("x.lathe".to_string()),
            path: None,
            line: None,
            column: None,
            error_kind: "FileNotFound".to_string(),
            message: "File 'x.lathe' not found.".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["phase"], "resolver");
        assert_eq!(json["error_kind"], "FileNotFound");
    }
}
