//! Lathe API - Compilation session orchestration
//!
//! Provides the session-level surface over the core resolver:
//! - compile an entry file and its whole reference closure
//! - aggregate every per-reference failure into one diagnostics list
//! - answer "did anything change since the last compile" for watch loops
//!
//! ```ignore
//! use lathe_api::CompileSession;
//! use lathe_vfs::native_fs;
//! use std::path::Path;
//!
//! let mut session = CompileSession::new(Box::new(native_fs()));
//! let output = session.compile(Path::new("wheel.lathe"))?;
//! if session.is_stale()? {
//!     session.compile(Path::new("wheel.lathe"))?;
//! }
//! ```

use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use tracing::info;

use lathe_core::{FileModule, ResolveDiagnostic, ResolveSession};
use lathe_vfs::VirtualFileSystem;

pub mod error;
pub use error::{reports_for, ErrorReport, LatheError};

// Re-export the vocabulary callers need alongside the session
pub use lathe_config::{LimitConfig, SearchPaths};
pub use lathe_core::{Evaluator, ResolveError};

/// Library search paths from the `LATHEPATH` environment variable,
/// computed once per process
static ENV_SEARCH_PATHS: Lazy<SearchPaths> = Lazy::new(|| {
    std::env::var("LATHEPATH")
        .map(|value| SearchPaths::from_env_value(&value))
        .unwrap_or_default()
});

/// The process-wide default library search paths (`LATHEPATH`)
pub fn default_search_paths() -> &'static SearchPaths {
    &ENV_SEARCH_PATHS
}

/// Result of one compile pass
#[derive(Debug)]
pub struct CompileOutput {
    /// The resolved root module with its merged scope
    pub module: Rc<RefCell<FileModule>>,
    /// Newest modification time observed across the transitive closure
    pub resolved_at: Option<SystemTime>,
    /// Every per-reference failure recorded during the pass
    pub diagnostics: Vec<ResolveDiagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Structured reports for the diagnostics list
    pub fn reports(&self) -> Vec<ErrorReport> {
        reports_for(&self.diagnostics)
    }
}

/// A compilation session: one entry file, recompiled as it changes.
///
/// Holds the resolver state between compiles so staleness queries can run
/// against the resolved graph without touching the parser.
pub struct CompileSession {
    session: ResolveSession,
    entry: Option<PathBuf>,
    root: Option<Rc<RefCell<FileModule>>>,
    resolved_at: Option<SystemTime>,
}

impl CompileSession {
    pub fn new(vfs: Box<dyn VirtualFileSystem>) -> Self {
        Self {
            session: ResolveSession::new(vfs).with_search_paths(default_search_paths().clone()),
            entry: None,
            root: None,
            resolved_at: None,
        }
    }

    /// Replace the library search paths (defaults to `LATHEPATH`)
    pub fn with_search_paths(mut self, search_paths: SearchPaths) -> Self {
        self.session.set_search_paths(search_paths);
        self
    }

    /// Replace the resolution limits
    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.session.set_limits(limits);
        self
    }

    /// Compile `entry` and its whole reference closure.
    ///
    /// Per-reference failures land in the output's diagnostics list, not in
    /// `Err`: only an entry file that cannot be loaded at all fails the
    /// call. Recompiling drops every cached module first, so edits are
    /// picked up.
    pub fn compile(&mut self, entry: &Path) -> Result<CompileOutput, LatheError> {
        self.session.reset();
        info!(target: "lathe::api", entry = %entry.display(), "compiling");

        let root = self.session.load_root(entry)?;
        let resolved_at = root.borrow_mut().handle_dependencies(&mut self.session);
        root.borrow_mut().resolve_externals();

        self.entry = Some(entry.to_path_buf());
        self.root = Some(root.clone());
        self.resolved_at = resolved_at;

        Ok(CompileOutput {
            module: root,
            resolved_at,
            diagnostics: self.session.diagnostics().to_vec(),
        })
    }

    /// The root module of the last successful compile
    pub fn root(&self) -> Option<Rc<RefCell<FileModule>>> {
        self.root.clone()
    }

    /// Diagnostics recorded by the last compile
    pub fn diagnostics(&self) -> &[ResolveDiagnostic] {
        self.session.diagnostics()
    }

    /// Whether the entry file or any transitive include changed since the
    /// last compile.
    ///
    /// Pure filesystem query over recorded include paths; nothing is
    /// re-read or re-parsed. Returns `Err(NotCompiled)` before the first
    /// compile.
    pub fn is_stale(&self) -> Result<bool, LatheError> {
        let root = self.root.as_ref().ok_or(LatheError::NotCompiled)?;
        let observed = root.borrow().includes_changed(self.session.vfs());
        Ok(match (observed, self.resolved_at) {
            (Some(observed), Some(resolved_at)) => observed > resolved_at,
            // Unknown on either side: err on the side of recompiling
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathe_vfs::MemoryFileSystem;

    fn fs_with(files: &[(&str, &str)]) -> MemoryFileSystem {
        MemoryFileSystem::with_files(
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())),
        )
    }

    #[test]
    fn test_compile_resolves_closure() {
        let fs = fs_with(&[
            ("/main.lathe", "include \"lib.lathe\";\nwheel(2);"),
            ("/lib.lathe", "module wheel(r) { }"),
        ]);
        let mut session =
            CompileSession::new(Box::new(fs)).with_search_paths(SearchPaths::default());
        let output = session.compile(Path::new("/main.lathe")).unwrap();
        assert!(!output.has_errors());
        assert!(output
            .module
            .borrow()
            .scope
            .lookup_module("wheel")
            .is_some());
    }

    #[test]
    fn test_compile_missing_entry_is_err() {
        let fs = fs_with(&[]);
        let mut session =
            CompileSession::new(Box::new(fs)).with_search_paths(SearchPaths::default());
        let result = session.compile(Path::new("/missing.lathe"));
        assert!(matches!(result, Err(LatheError::Resolve(_))));
    }

    #[test]
    fn test_broken_reference_lands_in_diagnostics() {
        let fs = fs_with(&[("/main.lathe", "include \"gone.lathe\";\nok = 1;")]);
        let mut session =
            CompileSession::new(Box::new(fs)).with_search_paths(SearchPaths::default());
        let output = session.compile(Path::new("/main.lathe")).unwrap();
        assert!(output.has_errors());
        let reports = output.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error_kind, "FileNotFound");
    }

    #[test]
    fn test_is_stale_before_compile() {
        let fs = fs_with(&[]);
        let session = CompileSession::new(Box::new(fs));
        assert!(matches!(session.is_stale(), Err(LatheError::NotCompiled)));
    }

    #[test]
    fn test_stale_after_touch_fresh_after_recompile() {
        let fs = fs_with(&[
            ("/main.lathe", "include \"lib.lathe\";"),
            ("/lib.lathe", "a = 1;"),
        ]);
        let mut session = CompileSession::new(Box::new(fs.clone()))
            .with_search_paths(SearchPaths::default());
        session.compile(Path::new("/main.lathe")).unwrap();
        assert!(!session.is_stale().unwrap());

        fs.touch(Path::new("/lib.lathe"));
        assert!(session.is_stale().unwrap());

        session.compile(Path::new("/main.lathe")).unwrap();
        assert!(!session.is_stale().unwrap());
    }

    #[test]
    fn test_recompile_picks_up_edits() {
        let fs = fs_with(&[
            ("/main.lathe", "include \"lib.lathe\";"),
            ("/lib.lathe", "a = 1;"),
        ]);
        let mut session = CompileSession::new(Box::new(fs.clone()))
            .with_search_paths(SearchPaths::default());
        session.compile(Path::new("/main.lathe")).unwrap();

        fs.write_file(Path::new("/lib.lathe"), b"a = 1;\nb = 2;");
        let output = session.compile(Path::new("/main.lathe")).unwrap();
        assert!(output
            .module
            .borrow()
            .scope
            .lookup_assignment("b")
            .is_some());
    }
}
