//! Session-wide resolution state
//!
//! One `ResolveSession` spans one compilation pass: it owns the filesystem
//! handle, the search-path configuration, the canonical-path registry that
//! makes diamond-shaped sharing resolve each file exactly once, and the
//! aggregated diagnostics list.

use super::error::{ResolveDiagnostic, ResolveError};
use super::file_module::FileModule;
use crate::parser::parse_source;
use lathe_config::{LimitConfig, SearchPaths};
use lathe_vfs::{VfsError, VirtualFileSystem};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Per-canonical-path resolution state.
///
/// `InProgress` marks a module whose `handle_dependencies` is on the active
/// call stack; a reference reaching it again is a cycle and is never
/// followed.
enum ModuleSlot {
    InProgress(Rc<RefCell<FileModule>>),
    Resolved(Rc<RefCell<FileModule>>),
    Failed(ResolveError),
}

/// A successfully loaded reference target
#[derive(Debug)]
pub struct LoadedModule {
    pub module: Rc<RefCell<FileModule>>,
    /// Canonical path the reference resolved to
    pub path: PathBuf,
    /// The file's modification time when loaded
    pub modified: Option<SystemTime>,
}

/// Lexical path normalization: drops `.` segments and resolves `..`
/// against preceding components. No filesystem access, so it works the
/// same against the in-memory backend.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Shared state for one resolution pass over a module graph
pub struct ResolveSession {
    vfs: Box<dyn VirtualFileSystem>,
    search_paths: SearchPaths,
    limits: LimitConfig,
    registry: HashMap<PathBuf, ModuleSlot>,
    diagnostics: Vec<ResolveDiagnostic>,
    depth: usize,
}

impl ResolveSession {
    pub fn new(vfs: Box<dyn VirtualFileSystem>) -> Self {
        Self {
            vfs,
            search_paths: SearchPaths::default(),
            limits: LimitConfig::default(),
            registry: HashMap::new(),
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    /// Set the library directories consulted when a reference is not found
    /// relative to the referencing module
    pub fn with_search_paths(mut self, search_paths: SearchPaths) -> Self {
        self.set_search_paths(search_paths);
        self
    }

    pub fn with_limits(mut self, limits: LimitConfig) -> Self {
        self.set_limits(limits);
        self
    }

    pub fn set_search_paths(&mut self, search_paths: SearchPaths) {
        self.search_paths = search_paths;
    }

    pub fn set_limits(&mut self, limits: LimitConfig) {
        self.limits = limits;
    }

    pub fn vfs(&self) -> &dyn VirtualFileSystem {
        self.vfs.as_ref()
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.limits
    }

    /// Current resolution recursion depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Parse the session's root file.
    ///
    /// Unlike a referenced file, a root that parses with errors is still
    /// returned (with the errors recorded as diagnostics): the caller is
    /// usually an editor session that wants whatever partial module exists.
    pub fn load_root(&mut self, path: &Path) -> Result<Rc<RefCell<FileModule>>, ResolveError> {
        let canonical = normalize_path(path);
        let source = self.read_source(&canonical)?;
        let (mut module, errors) = parse_source(&source);
        if !errors.is_empty() {
            self.report(
                &canonical.to_string_lossy(),
                ResolveError::ParseFailure {
                    path: canonical.clone(),
                    errors,
                },
            );
        }
        module.set_module_path(canonical.parent().unwrap_or(Path::new("")).to_path_buf());
        module.set_filename(canonical.clone());
        let module = Rc::new(RefCell::new(module));
        self.registry
            .insert(canonical, ModuleSlot::Resolved(module.clone()));
        Ok(module)
    }

    /// Resolve and load one referenced file.
    ///
    /// The path is looked up relative to `relative_to` first, then in the
    /// configured search paths. A file already in the registry is returned
    /// as-is — each canonical path is parsed at most once per session and
    /// shared by reference by every module that reaches it.
    pub fn load(&mut self, filename: &str, relative_to: &Path) -> Result<LoadedModule, ResolveError> {
        let located = self.locate(filename, relative_to)?;
        let canonical = normalize_path(&located);
        let modified = self.vfs.modified_time(&canonical).ok();

        match self.registry.get(&canonical) {
            Some(ModuleSlot::Resolved(rc)) | Some(ModuleSlot::InProgress(rc)) => {
                return Ok(LoadedModule {
                    module: rc.clone(),
                    path: canonical,
                    modified,
                });
            }
            Some(ModuleSlot::Failed(error)) => return Err(error.clone()),
            None => {}
        }

        let source = match self.read_source(&canonical) {
            Ok(source) => source,
            Err(error) => {
                self.registry
                    .insert(canonical, ModuleSlot::Failed(error.clone()));
                return Err(error);
            }
        };

        let (mut module, errors) = parse_source(&source);
        if !errors.is_empty() {
            let error = ResolveError::ParseFailure {
                path: canonical.clone(),
                errors,
            };
            self.registry
                .insert(canonical, ModuleSlot::Failed(error.clone()));
            return Err(error);
        }

        debug!(
            target: "lathe::resolver",
            path = %canonical.display(),
            "loaded referenced file"
        );

        module.set_module_path(canonical.parent().unwrap_or(Path::new("")).to_path_buf());
        module.set_filename(canonical.clone());
        let module = Rc::new(RefCell::new(module));
        self.registry
            .insert(canonical.clone(), ModuleSlot::Resolved(module.clone()));

        Ok(LoadedModule {
            module,
            path: canonical,
            modified,
        })
    }

    /// Find the file a reference names, trying the referencing module's
    /// directory first and the search paths after it
    fn locate(&self, filename: &str, relative_to: &Path) -> Result<PathBuf, ResolveError> {
        let reference = Path::new(filename);
        let mut tried = Vec::new();

        let mut candidates = Vec::new();
        if reference.is_absolute() {
            candidates.push(reference.to_path_buf());
        } else {
            candidates.push(relative_to.join(reference));
            for dir in &self.search_paths.dirs {
                candidates.push(dir.join(reference));
            }
        }

        for candidate in candidates {
            tried.push(candidate.clone());
            if self.vfs.is_file(&candidate) {
                return Ok(candidate);
            }
        }

        Err(ResolveError::FileNotFound {
            filename: filename.to_string(),
            tried,
        })
    }

    fn read_source(&self, path: &Path) -> Result<String, ResolveError> {
        let bytes = self.vfs.read_file(path).map_err(|e| match e {
            VfsError::NotFound { .. } => ResolveError::FileNotFound {
                filename: path.to_string_lossy().to_string(),
                tried: vec![path.to_path_buf()],
            },
            other => ResolveError::IoFailure {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;
        String::from_utf8(bytes).map_err(|e| ResolveError::IoFailure {
            path: path.to_path_buf(),
            message: format!("Invalid UTF-8: {}", e),
        })
    }

    // Registry state transitions, driven by `FileModule::handle_dependencies`

    pub(crate) fn begin(&mut self, path: Option<&Path>) {
        self.depth += 1;
        if let Some(path) = path {
            if let Some(slot) = self.registry.get_mut(path) {
                if let ModuleSlot::Resolved(rc) = slot {
                    *slot = ModuleSlot::InProgress(rc.clone());
                }
            }
        }
    }

    pub(crate) fn finish(&mut self, path: Option<&Path>) {
        self.depth = self.depth.saturating_sub(1);
        if let Some(path) = path {
            if let Some(slot) = self.registry.get_mut(path) {
                if let ModuleSlot::InProgress(rc) = slot {
                    *slot = ModuleSlot::Resolved(rc.clone());
                }
            }
        }
    }

    /// Whether the module at `path` is currently being resolved further up
    /// the call stack
    pub fn is_in_progress(&self, path: &Path) -> bool {
        matches!(self.registry.get(path), Some(ModuleSlot::InProgress(_)))
    }

    /// The already-resolved module for a canonical path, if any
    pub fn resolved(&self, path: &Path) -> Option<Rc<RefCell<FileModule>>> {
        match self.registry.get(&normalize_path(path)) {
            Some(ModuleSlot::Resolved(rc)) | Some(ModuleSlot::InProgress(rc)) => Some(rc.clone()),
            _ => None,
        }
    }

    /// Record a per-reference failure without aborting the pass
    pub(crate) fn report(&mut self, reference: &str, error: ResolveError) {
        warn!(
            target: "lathe::resolver",
            reference,
            error = %error,
            "reference failed to resolve"
        );
        self.diagnostics.push(ResolveDiagnostic {
            reference: reference.to_string(),
            error,
        });
    }

    /// Every failure recorded so far, in the order encountered
    pub fn diagnostics(&self) -> &[ResolveDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<ResolveDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Drop every cached module and diagnostic, keeping the filesystem and
    /// configuration. The next resolution pass re-reads every file — this
    /// is the recompile path after an edit.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.diagnostics.clear();
        self.depth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathe_vfs::MemoryFileSystem;

    fn session_with(files: Vec<(&str, &str)>) -> ResolveSession {
        let fs = MemoryFileSystem::with_files(
            files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())),
        );
        ResolveSession::new(Box::new(fs))
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c.lathe")),
            PathBuf::from("/a/c.lathe")
        );
        assert_eq!(normalize_path(Path::new("a/b.lathe")), PathBuf::from("a/b.lathe"));
    }

    #[test]
    fn test_load_relative_to_module() {
        let mut session = session_with(vec![("/proj/lib.lathe", "r = 1;")]);
        let loaded = session.load("lib.lathe", Path::new("/proj")).unwrap();
        assert_eq!(loaded.path, PathBuf::from("/proj/lib.lathe"));
        assert!(loaded.modified.is_some());
    }

    #[test]
    fn test_load_not_found_lists_tried() {
        let mut session = session_with(vec![])
            .with_search_paths(SearchPaths::from_env_value("/lib"));
        let err = session.load("missing.lathe", Path::new("/proj")).unwrap_err();
        match err {
            ResolveError::FileNotFound { tried, .. } => {
                assert_eq!(
                    tried,
                    vec![
                        PathBuf::from("/proj/missing.lathe"),
                        PathBuf::from("/lib/missing.lathe"),
                    ]
                );
            }
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_search_path_fallback() {
        let mut session = session_with(vec![("/lib/shapes.lathe", "module s() { }")])
            .with_search_paths(SearchPaths::from_env_value("/lib"));
        let loaded = session.load("shapes.lathe", Path::new("/proj")).unwrap();
        assert_eq!(loaded.path, PathBuf::from("/lib/shapes.lathe"));
    }

    #[test]
    fn test_referencing_dir_beats_search_path() {
        let mut session = session_with(vec![
            ("/proj/shapes.lathe", "a = 1;"),
            ("/lib/shapes.lathe", "a = 2;"),
        ])
        .with_search_paths(SearchPaths::from_env_value("/lib"));
        let loaded = session.load("shapes.lathe", Path::new("/proj")).unwrap();
        assert_eq!(loaded.path, PathBuf::from("/proj/shapes.lathe"));
    }

    #[test]
    fn test_load_memoizes_by_canonical_path() {
        let mut session = session_with(vec![("/proj/lib.lathe", "r = 1;")]);
        let first = session.load("lib.lathe", Path::new("/proj")).unwrap();
        let second = session.load("./lib.lathe", Path::new("/proj")).unwrap();
        assert!(Rc::ptr_eq(&first.module, &second.module));
    }

    #[test]
    fn test_load_parse_failure_is_cached() {
        let mut session = session_with(vec![("/proj/bad.lathe", "r = ;")]);
        let first = session.load("bad.lathe", Path::new("/proj")).unwrap_err();
        assert!(matches!(first, ResolveError::ParseFailure { .. }));
        // second hit comes from the registry, same error
        let second = session.load("bad.lathe", Path::new("/proj")).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_root_with_errors_still_returns_module() {
        let mut session = session_with(vec![("/proj/main.lathe", "a = ;\nb = 2;")]);
        let root = session.load_root(Path::new("/proj/main.lathe")).unwrap();
        assert!(root.borrow().scope.lookup_assignment("b").is_some());
        assert_eq!(session.diagnostics().len(), 1);
    }
}
