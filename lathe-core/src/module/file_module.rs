//! The compiled unit for a single source file

use super::error::ResolveError;
use super::session::ResolveSession;
use crate::ast::{AstNode, ExternalKind, ExternalNode, LocalScope, Location};
use crate::eval::Evaluator;
use lathe_vfs::VirtualFileSystem;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

/// Maximum of two optional timestamps, treating `None` as unknown
pub(crate) fn max_time(a: Option<SystemTime>, b: Option<SystemTime>) -> Option<SystemTime> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Normalize a reference filename for dictionary identity: forward
/// slashes, no `.` segments, no duplicate separators.
fn normalize_reference(filename: &str) -> String {
    let replaced = filename.replace('\\', "/");
    let absolute = replaced.starts_with('/');
    let joined = replaced
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// The root AST node and compiled unit for one source file.
///
/// Owns the file's lexical scope and its table of external references.
/// The parser registers `use`/`include` statements here without touching
/// the filesystem; [`FileModule::handle_dependencies`] later resolves them
/// through a [`ResolveSession`], and [`FileModule::resolve_externals`]
/// merges the results into the effective scope.
pub struct FileModule {
    module_path: PathBuf,
    filename: Option<PathBuf>,
    pub scope: LocalScope,
    external_dict: HashMap<(ExternalKind, String), usize>,
    external_list: Vec<ExternalNode>,
    is_handling_dependencies: bool,
    location: Location,
}

impl FileModule {
    /// Create an empty module with no backing file (the synthetic root)
    pub fn new() -> Self {
        Self {
            module_path: PathBuf::new(),
            filename: None,
            scope: LocalScope::new(),
            external_dict: HashMap::new(),
            external_list: Vec::new(),
            is_handling_dependencies: false,
            location: Location::NONE,
        }
    }

    /// The directory used to resolve this module's relative references
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Change the directory relative references resolve against
    pub fn set_module_path(&mut self, path: impl Into<PathBuf>) {
        self.module_path = path.into();
    }

    /// The file this module was parsed from, if any
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub(crate) fn set_filename(&mut self, path: PathBuf) {
        self.filename = Some(path);
    }

    // Reference registration (parse-time bookkeeping, no I/O)

    fn add_external(&mut self, node: ExternalNode) -> Option<usize> {
        let key = (node.kind(), normalize_reference(node.filename()));
        if self.external_dict.contains_key(&key) {
            return None;
        }
        let entry = self.external_list.len();
        self.external_dict.insert(key, entry);
        self.external_list.push(node);
        Some(entry)
    }

    /// Register a `use` reference. First occurrence wins; returns the new
    /// entry index, or `None` for a duplicate.
    pub fn add_use_node(&mut self, node: ExternalNode) -> Option<usize> {
        debug_assert_eq!(node.kind(), ExternalKind::Use);
        self.add_external(node)
    }

    /// Register an `include` reference. First occurrence wins; returns the
    /// new entry index, or `None` for a duplicate.
    pub fn add_include_node(&mut self, node: ExternalNode) -> Option<usize> {
        debug_assert_eq!(node.kind(), ExternalKind::Include);
        self.add_external(node)
    }

    pub fn has_externals(&self) -> bool {
        !self.external_list.is_empty()
    }

    /// Every external reference, in first-seen order
    pub fn externals(&self) -> impl Iterator<Item = &ExternalNode> {
        self.external_list.iter()
    }

    /// The `use` references, in first-seen order
    pub fn use_nodes(&self) -> impl Iterator<Item = &ExternalNode> {
        self.external_list
            .iter()
            .filter(|n| n.kind() == ExternalKind::Use)
    }

    /// Qualified lookup of a module imported with `use`.
    ///
    /// This is the only way a `use`d file's declarations are reachable:
    /// nothing from it lands in this module's own scope.
    pub fn lookup_use(&self, filename: &str) -> Option<Rc<RefCell<FileModule>>> {
        let key = (ExternalKind::Use, normalize_reference(filename));
        let entry = *self.external_dict.get(&key)?;
        self.external_list[entry].resolved_module()
    }

    /// True exactly while this module's own `handle_dependencies` call is
    /// on the active call stack
    pub fn is_handling_dependencies(&self) -> bool {
        self.is_handling_dependencies
    }

    // Resolution

    /// Resolve every reference transitively reachable from this module.
    ///
    /// Referenced files are parsed on demand (once per canonical path per
    /// session) and their own references resolved depth-first. Per-reference
    /// failures are recorded on the reference and in the session's
    /// diagnostics; siblings always continue.
    ///
    /// # Returns
    /// The most recent modification time observed across the transitive
    /// closure, or `None` when unknown — in particular a re-entered
    /// (cyclic) resolution returns `None` immediately.
    pub fn handle_dependencies(&mut self, session: &mut ResolveSession) -> Option<SystemTime> {
        if self.is_handling_dependencies {
            return None;
        }
        self.is_handling_dependencies = true;
        session.begin(self.filename.as_deref());

        let mut newest = self
            .filename
            .as_deref()
            .and_then(|p| session.vfs().modified_time(p).ok());

        for entry in 0..self.external_list.len() {
            let needs_resolve = {
                let node = &self.external_list[entry];
                node.resolved_module().is_none() && node.error().is_none()
            };
            if needs_resolve {
                let filename = self.external_list[entry].filename().to_string();
                let limit = session.limits().max_include_depth;
                if session.depth() > limit {
                    let error = ResolveError::DepthExceeded {
                        filename: filename.clone(),
                        limit,
                    };
                    session.report(&filename, error.clone());
                    self.external_list[entry].error = Some(error);
                    continue;
                }
                match session.load(&filename, &self.module_path) {
                    Ok(loaded) => {
                        let node = &mut self.external_list[entry];
                        node.resolved = Some(loaded.module);
                        node.resolved_path = Some(loaded.path);
                        node.last_modified = loaded.modified;
                    }
                    Err(error) => {
                        session.report(&filename, error.clone());
                        self.external_list[entry].error = Some(error);
                        continue;
                    }
                }
            }

            let Some(sub) = self.external_list[entry].resolved_module() else {
                continue;
            };
            newest = max_time(newest, self.external_list[entry].last_modified());

            let sub_path = self.external_list[entry].resolved_path().map(Path::to_path_buf);
            if let Some(sub_path) = sub_path.as_deref() {
                if session.is_in_progress(sub_path) {
                    // Re-entered while already on the resolution stack:
                    // bounded, never followed. A direct self-reference
                    // stays silent; a cross-file cycle is surfaced once.
                    if Some(sub_path) != self.filename.as_deref()
                        && self.external_list[entry].error().is_none()
                    {
                        let error = ResolveError::CyclicReference {
                            path: sub_path.to_path_buf(),
                        };
                        session.report(self.external_list[entry].filename(), error.clone());
                        self.external_list[entry].error = Some(error);
                    }
                    continue;
                }
            }

            if let Ok(mut sub_module) = sub.try_borrow_mut() {
                let sub_time = sub_module.handle_dependencies(session);
                newest = max_time(newest, sub_time);
            };
        }

        session.finish(self.filename.as_deref());
        self.is_handling_dependencies = false;
        newest
    }

    /// Current maximum modification time over this module's own file and
    /// every already-resolved include, transitively.
    ///
    /// Pure query: no resolution, no mutation, safe to call repeatedly.
    /// `use` imports are not flattened in — their freshness belongs to
    /// their own module. Compare the result against the time returned by
    /// the last successful [`FileModule::handle_dependencies`] to decide
    /// whether a re-parse is needed.
    pub fn includes_changed(&self, vfs: &dyn VirtualFileSystem) -> Option<SystemTime> {
        let mut visited = HashSet::new();
        self.includes_changed_inner(vfs, &mut visited)
    }

    fn includes_changed_inner(
        &self,
        vfs: &dyn VirtualFileSystem,
        visited: &mut HashSet<PathBuf>,
    ) -> Option<SystemTime> {
        if let Some(path) = &self.filename {
            if !visited.insert(path.clone()) {
                return None;
            }
        }

        let mut newest = self
            .filename
            .as_deref()
            .and_then(|p| vfs.modified_time(p).ok());

        for node in self
            .external_list
            .iter()
            .filter(|n| n.kind() == ExternalKind::Include)
        {
            let Some(path) = node.resolved_path() else {
                continue;
            };
            newest = max_time(newest, vfs.modified_time(path).ok());
            if let Some(sub) = node.resolved_module() {
                if let Ok(sub_module) = sub.try_borrow() {
                    newest = max_time(newest, sub_module.includes_changed_inner(vfs, visited));
                }
            }
        }
        newest
    }

    /// Merge resolved references into this module's effective scope.
    ///
    /// `use` references stay separately scoped and are only reachable via
    /// [`FileModule::lookup_use`]. `include` references have the
    /// sub-module's top-level declarations spliced in at the point of
    /// inclusion, after the sub-module has flattened its own includes.
    /// Idempotent: a second call changes nothing.
    pub fn resolve_externals(&mut self) {
        for entry in 0..self.external_list.len() {
            let Some(sub) = self.external_list[entry].resolved_module() else {
                continue;
            };

            if let Ok(mut sub_module) = sub.try_borrow_mut() {
                sub_module.resolve_externals();
            }

            if self.external_list[entry].kind() == ExternalKind::Include
                && !self.external_list[entry].is_spliced()
            {
                if let Ok(sub_module) = sub.try_borrow() {
                    let declarations = sub_module.scope.declarations.clone();
                    self.scope.splice_include(entry, declarations);
                    self.external_list[entry].spliced = true;
                }
            }
        }
    }

    /// Whether every reference has been resolved (or failed) and every
    /// resolvable include spliced
    pub fn externals_resolved(&self) -> bool {
        self.external_list.iter().all(|node| {
            if node.error().is_some() {
                return true;
            }
            match node.kind() {
                ExternalKind::Use => node.is_resolved(),
                ExternalKind::Include => node.is_resolved() && node.is_spliced(),
            }
        })
    }

    /// Hand the merged scope to the evaluator.
    ///
    /// Must only be called after dependency resolution; evaluation operates
    /// purely on the merged scope and triggers no file I/O here.
    pub fn instantiate<E: Evaluator>(&self, evaluator: &mut E) -> E::Output {
        evaluator.evaluate_scope(&self.scope)
    }
}

impl Default for FileModule {
    fn default() -> Self {
        Self::new()
    }
}

impl AstNode for FileModule {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        // Includes are represented inside the scope (as placeholders until
        // resolved), so only `use` references print here.
        for node in self.use_nodes() {
            node.print(f, indent)?;
        }
        self.scope.print(f, indent)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

impl fmt::Debug for FileModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileModule")
            .field("filename", &self.filename)
            .field("module_path", &self.module_path)
            .field("declarations", &self.scope.len())
            .field("externals", &self.external_list)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reference() {
        assert_eq!(normalize_reference("./lib.lathe"), "lib.lathe");
        assert_eq!(normalize_reference("a//b.lathe"), "a/b.lathe");
        assert_eq!(normalize_reference("a\\b.lathe"), "a/b.lathe");
        assert_eq!(normalize_reference("/abs/p.lathe"), "/abs/p.lathe");
    }

    #[test]
    fn test_add_use_dedup() {
        let mut module = FileModule::new();
        let first = module.add_use_node(ExternalNode::new_use("lib.lathe", Location::NONE));
        let second = module.add_use_node(ExternalNode::new_use("./lib.lathe", Location::NONE));
        assert_eq!(first, Some(0));
        assert_eq!(second, None);
        assert_eq!(module.externals().count(), 1);
    }

    #[test]
    fn test_same_file_use_and_include_are_distinct() {
        let mut module = FileModule::new();
        let use_entry = module.add_use_node(ExternalNode::new_use("x.lathe", Location::NONE));
        let include_entry =
            module.add_include_node(ExternalNode::new_include("x.lathe", Location::NONE));
        assert_eq!(use_entry, Some(0));
        assert_eq!(include_entry, Some(1));
        assert_eq!(module.externals().count(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut module = FileModule::new();
        module.add_include_node(ExternalNode::new_include("b.lathe", Location::NONE));
        module.add_use_node(ExternalNode::new_use("a.lathe", Location::NONE));
        module.add_include_node(ExternalNode::new_include("c.lathe", Location::NONE));

        let names: Vec<_> = module.externals().map(|n| n.filename()).collect();
        assert_eq!(names, vec!["b.lathe", "a.lathe", "c.lathe"]);
    }

    #[test]
    fn test_lookup_use_unresolved_is_none() {
        let mut module = FileModule::new();
        module.add_use_node(ExternalNode::new_use("lib.lathe", Location::NONE));
        assert!(module.lookup_use("lib.lathe").is_none());
    }

    #[test]
    fn test_externals_resolved_empty_module() {
        let module = FileModule::new();
        assert!(module.externals_resolved());
    }
}
