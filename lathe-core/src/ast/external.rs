//! External file references (`use` / `include`)

use super::location::Location;
use super::node::AstNode;
use crate::module::{FileModule, ResolveError};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

/// The two reference kinds, fixed by language semantics.
///
/// `Use` keeps the referenced file a separately-scoped unit reachable only
/// by qualified lookup; `Include` splices its top-level declarations into
/// the referencing scope. The set is closed: resolution dispatches over it
/// once, there is no open-ended subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalKind {
    Use,
    Include,
}

impl ExternalKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ExternalKind::Use => "use",
            ExternalKind::Include => "include",
        }
    }
}

/// A reference from one file module to another file.
///
/// Created by the parser as pure bookkeeping (no I/O); resolution later
/// fills in the resolved sub-module, the path it resolved to, and the
/// file's modification time at resolution, or the error that prevented it.
#[derive(Clone)]
pub struct ExternalNode {
    kind: ExternalKind,
    filename: String,
    location: Location,
    pub(crate) resolved: Option<Rc<RefCell<FileModule>>>,
    pub(crate) resolved_path: Option<PathBuf>,
    pub(crate) last_modified: Option<SystemTime>,
    pub(crate) spliced: bool,
    pub(crate) error: Option<ResolveError>,
}

impl ExternalNode {
    pub fn new(kind: ExternalKind, filename: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            filename: filename.into(),
            location,
            resolved: None,
            resolved_path: None,
            last_modified: None,
            spliced: false,
            error: None,
        }
    }

    pub fn new_use(filename: impl Into<String>, location: Location) -> Self {
        Self::new(ExternalKind::Use, filename, location)
    }

    pub fn new_include(filename: impl Into<String>, location: Location) -> Self {
        Self::new(ExternalKind::Include, filename, location)
    }

    pub fn kind(&self) -> ExternalKind {
        self.kind
    }

    /// The referenced filename as written in the source
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The resolved sub-module, if resolution succeeded
    pub fn resolved_module(&self) -> Option<Rc<RefCell<FileModule>>> {
        self.resolved.clone()
    }

    /// The path the reference resolved to
    pub fn resolved_path(&self) -> Option<&Path> {
        self.resolved_path.as_deref()
    }

    /// The referenced file's modification time observed at resolution
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Whether this include's declarations have been spliced into the
    /// referencing scope
    pub fn is_spliced(&self) -> bool {
        self.spliced
    }

    /// The recorded resolution failure, if any
    pub fn error(&self) -> Option<&ResolveError> {
        self.error.as_ref()
    }
}

// Must not traverse `resolved`: a cyclic module graph would recurse.
impl fmt::Debug for ExternalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalNode")
            .field("kind", &self.kind)
            .field("filename", &self.filename)
            .field("resolved", &self.resolved.is_some())
            .field("resolved_path", &self.resolved_path)
            .field("spliced", &self.spliced)
            .field("error", &self.error)
            .finish()
    }
}

impl AstNode for ExternalNode {
    fn print(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        writeln!(f, "{}{} {:?};", indent, self.kind.keyword(), self.filename)
    }

    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::Printed;

    #[test]
    fn test_new_node_is_unresolved() {
        let node = ExternalNode::new_use("lib.lathe", Location::NONE);
        assert_eq!(node.kind(), ExternalKind::Use);
        assert!(!node.is_resolved());
        assert!(!node.is_spliced());
        assert!(node.error().is_none());
    }

    #[test]
    fn test_print() {
        let node = ExternalNode::new_include("shapes.lathe", Location::NONE);
        assert_eq!(
            Printed(&node, "").to_string(),
            "include \"shapes.lathe\";\n"
        );
    }
}
