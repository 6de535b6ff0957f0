//! Lathe language core
//!
//! The AST, the parser, and the file-module dependency subsystem: how one
//! parsed source file references others (`use` for namespace-isolated
//! imports, `include` for verbatim scope splices) and how those references
//! are resolved, cached, and re-validated across an editing session.

pub mod ast;
pub mod eval;
pub mod module;
pub mod parser;

pub use ast::{
    Declaration, Expr, ExternalKind, ExternalNode, LocalScope, Location,
};
pub use eval::Evaluator;
pub use module::{FileModule, ResolveDiagnostic, ResolveError, ResolveSession};
pub use parser::{parse_source, SyntaxError};
