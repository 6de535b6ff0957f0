//! AST node types
//!
//! Locations, expressions, declarations, the lexical scope container, and
//! the external-reference nodes the resolver operates on. The file module
//! itself lives in [`crate::module`].

mod decl;
mod expr;
mod external;
mod location;
mod node;
mod scope;

pub use decl::{Assignment, Declaration, FunctionDecl, ModuleDecl, ModuleInstantiation, Param};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use external::{ExternalKind, ExternalNode};
pub use location::Location;
pub use node::{AstNode, Printed};
pub use scope::LocalScope;
