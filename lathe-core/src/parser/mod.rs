//! Parser for Lathe source files
//!
//! The parser records `use`/`include` statements on the module it builds
//! without resolving them — parsing never blocks on file I/O. Resolution
//! happens afterwards through [`crate::module::ResolveSession`].

mod error;
mod parser;
mod scanner;

pub use error::{SyntaxError, SyntaxErrorKind};
pub use parser::Parser;
pub use scanner::{scan, Token, TokenKind};

use crate::module::FileModule;

/// Parse a source string into a file module.
///
/// # Returns
/// The parsed module and every syntax error found. A non-empty error list
/// means the module is partial; the resolver treats that as a parse
/// failure for the referencing entry.
pub fn parse_source(source: &str) -> (FileModule, Vec<SyntaxError>) {
    Parser::new(source).parse()
}
