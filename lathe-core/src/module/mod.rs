//! File-module dependency resolution
//!
//! One [`FileModule`] per source file, resolved through a session-wide
//! [`ResolveSession`]: references are registered during parsing, resolved
//! recursively on demand, and merged into the effective scope according to
//! their kind (`use` stays isolated, `include` splices).

mod error;
mod file_module;
mod session;

pub use error::{ResolveDiagnostic, ResolveError};
pub use file_module::FileModule;
pub use session::{LoadedModule, ResolveSession};
