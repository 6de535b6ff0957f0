//! Lathe Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Lathe crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Library search paths for resolving file references.
///
/// A reference that cannot be found relative to the referencing file's
/// directory is looked up in `dirs`, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPaths {
    /// Library directories, highest priority first
    pub dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Create an empty search path list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a colon-separated path list (the `LATHEPATH` format)
    pub fn from_env_value(value: &str) -> Self {
        Self {
            dirs: value
                .split(':')
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// Configuration for resolution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum include/use recursion depth before resolution of a
    /// reference is abandoned with a distinct error
    pub max_include_depth: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_include_depth: 64,
        }
    }
}

/// Compilation phase enum for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Parser,
    Resolver,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parser => "parser",
            Phase::Resolver => "resolver",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("lathe::{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.max_include_depth, 64);
    }

    #[test]
    fn test_search_paths_from_env_value() {
        let paths = SearchPaths::from_env_value("/usr/share/lathe:/home/me/lib");
        assert_eq!(paths.dirs.len(), 2);
        assert_eq!(paths.dirs[0], PathBuf::from("/usr/share/lathe"));
    }

    #[test]
    fn test_search_paths_skips_empty_segments() {
        let paths = SearchPaths::from_env_value(":/lib::");
        assert_eq!(paths.dirs, vec![PathBuf::from("/lib")]);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Parser.as_str(), "parser");
        assert_eq!(Phase::Resolver.target(), "lathe::resolver");
    }
}
