//! CLI configuration
//!
//! Log configuration with per-phase overrides.

use tracing::Level;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub parser: Option<Level>,
    pub resolver: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            parser: None,
            resolver: None,
        }
    }
}

impl LogConfig {
    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "lathe::parser" => self.parser.unwrap_or(self.global),
            "lathe::resolver" => self.resolver.unwrap_or(self.global),
            _ => self.global,
        }
    }
}

/// Parse a level name; `None` for unknown names
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
