//! CLI logging initialization
//!
//! Per-phase log control on top of `tracing-subscriber`.

use crate::config::LogConfig;
use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// Compact single-line
    Compact,
    /// JSON (tool integration)
    Json,
}

/// Initialize the log system with the given format and per-phase levels
pub fn init(log_config: &LogConfig, format: LogFormat) {
    let targets = Targets::new()
        .with_default(log_config.global)
        .with_target("lathe::parser", log_config.level_for("lathe::parser"))
        .with_target("lathe::resolver", log_config.level_for("lathe::resolver"))
        .with_target("lathe::api", log_config.global)
        .with_target("lathe::cli", log_config.global);

    let stderr_layer = create_format_layer(format).with_filter(targets);
    tracing_subscriber::registry().with(stderr_layer).init();
}

/// Create formatter layer based on format
fn create_format_layer(format: LogFormat) -> impl Layer<tracing_subscriber::Registry> {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    }
}
