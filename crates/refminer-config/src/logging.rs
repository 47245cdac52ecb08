use std::sync::Once;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive string.
    ///
    /// Examples: `info`, `debug`, `refminer.diff=trace,info`.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit JSON-formatted log lines.
    #[serde(default)]
    pub json: bool,

    /// Write log lines to stderr.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,

    /// Print the full error chain and backtrace when the CLI fails.
    #[serde(default)]
    pub include_backtrace: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// The configured level as `EnvFilter` directives.
    ///
    /// Bare level names are matched case-insensitively and `warning` is
    /// accepted for `warn`. Anything else passes through as a directive string.
    fn directives(&self) -> String {
        let level = self.level.trim();
        if level.is_empty() {
            return Self::default_level();
        }
        if level.eq_ignore_ascii_case("warning") {
            return "warn".to_owned();
        }
        match level.parse::<tracing::Level>() {
            Ok(parsed) => parsed.to_string().to_ascii_lowercase(),
            Err(_) => level.to_owned(),
        }
    }

    /// `rust_log` directives layered after the configured ones, so they win
    /// on conflicting targets.
    fn layered_directives(&self, rust_log: Option<&str>) -> String {
        let base = self.directives();
        match rust_log.map(str::trim).filter(|extra| !extra.is_empty()) {
            Some(extra) => format!("{base},{extra}"),
            None => base,
        }
    }

    /// Create the effective `EnvFilter`.
    ///
    /// `RUST_LOG` is layered over the configured level. If the combination
    /// does not parse, the configured level alone is used, then plain `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        EnvFilter::try_new(self.layered_directives(rust_log.as_deref()))
            .or_else(|_| EnvFilter::try_new(self.directives()))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
            include_backtrace: false,
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call has an effect. With
/// `stderr = false` the filter is still installed but no events are written.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let base_layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if !config.stderr {
            tracing_subscriber::layer::Identity::new().boxed()
        } else if config.json {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(base_layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            // Another subscriber (for example a test harness) got there first.
            return;
        }
        tracing::debug!(
            target: "refminer.config",
            level = %config.level,
            json = config.json,
            "tracing initialized"
        );
    });
}
