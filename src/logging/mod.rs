use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for the tracing bootstrap.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directive used when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"comercia_fulfillment=debug"`.
    pub default_directive: String,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            use_color: true,
        }
    }
}

impl LoggerConfig {
    pub fn with_level(level: &str) -> Self {
        Self {
            default_directive: level.to_string(),
            ..Self::default()
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured default. Safe to call once per process; subsequent calls are
/// ignored so tests can share a binary.
pub fn setup_logger(config: LoggerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive.clone()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_ansi(config.use_color)
        .with_target(true)
        .try_init();
}
