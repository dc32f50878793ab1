//! Logging setup for the CLI.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset
    pub level: LevelFilter,
    /// Ignore `RUST_LOG` and always use `level`
    pub force_level: bool,
    /// Whether to include target module information
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            force_level: false,
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Configuration for the given `--verbose` flag.
    pub fn for_verbosity(verbose: bool) -> Self {
        if verbose {
            Self::new(LevelFilter::DEBUG).force_level(true).with_target(true)
        } else {
            Self::default()
        }
    }

    pub fn force_level(mut self, enabled: bool) -> Self {
        self.force_level = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::default().add_directive(self.level.into());
        if self.force_level {
            return fallback();
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    }
}

/// Install the global subscriber.
pub fn init_logging_with_config(config: LogConfig) -> anyhow::Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(config.with_target)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
