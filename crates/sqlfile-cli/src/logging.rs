//! Logging setup for the command line runner
//!
//! Console output goes to stderr so that rendered results on stdout stay
//! machine-readable. When a log directory is configured, a JSON layer also
//! writes daily-rotated files there.
//!
//! `RUST_LOG` takes precedence over the configured filter.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const DEFAULT_FILTER: &str =
    "warn,sqlfile=info,sqlfile_core=info,sqlfile_driver_sqlite=info,sqlfile_cli=info";

const LOG_FILE_PREFIX: &str = "sqlfile.log";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Directory for JSON log files, none disables file logging
    pub log_dir: Option<PathBuf>,

    /// Whether to include file/line information in console logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            log_dir: None,
            include_location: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    /// Build a config from the first filter that is set, in order of
    /// precedence, falling back to [`DEFAULT_FILTER`].
    pub fn resolve(cli_filter: Option<&str>, settings_filter: Option<&str>, log_dir: Option<PathBuf>) -> Self {
        let filter = cli_filter
            .or(settings_filter)
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            filter,
            log_dir,
            ..Self::default()
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must be held
/// until the program exits.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone())
        .boxed();
    layers.push(console_layer);

    let guard = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let json_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking)
                .with_filter(env_filter)
                .boxed();
            layers.push(json_layer);

            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        filter = %config.filter,
        log_dir = ?config.log_dir,
        "logging initialized"
    );

    Ok(guard)
}
