use std::path::Path;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    prelude::*,
    EnvFilter,
};

const DEFAULT_FILTER: &str = "method_factory=debug,method_core=debug,warn";

/// Environment variable selecting the log file format.
pub const LOG_FORMAT_ENV: &str = "METHOD_FACTORY_LOG_FORMAT";

/// Format of the rolling log file. The console is always human readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// Read [`LOG_FORMAT_ENV`]; unset or unrecognized values mean `Text`.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("unknown log format '{}'", other)),
        }
    }
}

/// Initialize console logging plus a daily rolling log file in `log_dir`,
/// with the file format taken from [`LogFormat::from_env`].
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// as long as the process logs.
pub fn init_logging(log_dir: impl AsRef<Path>, log_prefix: &str) -> anyhow::Result<WorkerGuard> {
    init_logging_with(log_dir, log_prefix, LogFormat::from_env())
}

pub fn init_logging_with(
    log_dir: impl AsRef<Path>,
    log_prefix: &str,
    format: LogFormat,
) -> anyhow::Result<WorkerGuard> {
    let log_dir_path = log_dir.as_ref();
    std::fs::create_dir_all(log_dir_path)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log_prefix)
        .build(log_dir_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(std::io::stderr);

    let (text_file, json_file) = match format {
        LogFormat::Text => (
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(file_writer),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(file_writer),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(text_file)
        .with(json_file)
        .try_init()?;

    tracing::info!(
        "Logging initialized ({:?} file output) in {:?}",
        format,
        log_dir_path
    );
    Ok(guard)
}

/// Console-only logging for tests; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("method_factory=trace,method_core=trace,warn")),
        )
        .with_test_writer()
        .try_init();
}
