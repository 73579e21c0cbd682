//! Logging setup
//!
//! Two sinks are installed once per process:
//! - a size-rotating file in the system temp directory that records every
//!   level, formatted as `<time> - <target> - <LEVEL> - <message>`;
//! - stderr, filtered by `TDA_LOG_LEVEL` (default `INFO`), formatted as
//!   `<LEVEL> - <target> - <message>`.

pub mod rotating;

pub use rotating::{RotatingFile, DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES};

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable selecting the console log level
pub const LOG_LEVEL_ENV: &str = "TDA_LOG_LEVEL";

/// File name of the log inside the temp directory
pub const LOG_FILE_NAME: &str = "tda.log";

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Logging options
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Log file path
    pub log_file: PathBuf,
    /// Console level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`)
    pub console_level: Option<String>,
    /// Size limit of the active log file
    pub max_bytes: u64,
    /// Rotated files to keep
    pub backup_count: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            console_level: None,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
        }
    }
}

impl LoggingOptions {
    /// Defaults with the console level read from `TDA_LOG_LEVEL`
    pub fn from_env() -> Self {
        Self {
            console_level: std::env::var(LOG_LEVEL_ENV).ok(),
            ..Self::default()
        }
    }
}

/// `<temp dir>/tda.log`
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}

/// Map a level name to a filter; unknown names fall back to INFO
pub fn parse_level(name: Option<&str>) -> LevelFilter {
    match name.map(|n| n.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") => LevelFilter::TRACE,
        Some("DEBUG") => LevelFilter::DEBUG,
        Some("INFO") => LevelFilter::INFO,
        Some("WARNING") | Some("WARN") => LevelFilter::WARN,
        Some("ERROR") | Some("CRITICAL") => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

/// Install the file and console sinks; returns the log file path.
///
/// Only the first call installs anything; later calls return the path
/// chosen by the first one.
pub fn setup_logging(options: LoggingOptions) -> Result<PathBuf> {
    if let Some(path) = LOG_FILE.get() {
        return Ok(path.clone());
    }

    let file = RotatingFile::open(&options.log_file, options.max_bytes, options.backup_count)?;
    let console_level = parse_level(options.console_level.as_deref());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .event_format(DashFormat::file())
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer(console_level, std::io::stderr))
        .try_init()
        .map_err(|e| Error::Logging {
            message: e.to_string(),
        })?;

    let path = LOG_FILE.get_or_init(|| options.log_file.clone()).clone();
    tracing::debug!("Logging to {}", path.display());
    Ok(path)
}

/// Console sink at `level`, writing `<LEVEL> - <target> - <message>` lines
fn console_layer<S, W>(level: LevelFilter, writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .event_format(DashFormat::console())
        .with_filter(EnvFilter::new(level.to_string()))
}

/// Event format with ` - ` separated fields
#[derive(Debug, Clone, Copy)]
pub struct DashFormat {
    with_time: bool,
    level_first: bool,
}

impl DashFormat {
    /// `<time> - <target> - <LEVEL> - <message>`
    pub fn file() -> Self {
        Self {
            with_time: true,
            level_first: false,
        }
    }

    /// `<LEVEL> - <target> - <message>`
    pub fn console() -> Self {
        Self {
            with_time: false,
            level_first: true,
        }
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

impl<S, N> FormatEvent<S, N> for DashFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let level = level_name(meta.level());

        if self.with_time {
            SystemTime.format_time(&mut writer)?;
            write!(writer, " - ")?;
        }

        if self.level_first {
            write!(writer, "{} - {} - ", level, meta.target())?;
        } else {
            write!(writer, "{} - {} - ", meta.target(), level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::DEBUG);
        assert_eq!(parse_level(Some("debug")), LevelFilter::DEBUG);
        assert_eq!(parse_level(Some("WARNING")), LevelFilter::WARN);
        assert_eq!(parse_level(Some(" error ")), LevelFilter::ERROR);
        assert_eq!(parse_level(Some("verbose")), LevelFilter::INFO);
        assert_eq!(parse_level(None), LevelFilter::INFO);
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_honors_configured_level() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::registry()
            .with(console_layer(parse_level(Some("WARNING")), move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "tda_console", "hidden debug");
            tracing::info!(target: "tda_console", "hidden info");
            tracing::warn!(target: "tda_console", "shown warning");
            tracing::error!(target: "tda_console", "shown error");
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            output,
            "WARNING - tda_console - shown warning\nERROR - tda_console - shown error\n"
        );
    }

    #[test]
    fn test_level_is_read_from_environment() {
        std::env::set_var(LOG_LEVEL_ENV, "debug");
        let options = LoggingOptions::from_env();
        std::env::remove_var(LOG_LEVEL_ENV);

        assert_eq!(
            parse_level(options.console_level.as_deref()),
            LevelFilter::DEBUG
        );
    }

    #[test]
    fn test_default_log_file_is_in_temp_dir() {
        let path = default_log_file();
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        assert_eq!(path.parent().unwrap(), std::env::temp_dir());
    }

    #[test]
    fn test_setup_is_one_time_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = LoggingOptions {
            log_file: dir.path().join("first.log"),
            console_level: Some("ERROR".to_string()),
            ..Default::default()
        };
        let second = LoggingOptions {
            log_file: dir.path().join("second.log"),
            ..Default::default()
        };

        let path = setup_logging(first).unwrap();
        assert_eq!(setup_logging(second).unwrap(), path);

        tracing::debug!(target: "tda_test", "hello from the test");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains(" - tda_test - DEBUG - hello from the test"));
        assert!(!dir.path().join("second.log").exists());
    }
}
