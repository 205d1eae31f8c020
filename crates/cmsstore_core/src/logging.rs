//! Rolling file logger for processes embedding the store.
//!
//! # Invariants
//! - At most one logger per process; the first successful config wins.
//! - Store events carry metadata only, never field content.

use flexi_logger::{Cleanup, Criterion, DeferredNow, FileSpec, Logger, LoggerHandle, Naming};
use log::{info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "cmsstore";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 5;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

/// Where and how verbosely the store logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    /// Absolute directory receiving `cmsstore*.log`.
    pub log_dir: PathBuf,
}

impl LoggingConfig {
    pub fn new(level: LevelFilter, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level,
            log_dir: log_dir.into(),
        }
    }

    /// Parses a level name such as `info` or `WARN`.
    pub fn parse(level: &str, log_dir: impl Into<PathBuf>) -> Result<Self, LoggingError> {
        let parsed = LevelFilter::from_str(level.trim())
            .map_err(|_| LoggingError::UnsupportedLevel(level.to_string()))?;
        Ok(Self::new(parsed, log_dir))
    }

    pub fn with_default_level(log_dir: impl Into<PathBuf>) -> Self {
        Self::new(default_log_level(), log_dir)
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeLogDir(PathBuf),
    CreateLogDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(flexi_logger::FlexiLoggerError),
    AlreadyInitialized {
        active: LoggingConfig,
        requested: LoggingConfig,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(f, "unsupported log level `{level}`"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log directory must be absolute: `{}`", dir.display())
            }
            Self::CreateLogDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "logger backend failed: {err}"),
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "logger already running with level={} dir={}; requested level={} dir={}",
                active.level,
                active.log_dir.display(),
                requested.level,
                requested.log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateLogDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<flexi_logger::FlexiLoggerError> for LoggingError {
    fn from(value: flexi_logger::FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

struct ActiveLogger {
    config: LoggingConfig,
    _handle: LoggerHandle,
}

/// Starts the rolling file logger, or confirms the running one matches.
///
/// # Errors
/// - `Off` level or a relative/empty `log_dir`.
/// - A logger already running with a different config.
/// - Directory creation or backend start failure.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    if config.level == LevelFilter::Off {
        return Err(LoggingError::UnsupportedLevel("off".to_string()));
    }
    if !config.log_dir.is_absolute() {
        return Err(LoggingError::RelativeLogDir(config.log_dir.clone()));
    }

    let active = ACTIVE_LOGGER.get_or_try_init(|| {
        let handle = start_file_logger(config.level, &config.log_dir)?;
        info!(
            "event=logging_init module=logging status=ok version={} level={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            config.level,
            config.log_dir.display()
        );
        Ok::<_, LoggingError>(ActiveLogger {
            config: config.clone(),
            _handle: handle,
        })
    })?;

    if active.config != *config {
        return Err(LoggingError::AlreadyInitialized {
            active: active.config.clone(),
            requested: config.clone(),
        });
    }
    Ok(())
}

fn start_file_logger(level: LevelFilter, dir: &Path) -> Result<LoggerHandle, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateLogDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let files = FileSpec::default()
        .directory(dir)
        .basename(LOG_FILE_BASENAME);
    let handle = Logger::try_with_str(level.to_string().to_ascii_lowercase())?
        .log_to_file(files)
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .append()
        .format_for_files(line_format)
        .start()?;
    Ok(handle)
}

/// `2026-01-31 12:00:00.000 INFO  cmsstore_core::db::open: event=...`
fn line_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record<'_>,
) -> std::io::Result<()> {
    write!(
        w,
        "{} {:<5} {}: {}",
        now.now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.args()
    )
}

/// The running logger's config, if one was started.
pub fn logging_status() -> Option<LoggingConfig> {
    ACTIVE_LOGGER.get().map(|active| active.config.clone())
}

/// `Debug` for debug builds, `Info` for release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, LoggingConfig, LoggingError};
    use log::LevelFilter;

    #[test]
    fn parse_accepts_level_names_in_any_case() {
        let config = LoggingConfig::parse(" WARN ", "/tmp/cms").unwrap();
        assert_eq!(config.level, LevelFilter::Warn);
        assert!(matches!(
            LoggingConfig::parse("verbose", "/tmp/cms"),
            Err(LoggingError::UnsupportedLevel(level)) if level == "verbose"
        ));
    }

    #[test]
    fn relative_dir_and_off_level_are_rejected() {
        assert!(matches!(
            init_logging(&LoggingConfig::new(LevelFilter::Info, "logs")),
            Err(LoggingError::RelativeLogDir(_))
        ));
        assert!(matches!(
            init_logging(&LoggingConfig::new(LevelFilter::Info, "")),
            Err(LoggingError::RelativeLogDir(_))
        ));
        assert!(matches!(
            init_logging(&LoggingConfig::new(LevelFilter::Off, "/tmp/cms")),
            Err(LoggingError::UnsupportedLevel(_))
        ));
    }

    #[test]
    fn first_config_wins_for_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let config = LoggingConfig::new(LevelFilter::Info, dir.path());

        init_logging(&config).unwrap();
        init_logging(&config).unwrap();
        assert_eq!(logging_status(), Some(config.clone()));

        let louder = LoggingConfig::new(LevelFilter::Debug, dir.path());
        assert!(matches!(
            init_logging(&louder),
            Err(LoggingError::AlreadyInitialized { .. })
        ));
        let moved = LoggingConfig::new(LevelFilter::Info, other.path());
        let err = init_logging(&moved).unwrap_err();
        assert!(err.to_string().contains("already running"));
    }
}
