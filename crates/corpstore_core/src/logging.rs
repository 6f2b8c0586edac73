//! Logging bootstrap for embedding applications.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend exactly once per process.
//! - Emit metadata-only diagnostic events (`event=... module=... status=...`).
//!
//! # Invariants
//! - Initialization is idempotent for identical settings.
//! - Conflicting re-initialization is rejected, never applied.
//! - Initialization never panics.

use crate::config::LogConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "corpstore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSettings {
    level: &'static str,
    log_dir: Option<PathBuf>,
}

struct LoggingState {
    settings: ActiveSettings,
    _logger: LoggerHandle,
}

/// Initializes logging from configuration.
///
/// `config.dir = None` writes to stderr; otherwise rolling files named
/// `corpstore*.log` are written to that absolute directory.
///
/// # Errors
/// - Unsupported level, relative or uncreatable directory.
/// - Already initialized with different settings.
/// - Backend startup failure.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let requested = ActiveSettings {
        level: normalize_level(&config.level)?,
        log_dir: config.dir.as_deref().map(normalize_log_dir).transpose()?,
    };

    let state = LOGGING_STATE.get_or_try_init(|| start_backend(&requested))?;
    if state.settings != requested {
        return Err(format!(
            "logging already initialized with {}; refusing to switch to {}",
            describe(&state.settings),
            describe(&requested)
        ));
    }
    Ok(())
}

/// Returns `(level, log_dir)` of active logging, `None` before init.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.settings.level, state.settings.log_dir.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Maps user input onto a supported level name.
pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(dir: &Path) -> Result<PathBuf, String> {
    if dir.as_os_str().is_empty() {
        return Err("log dir cannot be empty".to_string());
    }
    if !dir.is_absolute() {
        return Err(format!(
            "log dir must be an absolute path, got `{}`",
            dir.display()
        ));
    }
    Ok(dir.to_path_buf())
}

fn start_backend(settings: &ActiveSettings) -> Result<LoggingState, String> {
    let logger = Logger::try_with_str(settings.level)
        .map_err(|err| format!("invalid log level `{}`: {err}", settings.level))?;

    let logger = match &settings.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
        None => logger.start(),
    }
    .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();
    info!(
        "event=logging_init module=core status=ok {} version={}",
        describe(settings),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        settings: settings.clone(),
        _logger: logger,
    })
}

fn describe(settings: &ActiveSettings) -> String {
    match &settings.log_dir {
        Some(dir) => format!("level={} log_dir={}", settings.level, dir.display()),
        None => format!("level={} log_dir=stderr", settings.level),
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payloads may echo field values; keep them single-line and short.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!("event=panic_captured module=core status=error location={location} payload={payload}");
        previous_hook(panic_info);
    }));
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, normalize_level, normalize_log_dir, sanitize_message};
    use crate::config::LogConfig;
    use std::path::Path;

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn normalize_log_dir_rejects_relative_path() {
        let error = normalize_log_dir(Path::new("logs/dev")).unwrap_err();
        assert!(error.contains("absolute"));
    }

    #[test]
    fn sanitize_message_removes_newlines_and_truncates() {
        let sanitized = sanitize_message("line1\nline2\rline3", 8);
        assert!(!sanitized.contains('\n'));
        assert!(!sanitized.contains('\r'));
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            level: "info".to_string(),
            dir: Some(dir.path().to_path_buf()),
        };

        init_logging(&config).unwrap();
        init_logging(&config).unwrap();

        let level_conflict = LogConfig {
            level: "debug".to_string(),
            ..config.clone()
        };
        assert!(init_logging(&level_conflict)
            .unwrap_err()
            .contains("refusing to switch"));

        let stderr_conflict = LogConfig {
            dir: None,
            ..config.clone()
        };
        assert!(init_logging(&stderr_conflict)
            .unwrap_err()
            .contains("refusing to switch"));

        let (level, active_dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(active_dir.as_deref(), Some(dir.path()));
    }
}
