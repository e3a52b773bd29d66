//! Logging setup.
//!
//! Wraps `flexi_logger` initialization. Logs go to stderr by default so that
//! stdout stays reserved for JSON packages and generated scripts; when
//! `log.directory` is set they go to files there, with warnings duplicated
//! to stderr.

use anyhow::Result;
use flexi_logger::{detailed_format, Duplicate, FileSpec, Logger, LoggerHandle};
use std::sync::Mutex;

use crate::config::LogConfig;

/// Kept alive for the life of the process and flushed on shutdown.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Start the logger. `RUST_LOG` takes precedence over `log.level`.
pub fn init(config: &LogConfig) -> Result<()> {
    let logger = Logger::try_with_env_or_str(&config.level)?;
    let logger = match &config.directory {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir.clone()).basename("gremlin-harness"))
            .duplicate_to_stderr(Duplicate::Warn),
        None => logger.log_to_stderr(),
    };
    let handle = logger.format(detailed_format).start()?;

    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        *guard = Some(handle);
    }

    log::debug!("logger started at level '{}'", config.level);
    Ok(())
}

/// Flush pending log lines. Call before the process exits.
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
        }
    }
}
