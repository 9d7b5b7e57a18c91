//! Logger and logging macros
//!
//! For the macros to properly compile, the calling crate must add a dependency to
//! crate log (ie. `log.workspace = true`).

mod appender;
mod consts;
mod logger;

pub use consts::{DEFAULT_LOGGER_ENV, ERR_LOG_FILE_NAME, LOG_FILE_NAME};
pub use logger::{FilterSpec, LogError};

use appender::AppenderSpec;
use log::LevelFilter;
use log4rs::{
    Config,
    config::{Logger, Root},
};

const CONSOLE_APPENDER: &str = "stdout";
const LOG_FILE_APPENDER: &str = "log_file";
const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

/// Builds the log4rs configuration for the given log directory and filter expression
/// without installing it. When `log_dir` is `None` only the console appender is used.
pub fn build_config(log_dir: Option<&str>, filters: &str) -> Result<Config, LogError> {
    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }
    let names = appenders.iter().map(|x| x.name).collect::<Vec<_>>();

    // Environment first so that explicit filters take precedence
    let mut spec = FilterSpec::from_env(DEFAULT_LOGGER_ENV);
    spec.merge(filters.parse()?);

    let loggers = spec
        .modules()
        .map(|(name, level)| Logger::builder().appenders(names.iter().copied()).additive(false).build(name, level))
        .collect::<Vec<_>>();

    Config::builder()
        .appenders(appenders.into_iter().map(|mut x| x.appender()))
        .loggers(loggers)
        .build(Root::builder().appenders(names).build(spec.root_level()))
        .map_err(LogError::from)
}

/// Installs the global logger. Must be called once, before any logging happens.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let config = build_config(log_dir, filters)?;
    log4rs::init_config(config)?;
    Ok(())
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        log::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        log::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        log::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        log::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        log::error!($($t)*)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_console_only() {
        let config = build_config(None, "info,shardscan_scanner=debug").unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), LevelFilter::Info);
        let scanner = config.loggers().iter().find(|x| x.name() == "shardscan_scanner").unwrap();
        assert_eq!(scanner.level(), LevelFilter::Debug);
    }

    #[test]
    fn test_build_config_with_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = build_config(dir.path().to_str(), "warn").unwrap();
        assert_eq!(config.appenders().len(), 3);
        assert_eq!(config.root().level(), LevelFilter::Warn);
    }
}
