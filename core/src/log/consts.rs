pub const DEFAULT_LOGGER_ENV: &str = "RUST_LOG";

pub const LOG_FILE_NAME: &str = "shardscan.log";
pub const ERR_LOG_FILE_NAME: &str = "shardscan_err.log";

pub(super) const LOG_ARCHIVE_SUFFIX: &str = ".{}.gz";

pub(super) const LOG_FILE_BASE_ROLLS: u32 = 1;
pub(super) const LOG_FILE_MAX_ROLLS: u32 = 8;
pub(super) const LOG_FILE_MAX_SIZE: u64 = 50_000_000;

/// Console (stdout) log line pattern, with explicit UTC time zone denoted by the suffix Z
pub(super) const LOG_LINE_PATTERN_COLORED: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)(utc)}Z [{h({l:5.5})}] {m}{n}";
/// File log line pattern, with explicit UTC time zone denoted by the suffix Z
pub(super) const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)(utc)}Z [{l:5.5}] {t} {m}{n}";
