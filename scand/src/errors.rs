use shardscan_core::log::LogError;
use shardscan_scanner::{ScanError, SinkError};
use shardscan_simulator::SimulatorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Configuration: --logdir and --nologfiles cannot be used together")]
    MixedLogDirAndNoLogFiles,

    #[error("Configuration: --max-masters must be greater than zero")]
    ZeroMaxMasters,

    #[error("Configuration: --async-threads must be greater than zero")]
    ZeroAsyncThreads,

    #[error("Configuration: {0}")]
    Simulator(#[from] SimulatorError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed initializing the logger: {0}")]
    Log(#[from] LogError),

    #[error("failed opening the record output: {0}")]
    Output(#[from] SinkError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

pub type DaemonResult<T> = std::result::Result<T, DaemonError>;
