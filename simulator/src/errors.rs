use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulatorError {
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("max split depth {0} exceeds the ledger limit of {1}")]
    SplitDepthTooLarge(u8, u8),

    #[error("at least one workchain must be simulated")]
    NoWorkchains,

    #[error("workchain {0} is reserved for the master chain")]
    MasterchainWorkchain(i32),
}

pub type SimulatorResult<T> = std::result::Result<T, SimulatorError>;
