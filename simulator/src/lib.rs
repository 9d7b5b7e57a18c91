//! A deterministic, seeded stand-in for a verified sharded ledger source.

pub mod errors;
pub mod ledger;
pub mod params;
pub mod simulator;

pub use errors::{SimulatorError, SimulatorResult};
pub use params::SimulatorParams;
pub use simulator::ShardchainSimulator;
