extern crate self as shardscan_core;

pub mod log;
pub mod panic;
pub mod signals;
pub mod time;
