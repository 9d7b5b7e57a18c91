pub mod common;

#[cfg(test)]
pub mod scan_integration_tests;
