// Library module for hashcalc
// Re-exports modules for use in integration tests and the launcher binary

pub mod config;
pub mod hash;
pub mod logging;
pub mod workspace;
