// Library root: re-exports all modules so integration tests and the binary
// share one public API.

pub mod config;
pub mod progress;
pub mod report;
pub mod roster;
