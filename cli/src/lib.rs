//! Library half of the `examscan` binary.
//!
//! The command functions live here so integration tests can drive them
//! against a mock backend without spawning the binary.

pub mod cli;
pub mod commands;
pub mod context;
pub mod output;
pub mod timing;
pub mod utils;
