//! Command handlers.
//!
//! Each handler takes the resolved [`CliContext`](crate::CliContext), calls
//! into `sqlany-runtime` and formats the result for the terminal.

pub mod clean;
pub mod fingerprint;
pub mod install;
pub mod resolve;
pub mod status;
