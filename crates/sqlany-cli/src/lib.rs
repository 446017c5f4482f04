//! Operator CLI for the SQL Anywhere driver loader.
//!
//! `main.rs` is the composition root; everything else lives here so the
//! parser and handlers can be tested without spawning the binary.

#![deny(unsafe_code)]

pub mod commands;
pub mod context;
pub mod handlers;
pub mod parser;
pub mod utils;

pub use commands::Commands;
pub use context::CliContext;
pub use parser::Cli;
