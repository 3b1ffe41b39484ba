//! xnlogo command-line tool
//!
//! Argument parsing, configuration and subcommands, exposed as a library
//! for testing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use commands::{run, Outcome};
pub use config::XnlogoConfig;
pub use error::{CliError, Result};
