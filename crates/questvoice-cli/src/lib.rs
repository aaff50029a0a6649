#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

// Only used by the binary
use dotenvy as _;
use tracing_subscriber as _;

// Dev-dependencies only used in some test modules
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use wiremock as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod transcript;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use error::CliError;
pub use parser::{Cli, Commands};
pub use transcript::Transcript;
