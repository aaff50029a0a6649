#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod config;
mod error;
mod http;
mod ledger;
mod producer;
pub mod text;

pub use config::{LedgerClientConfig, SynthClientConfig};
pub use http::HttpSynthesisClient;
pub use ledger::HttpCostLedger;
pub use producer::SpeechProducer;
pub use text::sanitize_for_speech;

// Dev-dependencies only used by integration tests
#[cfg(test)]
use bytes as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use wiremock as _;
