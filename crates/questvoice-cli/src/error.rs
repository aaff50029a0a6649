//! CLI-specific error types and exit codes.

use questvoice_core::{GenerationError, SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed transcript or settings file.
    #[error("Invalid input data: {0}")]
    Data(String),

    /// Speech ran but ended in an error.
    #[error("Speech failed: {0}")]
    Speech(String),
}

impl CliError {
    /// Exit code, following sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Speech(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Data(_) => 65,     // EX_DATAERR
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<GenerationError> for CliError {
    fn from(err: GenerationError) -> Self {
        Self::Config(err.to_string())
    }
}
