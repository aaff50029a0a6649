//! Builder-style configuration for the HTTP adapters.
//!
//! ```
//! use questvoice_synth::SynthClientConfig;
//! use std::time::Duration;
//!
//! let config = SynthClientConfig::new("https://tts.example.com/v1/speech")
//!     .with_timeout(Duration::from_secs(20))
//!     .with_token("secret");
//! ```

use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn default_user_agent() -> String {
    concat!("questvoice/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Configuration for [`HttpSynthesisClient`](crate::HttpSynthesisClient).
#[derive(Debug, Clone)]
pub struct SynthClientConfig {
    pub(crate) endpoint: String,
    pub(crate) token: Option<String>,
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
}

impl SynthClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    /// Bearer token sent with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Whole-request timeout. Defaults to 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Configuration for [`HttpCostLedger`](crate::HttpCostLedger).
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub(crate) endpoint: String,
    pub(crate) token: Option<String>,
    pub(crate) timeout: Duration,
    /// Units charged per generated message.
    pub(crate) units: u32,
}

impl LedgerClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: Duration::from_secs(10),
            units: 1,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }
}
