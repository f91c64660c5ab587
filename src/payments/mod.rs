mod gateway;
mod tx_ref;
mod webhook;

pub use gateway::*;
pub use tx_ref::*;
pub use webhook::*;

use thiserror::Error;

/// Why the processor could not issue a checkout link.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("payment processor secret key is not configured")]
    MissingCredentials,

    #[error("payment processor request timed out")]
    Timeout,

    #[error("payment processor unreachable: {0}")]
    Network(String),

    #[error("payment processor returned HTTP {0}")]
    Status(u16),

    #[error("payment processor response unusable: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if let Some(status) = e.status() {
            UpstreamError::Status(status.as_u16())
        } else if e.is_decode() {
            UpstreamError::InvalidResponse(e.to_string())
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

/// A checkout URL for the customer. Always carries a usable URL.
#[derive(Debug)]
pub enum CheckoutLink {
    /// The processor issued a hosted checkout page
    Issued { url: String, tx_ref: TxRef },
    /// The processor call failed; `url` is the placeholder built from `tx_ref`
    Degraded {
        url: String,
        tx_ref: TxRef,
        reason: UpstreamError,
    },
}

impl CheckoutLink {
    pub fn url(&self) -> &str {
        match self {
            CheckoutLink::Issued { url, .. } | CheckoutLink::Degraded { url, .. } => url,
        }
    }

    pub fn tx_ref(&self) -> &TxRef {
        match self {
            CheckoutLink::Issued { tx_ref, .. } | CheckoutLink::Degraded { tx_ref, .. } => tx_ref,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CheckoutLink::Degraded { .. })
    }

    pub fn into_url(self) -> String {
        match self {
            CheckoutLink::Issued { url, .. } | CheckoutLink::Degraded { url, .. } => url,
        }
    }
}
