use std::fmt;

use rand::{distributions::Alphanumeric, Rng};

use crate::error::{msg, AppError, Result};

const TOKEN_LEN: usize = 16;

/// Correlation key round-tripped through the payment processor:
/// `{tenant_id}-{tool_slug}-{token}`.
///
/// Tenant ids and tokens never contain `-`, so the slug is everything between
/// the first and last dash and may itself contain dashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRef {
    pub tenant_id: String,
    pub tool_slug: String,
    pub token: String,
}

impl TxRef {
    pub fn generate(tenant_id: &str, tool_slug: &str) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self {
            tenant_id: tenant_id.to_string(),
            tool_slug: tool_slug.to_string(),
            token,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let malformed = || AppError::MalformedCallback(msg::MALFORMED_TX_REF.to_string());

        let (tenant_id, rest) = raw.split_once('-').ok_or_else(malformed)?;
        let (tool_slug, token) = rest.rsplit_once('-').ok_or_else(malformed)?;

        if tenant_id.is_empty() || tool_slug.is_empty() || token.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            tenant_id: tenant_id.to_string(),
            tool_slug: tool_slug.to_string(),
            token: token.to_string(),
        })
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tenant_id, self.tool_slug, self.token)
    }
}
