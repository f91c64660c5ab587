//! Per-IP rate limits for the public API.
//!
//! The payment webhook is not limited; the processor retries on 429.

use std::sync::Arc;
use std::time::Duration;

use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

use crate::config::RateLimitConfig;

pub type RateLimitLayer = GovernorLayer<
    PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Which budget a route draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Onboarding: creates tenants and calls the payment processor.
    /// `RATE_LIMIT_STRICT_RPM`, default 10.
    Strict,
    /// Pricing, lead capture and widget config.
    /// `RATE_LIMIT_STANDARD_RPM`, default 30.
    Standard,
    /// License checks and health. `RATE_LIMIT_RELAXED_RPM`, default 60.
    Relaxed,
}

impl Tier {
    pub fn requests_per_minute(self, config: &RateLimitConfig) -> u32 {
        match self {
            Tier::Strict => config.strict_rpm,
            Tier::Standard => config.standard_rpm,
            Tier::Relaxed => config.relaxed_rpm,
        }
    }
}

/// A limiter for `tier` allowing a burst of its per-minute budget, refilled
/// evenly over the minute. Each call creates an independent limiter.
pub fn layer(tier: Tier, config: &RateLimitConfig) -> RateLimitLayer {
    let rpm = tier.requests_per_minute(config).max(1);
    let period = Duration::from_millis((60_000 / u64::from(rpm)).max(1));

    let governor = GovernorConfigBuilder::default()
        .period(period)
        .burst_size(rpm)
        .finish()
        .expect("period and burst size are non-zero");

    tracing::debug!("Rate limit tier {:?}: {} requests/minute", tier, rpm);
    GovernorLayer::new(Arc::new(governor))
}
