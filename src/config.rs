use std::env;
use std::time::Duration;

/// Settings for the external payment processor.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Processor API root, e.g. `https://api.flutterwave.com/v3`
    pub api_base: String,
    /// Secret key for the processor API. Without it every checkout link degrades
    /// to the placeholder URL.
    pub secret_key: Option<String>,
    pub currency: String,
    pub timeout: Duration,
    /// Where the processor sends the customer after checkout
    pub redirect_url: String,
    /// Base of the placeholder link handed out when link creation fails
    pub placeholder_base: String,
    /// Shared secret the processor echoes in the `verif-hash` header
    pub webhook_hash: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub strict_rpm: u32,
    pub standard_rpm: u32,
    pub relaxed_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 10,
            standard_rpm: 30,
            relaxed_rpm: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub dev_mode: bool,
    pub payment: PaymentConfig,
    pub rate_limit: RateLimitConfig,
    /// Empty = allow any origin (widget embeds on tenant sites)
    pub cors_allowed_origins: Vec<String>,
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("TOOLMARKET_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let timeout_secs = env::var("PAYMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let payment = PaymentConfig {
            api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.flutterwave.com/v3".to_string()),
            secret_key: env_non_empty("PAYMENT_SECRET_KEY"),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            timeout: Duration::from_secs(timeout_secs),
            redirect_url: env::var("PAYMENT_REDIRECT_URL")
                .unwrap_or_else(|_| format!("{}/payments/complete", base_url)),
            placeholder_base: env::var("PAYMENT_PLACEHOLDER_BASE")
                .unwrap_or_else(|_| "https://checkout.flutterwave.com/pay".to_string()),
            webhook_hash: env_non_empty("PAYMENT_WEBHOOK_HASH"),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            strict_rpm: env_u32("RATE_LIMIT_STRICT_RPM", defaults.strict_rpm),
            standard_rpm: env_u32("RATE_LIMIT_STANDARD_RPM", defaults.standard_rpm),
            relaxed_rpm: env_u32("RATE_LIMIT_RELAXED_RPM", defaults.relaxed_rpm),
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "toolmarket.db".to_string()),
            base_url,
            dev_mode,
            payment,
            rate_limit,
            cors_allowed_origins,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
