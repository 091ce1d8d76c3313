use std::{env, time::Duration};

use anyhow::{Context, bail};

/// Which payment provider backs the checkout. Chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProviderConfig {
    Mock,
    Stripe {
        publishable_key: String,
        api_base: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub payment_provider: PaymentProviderConfig,
    pub http_timeout: Duration,
    pub redirect_delay: Duration,
    pub host: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url = env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let http_timeout = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let redirect_delay = env::var("CHECKOUT_REDIRECT_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(2000));
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());

        let provider = env::var("PAYMENT_PROVIDER").unwrap_or_else(|_| "mock".to_string());
        let payment_provider = parse_provider(
            &provider,
            env::var("STRIPE_PUBLISHABLE_KEY").ok(),
            env::var("STRIPE_API_BASE").ok(),
        )?;

        Ok(Self {
            api_base_url,
            payment_provider,
            http_timeout,
            redirect_delay,
            host,
            port,
            jwt_secret,
        })
    }

    pub fn require_jwt_secret(&self) -> anyhow::Result<&str> {
        self.jwt_secret
            .as_deref()
            .context("JWT_SECRET is not set")
    }
}

fn parse_provider(
    name: &str,
    publishable_key: Option<String>,
    api_base: Option<String>,
) -> anyhow::Result<PaymentProviderConfig> {
    match name.trim().to_ascii_lowercase().as_str() {
        "mock" | "" => Ok(PaymentProviderConfig::Mock),
        "stripe" => {
            let publishable_key = publishable_key
                .filter(|k| !k.is_empty())
                .context("STRIPE_PUBLISHABLE_KEY is required when PAYMENT_PROVIDER=stripe")?;
            Ok(PaymentProviderConfig::Stripe {
                publishable_key,
                api_base: api_base.unwrap_or_else(|| "https://api.stripe.com/v1".to_string()),
            })
        }
        other => bail!("unknown PAYMENT_PROVIDER `{other}` (expected `mock` or `stripe`)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_mock_provider() {
        assert_eq!(
            parse_provider("", None, None).unwrap(),
            PaymentProviderConfig::Mock
        );
        assert_eq!(
            parse_provider("MOCK", None, None).unwrap(),
            PaymentProviderConfig::Mock
        );
    }

    #[test]
    fn stripe_requires_publishable_key() {
        assert!(parse_provider("stripe", None, None).is_err());
        let cfg = parse_provider("stripe", Some("pk_test_123".into()), None).unwrap();
        assert_eq!(
            cfg,
            PaymentProviderConfig::Stripe {
                publishable_key: "pk_test_123".into(),
                api_base: "https://api.stripe.com/v1".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(parse_provider("paypal", None, None).is_err());
    }
}
