use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use log::*;
use rpg_common::{helpers::parse_boolean_flag, Secret};

use crate::{
    helpers::{HmacSignatureVerifier, SharedSecretVerifier},
    traits::CallbackVerifier,
};

const DEFAULT_API_SECRET: &str = "your-secret-key";
const DEFAULT_GATEWAY_BASE_URL: &str = "https://mock-payment-gateway.com";
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MOCK_SUCCESS_RATE: f64 = 0.95;

/// What happens to a `pending` order when its payment is declined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailedPaymentPolicy {
    /// The order stays `pending` and may be paid again.
    #[default]
    KeepPending,
    /// The order moves to `failed`.
    MarkFailed,
}

impl FromStr for FailedPaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_pending" | "pending" => Ok(Self::KeepPending),
            "mark_failed" | "failed" => Ok(Self::MarkFailed),
            _ => Err(format!("'{s}' is not a failed payment policy. Use keep_pending or mark_failed")),
        }
    }
}

/// How payment callbacks are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureScheme {
    /// The signature must equal the API secret.
    #[default]
    SharedSecret,
    /// The signature must be an HMAC-SHA256 of the order and transaction ids, keyed with the API secret.
    Hmac,
}

impl FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared_secret" | "secret" => Ok(Self::SharedSecret),
            "hmac" | "hmac_sha256" => Ok(Self::Hmac),
            _ => Err(format!("'{s}' is not a signature scheme. Use shared_secret or hmac")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// When true, settlement results come from an outcome policy rather than a real gateway.
    pub mock_mode: bool,
    /// Shared secret for payment callbacks
    pub api_secret: Secret<String>,
    pub signature_scheme: SignatureScheme,
    /// Base URL of the payment gateway. QR payment links point here.
    pub gateway_base_url: String,
    /// Upper bound on any single call to a payment strategy
    pub gateway_timeout: Duration,
    /// Probability that a mock payment succeeds
    pub mock_success_rate: f64,
    pub failed_payment_policy: FailedPaymentPolicy,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            mock_mode: true,
            api_secret: Secret::new(DEFAULT_API_SECRET.to_string()),
            signature_scheme: SignatureScheme::default(),
            gateway_base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
            mock_success_rate: DEFAULT_MOCK_SUCCESS_RATE,
            failed_payment_policy: FailedPaymentPolicy::default(),
        }
    }
}

impl PaymentConfig {
    pub fn from_env_or_defaults() -> Self {
        let mock_mode = parse_boolean_flag(env::var("RPG_MOCK_MODE").ok(), true);
        let api_secret = env::var("RPG_API_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ RPG_API_SECRET is not set. Falling back to the well-known default secret. Do not run like this \
                 in production."
            );
            DEFAULT_API_SECRET.to_string()
        });
        let api_secret = Secret::new(api_secret);
        let signature_scheme = parse_env("RPG_SIGNATURE_SCHEME", SignatureScheme::default());
        let gateway_base_url = env::var("RPG_GATEWAY_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("🪛️ RPG_GATEWAY_BASE_URL is not set. Using {DEFAULT_GATEWAY_BASE_URL}");
                DEFAULT_GATEWAY_BASE_URL.to_string()
            });
        let gateway_timeout = env::var("RPG_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        warn!(
                            "🪛️ {s} is not a valid value for RPG_GATEWAY_TIMEOUT_MS. {e} Using the default of {}ms.",
                            DEFAULT_GATEWAY_TIMEOUT.as_millis()
                        )
                    })
                    .ok()
            })
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        let mock_success_rate = parse_env("RPG_MOCK_SUCCESS_RATE", DEFAULT_MOCK_SUCCESS_RATE);
        let failed_payment_policy = parse_env("RPG_FAILED_PAYMENT_POLICY", FailedPaymentPolicy::default());
        if !mock_mode {
            warn!("🪛️ Mock mode is off. Payments need a real payment gateway to be configured.");
        }
        Self {
            mock_mode,
            api_secret,
            signature_scheme,
            gateway_base_url,
            gateway_timeout,
            mock_success_rate,
            failed_payment_policy,
        }
    }

    /// The callback verifier for the configured signature scheme, keyed with the API secret.
    pub fn callback_verifier(&self) -> Arc<dyn CallbackVerifier> {
        match self.signature_scheme {
            SignatureScheme::SharedSecret => Arc::new(SharedSecretVerifier::new(self.api_secret.clone())),
            SignatureScheme::Hmac => Arc::new(HmacSignatureVerifier::new(self.api_secret.clone())),
        }
    }

    pub fn with_mock_mode(mut self, mock_mode: bool) -> Self {
        self.mock_mode = mock_mode;
        self
    }

    pub fn with_api_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.api_secret = Secret::new(secret.into());
        self
    }

    pub fn with_signature_scheme(mut self, scheme: SignatureScheme) -> Self {
        self.signature_scheme = scheme;
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn with_failed_payment_policy(mut self, policy: FailedPaymentPolicy) -> Self {
        self.failed_payment_policy = policy;
        self
    }
}

fn parse_env<T>(var: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(var) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid value for {var}: {e}. Using the default, {default}.");
            default
        }),
        Err(_) => default,
    }
}

impl Display for FailedPaymentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedPaymentPolicy::KeepPending => write!(f, "keep_pending"),
            FailedPaymentPolicy::MarkFailed => write!(f, "mark_failed"),
        }
    }
}

impl Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureScheme::SharedSecret => write!(f, "shared_secret"),
            SignatureScheme::Hmac => write!(f, "hmac"),
        }
    }
}
