//! Configuration loaded from environment variables.
//!
//! # Server
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3001)
//! - `DATABASE_URL` - `PostgreSQL` connection string; the in-memory store is used when unset
//! - `ADMIN_EMAILS` - Comma-separated e-mails granted the admin role on sign-in
//! - `NATS_URL` - Publish domain events to NATS when set
//! - `PAYMENT_WEBHOOK_SECRET` - HMAC key for `POST /api/payments/webhook`; the webhook is disabled when unset
//! - `SEED_CATALOG` - Seed the sample catalog into an empty store (`true`/`false`, default false)
//! - `ZIP_CODE_DIGITS` - Length of a valid ZIP code (default: 6)
//!
//! # Client
//! - `STOREFRONT_API_URL` - Base URL of the storefront API (default: http://127.0.0.1:3001)
//! - `STOREFRONT_SESSION_DIR` - Directory holding cart, wishlist and session blobs (default: .storefront)
//! - `STORE_UPI_ID` - Store UPI payee id, fallback for every app
//! - `PHONEPE_UPI_ID`, `GOOGLEPAY_UPI_ID`, `PAYTM_UPI_ID` - Per-app payee ids
//! - `STORE_MERCHANT_NAME` - Payee name shown by the UPI app (default: Herambha Dryfruits)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::client::ApiClient;
use crate::domain::aggregates::{CustomerRules, PaymentMethod};
use crate::session::FileKvStore;

pub const DEFAULT_MERCHANT_NAME: &str = "Herambha Dryfruits";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Contains the database password
    pub database_url: Option<SecretString>,
    /// Lower-cased
    pub admin_emails: Vec<String>,
    pub nats_url: Option<String>,
    pub webhook_secret: Option<SecretString>,
    pub seed_catalog: bool,
    pub customer_rules: CustomerRules,
}

impl AppConfig {
    /// Load configuration from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        Ok(Self {
            host: env.parsed("HOST", "0.0.0.0")?,
            port: env.parsed("PORT", "3001")?,
            database_url: env.optional("DATABASE_URL").map(SecretString::from),
            admin_emails: env.list("ADMIN_EMAILS").into_iter().map(|e| e.to_lowercase()).collect(),
            nats_url: env.optional("NATS_URL"),
            webhook_secret: env.optional("PAYMENT_WEBHOOK_SECRET").map(SecretString::from),
            seed_catalog: env.parsed("SEED_CATALOG", "false")?,
            customer_rules: CustomerRules { zip_digits: env.parsed("ZIP_CODE_DIGITS", "6")? },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email.trim()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]), port: 3001, database_url: None, admin_emails: vec![], nats_url: None,
            webhook_secret: None, seed_catalog: false, customer_rules: CustomerRules::default(),
        }
    }
}

/// Client-side configuration for the session store and checkout.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    pub session_dir: PathBuf,
    pub checkout: CheckoutSettings,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        let api_url = env.or_default("STOREFRONT_API_URL", "http://127.0.0.1:3001");
        let api_url = Url::parse(&api_url).map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_API_URL".into(), e.to_string()))?;
        Ok(Self {
            api_url,
            session_dir: PathBuf::from(env.or_default("STOREFRONT_SESSION_DIR", ".storefront")),
            checkout: CheckoutSettings {
                payees: Payees {
                    store: env.optional("STORE_UPI_ID"),
                    phonepe: env.optional("PHONEPE_UPI_ID"),
                    google_pay: env.optional("GOOGLEPAY_UPI_ID"),
                    paytm: env.optional("PAYTM_UPI_ID"),
                },
                merchant_name: env.or_default("STORE_MERCHANT_NAME", DEFAULT_MERCHANT_NAME),
                customer_rules: CustomerRules { zip_digits: env.parsed("ZIP_CODE_DIGITS", "6")? },
                ..CheckoutSettings::default()
            },
        })
    }

    pub fn api_client(&self) -> ApiClient { ApiClient::new(self.api_url.clone()) }
    pub fn session_store(&self) -> FileKvStore { FileKvStore::new(&self.session_dir) }
}

/// UPI payee ids. App-specific ids fall back to the store id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payees {
    pub store: Option<String>,
    pub phonepe: Option<String>,
    pub google_pay: Option<String>,
    pub paytm: Option<String>,
}

impl Payees {
    pub fn for_method(&self, method: PaymentMethod) -> Option<&str> {
        let specific = match method {
            PaymentMethod::PhonePe => self.phonepe.as_deref(),
            PaymentMethod::GooglePay => self.google_pay.as_deref(),
            PaymentMethod::Paytm => self.paytm.as_deref(),
            PaymentMethod::BankTransfer => None,
        };
        specific.or(self.store.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub payees: Payees,
    pub merchant_name: String,
    pub customer_rules: CustomerRules,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Delay before leaving the checkout once payment is confirmed
    pub redirect_delay: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            payees: Payees::default(),
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            customer_rules: CustomerRules::default(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            redirect_delay: Duration::from_secs(3),
        }
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.optional(key).map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()).unwrap_or_default()
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default).parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
