//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the `config`
//! and `dotenvy` crates. Variables use the `BILLING_BRIDGE` prefix and `__`
//! between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use billing_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "BILLING_BRIDGE";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; records are kept in memory when absent
    pub database: Option<DatabaseConfig>,

    /// Payment configuration (Stripe)
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `BILLING_BRIDGE__*` variables:
    ///
    /// - `BILLING_BRIDGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_BRIDGE__PAYMENT__STRIPE_API_KEY=...` -> `payment.stripe_api_key`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[(&str, &str)] = &[
        ("BILLING_BRIDGE__PAYMENT__STRIPE_API_KEY", "sk_test_xxx"),
        ("BILLING_BRIDGE__PAYMENT__STRIPE_PUBLISHABLE_KEY", "pk_test_xxx"),
        ("BILLING_BRIDGE__PAYMENT__STRIPE_WEBHOOK_SECRET", "whsec_xxx"),
        (
            "BILLING_BRIDGE__PAYMENT__CHECKOUT_SUCCESS_URL",
            "https://shop.example.com/sucesso",
        ),
        (
            "BILLING_BRIDGE__PAYMENT__CHECKOUT_CANCEL_URL",
            "https://shop.example.com/planos",
        ),
    ];

    const OPTIONAL_VARS: &[&str] = &[
        "BILLING_BRIDGE__DATABASE__URL",
        "BILLING_BRIDGE__SERVER__PORT",
        "BILLING_BRIDGE__SERVER__ENVIRONMENT",
        "BILLING_BRIDGE__PAYMENT__REDELIVER_ON_FAILURE",
    ];

    fn set_minimal_env() {
        for (key, value) in VARS {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in VARS {
            env::remove_var(key);
        }
        for key in OPTIONAL_VARS {
            env::remove_var(key);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_minimal_environment() {
        let config = load_with(&[]).unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.payment.currency, "brl");
        assert_eq!(config.payment.webhook_tolerance_secs, 300);
        assert!(!config.payment.redeliver_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_database_and_overrides() {
        let config = load_with(&[
            ("BILLING_BRIDGE__DATABASE__URL", "postgresql://test@localhost/billing"),
            ("BILLING_BRIDGE__SERVER__PORT", "8081"),
            ("BILLING_BRIDGE__SERVER__ENVIRONMENT", "production"),
            ("BILLING_BRIDGE__PAYMENT__REDELIVER_ON_FAILURE", "true"),
        ])
        .unwrap();

        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgresql://test@localhost/billing")
        );
        assert_eq!(config.server.port, 8081);
        assert!(config.is_production());
        assert!(config.payment.redeliver_on_failure);
    }

    #[test]
    fn test_missing_payment_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        assert!(AppConfig::load().is_err());
    }
}
