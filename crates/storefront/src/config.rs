//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_WHATSAPP_NUMBER` - Number that receives orders (country code included)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `STOREFRONT_CATALOG_SOURCE` - Catalog JSON URL or file path
//!   (default: `crates/storefront/catalog/produtos.json`)
//! - `STOREFRONT_STORE_NAME` - Name printed in the order header (default: JS BURGUER)
//! - `CATALOG_TIMEOUT_SECS` - Catalog fetch timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use cardapio_core::Destination;
use thiserror::Error;

use crate::catalog::CatalogSource;

const DEFAULT_CATALOG_SOURCE: &str = "crates/storefront/catalog/produtos.json";
const DEFAULT_STORE_NAME: &str = "JS BURGUER";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Where the product list comes from
    pub catalog: CatalogConfig,
    /// Order handoff settings
    pub order: OrderConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Catalog source configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Upper bound on the startup fetch.
    pub timeout: Duration,
}

/// Order handoff configuration.
#[derive(Debug, Clone)]
pub struct OrderConfig {
    /// Number the order message is sent to.
    pub destination: Destination,
    /// Shop name in the order header.
    pub store_name: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let host = vars
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| invalid("STOREFRONT_HOST", e))?;
        let port = vars
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| invalid("STOREFRONT_PORT", e))?;
        let base_url = vars.or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url).map_err(|e| invalid("STOREFRONT_BASE_URL", e))?;

        let catalog = CatalogConfig {
            source: CatalogSource::parse(
                &vars.or_default("STOREFRONT_CATALOG_SOURCE", DEFAULT_CATALOG_SOURCE),
            )
            .map_err(|e| invalid("STOREFRONT_CATALOG_SOURCE", e))?,
            timeout: Duration::from_secs(
                vars.or_default("CATALOG_TIMEOUT_SECS", "10")
                    .parse::<u64>()
                    .map_err(|e| invalid("CATALOG_TIMEOUT_SECS", e))?,
            ),
        };

        let order = OrderConfig {
            destination: Destination::parse(&vars.required("STOREFRONT_WHATSAPP_NUMBER")?)
                .map_err(|e| invalid("STOREFRONT_WHATSAPP_NUMBER", e))?,
            store_name: vars.or_default("STOREFRONT_STORE_NAME", DEFAULT_STORE_NAME),
        };

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            order,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get a required variable. Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, ignoring empty values.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

fn invalid(key: &str, err: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), err.to_string())
}
