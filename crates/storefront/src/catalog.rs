//! Catalog loading.
//!
//! The product list is fetched exactly once, before the server starts
//! accepting requests. A failed load is terminal for the process lifetime:
//! the storefront keeps serving with [`CatalogStatus::Unavailable`] and shows
//! a "catalog unavailable" notice instead of the product grid.

use std::path::PathBuf;
use std::time::Duration;

use cardapio_core::Catalog;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog server answered with a non-success status.
    #[error("Unexpected status {0}")]
    Status(u16),

    /// Catalog file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Payload is not a JSON array of products.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Loading took longer than the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Where the product list is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Url(Url),
    File(PathBuf),
}

impl CatalogSource {
    /// `http://` and `https://` values are URLs, anything else is a path.
    ///
    /// # Errors
    ///
    /// Returns an error if a value with an HTTP scheme is not a valid URL.
    pub fn parse(value: &str) -> Result<Self, url::ParseError> {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            Url::parse(value).map(Self::Url)
        } else {
            Ok(Self::File(PathBuf::from(value)))
        }
    }
}

/// Outcome of the startup catalog load.
#[derive(Debug, Clone)]
pub enum CatalogStatus {
    Loaded(Catalog),
    Unavailable,
}

impl CatalogStatus {
    /// Load the catalog, logging and absorbing any failure.
    pub async fn load(source: &CatalogSource, timeout: Duration) -> Self {
        match load_catalog(source, timeout).await {
            Ok(catalog) => {
                tracing::info!(products = catalog.len(), "Catalog loaded");
                Self::Loaded(catalog)
            }
            Err(e) => {
                tracing::warn!(error = %e, ?source, "Catalog unavailable");
                Self::Unavailable
            }
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> Option<&Catalog> {
        match self {
            Self::Loaded(catalog) => Some(catalog),
            Self::Unavailable => None,
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Fetch and parse the product list.
///
/// # Errors
///
/// Returns `CatalogError` if the source cannot be read within `timeout` or
/// does not contain a product array.
#[instrument(skip(timeout))]
pub async fn load_catalog(
    source: &CatalogSource,
    timeout: Duration,
) -> Result<Catalog, CatalogError> {
    let bytes = match source {
        CatalogSource::Url(url) => fetch(url, timeout).await?,
        CatalogSource::File(path) => tokio::time::timeout(timeout, tokio::fs::read(path))
            .await
            .map_err(|_| CatalogError::Timeout(timeout))?
            .map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?,
    };

    Ok(Catalog::from_json(&bytes)?)
}

async fn fetch(url: &Url, timeout: Duration) -> Result<Vec<u8>, CatalogError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            CatalogError::Timeout(timeout)
        } else {
            CatalogError::Http(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Status(status.as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
}
