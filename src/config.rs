//! Client configuration.
//!
//! Every field has a default, so a configuration file only needs the values
//! it changes:
//!
//! ```
//! use author_books::{ClientConfig, FetchPolicy};
//!
//! let config = ClientConfig::from_toml_str(r#"
//!     fetch_policy = "network-only"
//!
//!     [cache]
//!     watch_capacity = 16
//! "#).unwrap();
//! assert_eq!(config.fetch_policy, FetchPolicy::NetworkOnly);
//! assert_eq!(config.cache.watch_capacity, 16);
//! assert!(config.log_errors);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BooksError, BooksResult, ValidationError};

/// Where a query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Answer from the cache when the whole result is cached.
    #[default]
    CacheFirst,
    /// Always ask the server, then update the cache.
    NetworkOnly,
    /// Never ask the server.
    CacheOnly,
}

/// Normalized cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Per-subscriber queue length for change events.
    pub watch_capacity: usize,
    /// Identity field per typename, when it is not `id`.
    pub key_fields: BTreeMap<String, String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            watch_capacity: 1024,
            key_fields: BTreeMap::new(),
        }
    }
}

/// Settings for [`crate::BooksClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Default fetch policy for queries.
    pub fetch_policy: FetchPolicy,
    /// Log surfaced failures with `tracing::error!`.
    pub log_errors: bool,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fetch_policy: FetchPolicy::CacheFirst,
            log_errors: true,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns a validation error when the document is not valid TOML or a
    /// value has the wrong type.
    pub fn from_toml_str(source: &str) -> BooksResult<Self> {
        toml::from_str(source).map_err(|e| {
            BooksError::Validation(ValidationError::InvalidVariables {
                operation: "config".to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Render as TOML.
    ///
    /// # Errors
    /// Returns an internal error if serialization fails.
    pub fn to_toml_string(&self) -> BooksResult<String> {
        toml::to_string(self).map_err(|e| BooksError::internal(format!("serialize config: {e}")))
    }
}
