// src/verifier/key_cache.rs

use super::model::KeySet;
use crate::config::Config;
use crate::error::CognitoLoginError;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// A cache of fetched JSON Web Key Sets, keyed by JWKS URI.
///
/// The cache is an explicit object handed to the broker, so its lifetime is
/// the caller's choice:
///
/// * one process-wide instance, shared by cloning, whose entries expire after a
///   time-to-live (see [`KeySetCache::from_config`]);
/// * one fresh instance per inbound request, which fetches the key set at most
///   once for that request.
///
/// A cached key set is never mutated, only replaced wholesale on re-fetch.
#[derive(Clone)]
pub struct KeySetCache {
    // Internally ref-counted; clones share entries.
    sets: Cache<String, Arc<KeySet>>,
}

impl KeySetCache {
    /// Creates a cache whose entries expire `ttl` after they were fetched.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sets: Cache::builder()
                .max_capacity(16)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Creates a cache using the configured `key_cache_ttl`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.key_cache_ttl)
    }

    /// Returns the cached key set for `jwks_uri`, fetching it on a miss.
    pub async fn get(
        &self,
        http_client: &reqwest::Client,
        jwks_uri: &Url,
    ) -> Result<Arc<KeySet>, CognitoLoginError> {
        if let Some(set) = self.sets.get(jwks_uri.as_str()).await {
            debug!("JWKS cache hit for {}", jwks_uri);
            return Ok(set);
        }
        debug!("JWKS cache miss for {}. Fetching from provider.", jwks_uri);
        self.refresh(http_client, jwks_uri).await
    }

    /// Fetches the key set for `jwks_uri` and replaces whatever was cached.
    #[instrument(skip(self, http_client), err)]
    pub async fn refresh(
        &self,
        http_client: &reqwest::Client,
        jwks_uri: &Url,
    ) -> Result<Arc<KeySet>, CognitoLoginError> {
        let set: KeySet = http_client
            .get(jwks_uri.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("Successfully fetched {} keys.", set.keys.len());

        let set = Arc::new(set);
        self.sets
            .insert(jwks_uri.as_str().to_string(), Arc::clone(&set))
            .await;
        Ok(set)
    }

    /// Drops every cached key set; the next lookup fetches again.
    pub fn invalidate(&self) {
        self.sets.invalidate_all();
    }
}

impl Default for KeySetCache {
    /// A cache holding key sets for 24 hours.
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 60 * 60))
    }
}
