// src/verifier/mod.rs

pub mod key_cache;
pub mod model;

use crate::config::Config;
use crate::error::CognitoLoginError;
use base64::engine::{general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use key_cache::KeySetCache;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Verifies tokens issued by the user pool against its published key set.
///
/// Holds the configuration, the HTTP client used for key set fetches and the
/// injected [`KeySetCache`].
#[derive(Clone)]
pub struct TokenVerifier {
    config: Arc<Config>,
    http_client: reqwest::Client,
    key_cache: KeySetCache,
}

impl TokenVerifier {
    pub fn new(config: Arc<Config>, http_client: reqwest::Client, key_cache: KeySetCache) -> Self {
        Self {
            config,
            http_client,
            key_cache,
        }
    }

    /// Verifies an access token: signature, issuer and expiry.
    ///
    /// Cognito access tokens carry `client_id` rather than `aud`, so no audience
    /// check is made.
    #[instrument(skip(self, token), err)]
    pub async fn verify_access_token(
        &self,
        token: &str,
    ) -> Result<Map<String, Value>, CognitoLoginError> {
        let (_, claims) = self.verify(token, None).await?;
        Ok(claims)
    }

    /// Verifies an identity token: signature, issuer, expiry and audience (the
    /// client id). When the token carries `at_hash`, it must match `access_token`.
    #[instrument(skip(self, token, access_token), err)]
    pub async fn verify_id_token(
        &self,
        token: &str,
        access_token: &str,
    ) -> Result<Map<String, Value>, CognitoLoginError> {
        let (alg, claims) = self
            .verify(token, Some(self.config.client_id.as_str()))
            .await?;

        if let Some(expected) = claims.get("at_hash").and_then(Value::as_str) {
            match at_hash(alg, access_token) {
                Some(actual) if actual == expected => {}
                _ => {
                    warn!("at_hash claim does not match the access token");
                    return Err(CognitoLoginError::AccessTokenMismatch);
                }
            }
        }
        Ok(claims)
    }

    /// Returns the signing algorithm from the header along with the verified claims.
    async fn verify(
        &self,
        token: &str,
        audience: Option<&str>,
    ) -> Result<(Algorithm, Map<String, Value>), CognitoLoginError> {
        // 1. Decode header to get kid and alg without validation.
        let header = decode_header(token)?;

        // 2. Check if the algorithm is allowed.
        if !self.config.validation.algorithms.contains(&header.alg) {
            return Err(CognitoLoginError::UnsupportedAlgorithm(header.alg));
        }

        // 3. Locate the key.
        let kid = header.kid.ok_or(CognitoLoginError::MissingKeyId)?;
        let decoding_key = self.decoding_key(&kid).await?;

        // 4. Construct validation options.
        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.validation.leeway.as_secs();
        validation.set_issuer(&[self.config.issuer()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        // 5. Decode and validate.
        let token_data = decode::<Map<String, Value>>(token, &decoding_key, &validation)?;
        Ok((header.alg, token_data.claims))
    }

    /// Finds the key for `kid`, re-fetching the key set once if the cached set
    /// does not have it.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, CognitoLoginError> {
        let jwks_uri = &self.config.jwks_uri;
        let set = self.key_cache.get(&self.http_client, jwks_uri).await?;
        if let Some(jwk) = set.find(kid) {
            return jwk.decoding_key();
        }

        debug!(kid = %kid, "Key not in cached set, re-fetching JWKS");
        let set = self.key_cache.refresh(&self.http_client, jwks_uri).await?;
        set.find(kid)
            .ok_or_else(|| CognitoLoginError::KeyNotFound(kid.to_string()))?
            .decoding_key()
    }
}

/// Computes the OIDC `at_hash` of an access token: the base64url encoding of the
/// left half of its digest, using the hash that matches the signing algorithm.
pub fn at_hash(alg: Algorithm, access_token: &str) -> Option<String> {
    let digest = match alg {
        Algorithm::RS256 | Algorithm::PS256 | Algorithm::ES256 | Algorithm::HS256 => {
            Sha256::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 | Algorithm::HS384 => {
            Sha384::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::RS512 | Algorithm::PS512 | Algorithm::HS512 => {
            Sha512::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::EdDSA => return None,
    };
    Some(URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2]))
}
