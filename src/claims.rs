// src/claims.rs

use crate::error::CognitoLoginError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim name under which the refresh token is appended to the identity claims.
pub const REFRESH_TOKEN_CLAIM: &str = "refresh_token";

/// The claims of a verified identity token, plus the refresh token that goes with it.
///
/// The broker keeps no reference to this value. Callers persist it (usually in
/// their session) and hand it back to
/// [`IdentityBroker::check_identity`](crate::broker::IdentityBroker::check_identity)
/// on later requests. It serializes as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityClaims(Map<String, Value>);

impl IdentityClaims {
    /// Wraps a raw claim map.
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub(crate) fn with_refresh_token(mut self, refresh_token: &str) -> Self {
        self.0.insert(
            REFRESH_TOKEN_CLAIM.to_string(),
            Value::String(refresh_token.to_string()),
        );
        self
    }

    /// Returns a claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a string claim by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// The `exp` claim as seconds since the epoch.
    ///
    /// Fractional values are truncated; non-numeric values count as absent.
    pub fn exp(&self) -> Option<i64> {
        self.0
            .get("exp")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
    }

    /// The refresh token appended when the identity was obtained.
    pub fn refresh_token(&self) -> Option<&str> {
        self.get_str(REFRESH_TOKEN_CLAIM)
    }

    /// The `sub` claim, the user's stable identifier in the pool.
    pub fn sub(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// The `email` claim.
    pub fn email(&self) -> Option<&str> {
        self.get_str("email")
    }

    /// Borrows the underlying claim map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the claims and returns the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for IdentityClaims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

/// The token endpoint's success response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: String,
    /// Issued on the code grant; Cognito leaves it out on a refresh grant.
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

/// The error body the token endpoint returns alongside a non-success status.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderErrorBody {
    pub error: String,
}

/// The query parameters the provider appends to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
}

impl CallbackParams {
    /// Decodes the parameters from a raw query string (without the leading `?`).
    /// Unknown parameters are ignored.
    pub fn from_query(query: &str) -> Result<Self, CognitoLoginError> {
        Ok(serde_urlencoded::from_str(query)?)
    }
}
