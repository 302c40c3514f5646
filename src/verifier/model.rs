// src/verifier/model.rs

use crate::error::CognitoLoginError;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    pub kid: String,
    pub kty: String,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

impl JsonWebKey {
    /// Builds the RSA decoding key from the modulus and exponent.
    pub fn decoding_key(&self) -> Result<DecodingKey, CognitoLoginError> {
        if self.kty != "RSA" {
            return Err(CognitoLoginError::InvalidKeyFormat(format!(
                "unsupported key type '{}' for kid {}",
                self.kty, self.kid
            )));
        }
        let n = self.n.as_deref().ok_or_else(|| {
            CognitoLoginError::InvalidKeyFormat("RSA key missing 'n' component".to_string())
        })?;
        let e = self.e.as_deref().ok_or_else(|| {
            CognitoLoginError::InvalidKeyFormat("RSA key missing 'e' component".to_string())
        })?;
        Ok(DecodingKey::from_rsa_components(n, e)?)
    }
}

/// Represents a JSON Web Key Set (JWKS), the document served at `.well-known/jwks.json`.
///
/// Key order is kept as published.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySet {
    pub keys: Vec<JsonWebKey>,
}

impl KeySet {
    /// Linear scan for the key with the given `kid`.
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}
