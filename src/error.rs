// src/error.rs

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// The primary error type for the `cognito-login` library.
///
/// These are faults: transport failures, bad configuration, tokens that fail
/// verification. Ordinary authentication failures (a forged callback, a provider
/// that refuses the grant, a stored identity that can no longer be refreshed) are
/// reported as [`Rejection`](crate::broker::Rejection) values instead.
#[derive(Debug, Error)]
pub enum CognitoLoginError {
    /// Errors originating from the `jsonwebtoken` crate during token verification.
    #[error("JWT validation error: {0}")]
    JwtValidation(#[from] jsonwebtoken::errors::Error),

    /// An error occurred during an HTTP request.
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A required configuration field is missing or empty.
    #[error("A required configuration field is missing: {0}")]
    MissingConfiguration(&'static str),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The algorithm specified in the JWT header is not allowed by the configuration.
    #[error("Unsupported algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    /// The JWT header is missing the required 'kid' (Key ID) field.
    #[error("The JWT header is missing the 'kid' (Key ID) field")]
    MissingKeyId,

    /// No key with the token's 'kid' exists in the provider's key set, even after a re-fetch.
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),

    /// A JSON Web Key is malformed or of an unsupported type.
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// The identity token's `at_hash` does not match the access token it was issued with.
    #[error("The id token's at_hash does not match the access token")]
    AccessTokenMismatch,

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint rejected the request with status {status} (error: {error:?})")]
    ProviderRejected {
        status: u16,
        error: Option<String>,
    },

    /// The token endpoint answered with success but left out a required field.
    #[error("Token response is missing '{0}'")]
    IncompleteTokenResponse(&'static str),

    /// The callback query string could not be decoded.
    #[error("Invalid callback query: {0}")]
    InvalidCallbackQuery(#[from] serde_urlencoded::de::Error),
}
