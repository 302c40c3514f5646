// src/config.rs

use crate::error::CognitoLoginError;
use jsonwebtoken::Algorithm;
use std::time::Duration;
use url::Url;

/// Contains the validation settings applied to tokens returned by the provider.
#[derive(Clone, Debug)]
pub struct ValidationDetails {
    /// The signing algorithms that are permitted. Cognito signs with RS256.
    pub algorithms: Vec<Algorithm>,
    /// The tolerance for clock skew when validating `exp`.
    /// Defaults to 60 seconds.
    pub leeway: Duration,
}

impl Default for ValidationDetails {
    fn default() -> Self {
        Self {
            algorithms: vec![Algorithm::RS256],
            leeway: Duration::from_secs(60),
        }
    }
}

/// The configuration for an [`IdentityBroker`](crate::broker::IdentityBroker).
///
/// All six provider fields are required. Build it with [`ConfigBuilder`] or load
/// it from the environment with [`Config::from_env`].
#[derive(Clone, Debug)]
pub struct Config {
    /// AWS region hosting the user pool, e.g. `eu-west-1`.
    pub region: String,
    /// The user pool identifier, e.g. `eu-west-1_AbCdEf123`.
    pub pool_id: String,
    /// Base URL of the hosted UI (`/login`, `/logout`, `/oauth2/token` live under it).
    pub domain: Url,
    /// The app client id registered in the pool. Used as the expected `aud`.
    pub client_id: String,
    /// The app client secret, sent with HTTP Basic auth to the token endpoint.
    pub client_secret: String,
    /// The redirect URI registered for the app client. Inserted verbatim into produced URLs.
    pub callback_url: String,
    /// Where the pool publishes its signing keys.
    pub jwks_uri: Url,
    /// Validation parameters for returned tokens.
    pub validation: ValidationDetails,
    /// Timeout applied to every outbound provider request.
    pub http_timeout: Duration,
    /// How long a process-wide key set cache keeps a fetched key set.
    pub key_cache_ttl: Duration,
}

impl Config {
    /// The `iss` claim Cognito puts in every token of this pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.pool_id
        )
    }

    /// The hosted UI token endpoint.
    pub fn token_endpoint(&self) -> Result<Url, CognitoLoginError> {
        self.domain
            .join("oauth2/token")
            .map_err(|e| CognitoLoginError::InvalidUrl(e.to_string()))
    }

    /// Loads the configuration from the process environment.
    ///
    /// Reads `AWS_REGION`, `COGNITO_POOL_ID`, `COGNITO_DOMAIN`, `COGNITO_CLIENT_ID`,
    /// `COGNITO_CLIENT_SECRET`, `COGNITO_CALLBACK_URL` and, optionally, `COGNITO_JWKS_URI`.
    pub fn from_env() -> Result<Self, CognitoLoginError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CognitoLoginError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ConfigBuilder::new();
        if let Some(region) = lookup("AWS_REGION") {
            builder = builder.region(region);
        }
        if let Some(pool_id) = lookup("COGNITO_POOL_ID") {
            builder = builder.pool_id(pool_id);
        }
        if let Some(domain) = lookup("COGNITO_DOMAIN") {
            builder = builder.domain(domain);
        }
        if let Some(client_id) = lookup("COGNITO_CLIENT_ID") {
            builder = builder.client_id(client_id);
        }
        if let Some(client_secret) = lookup("COGNITO_CLIENT_SECRET") {
            builder = builder.client_secret(client_secret);
        }
        if let Some(callback_url) = lookup("COGNITO_CALLBACK_URL") {
            builder = builder.callback_url(callback_url);
        }
        if let Some(jwks_uri) = lookup("COGNITO_JWKS_URI") {
            builder = builder.jwks_uri(&jwks_uri)?;
        }
        builder.build()
    }
}

/// A builder for creating a `Config` instance.
///
/// Nothing is validated until [`ConfigBuilder::build`], which fails on the first
/// missing field before any network activity can happen.
#[derive(Default)]
pub struct ConfigBuilder {
    region: Option<String>,
    pool_id: Option<String>,
    domain: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    callback_url: Option<String>,
    jwks_uri_override: Option<Url>,
    http_timeout: Option<Duration>,
    key_cache_ttl: Option<Duration>,
    validation: ValidationDetails,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the AWS region of the user pool. This is a required field.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the user pool id. This is a required field.
    pub fn pool_id(mut self, pool_id: impl Into<String>) -> Self {
        self.pool_id = Some(pool_id.into());
        self
    }

    /// Sets the hosted UI domain. This is a required field.
    ///
    /// A bare host such as `auth.example.com` is served over `https`; a value that
    /// already carries a scheme is used as given.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the app client id. This is a required field.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the app client secret. This is a required field.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the callback (redirect) URL. This is a required field.
    pub fn callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    /// Sets an explicit JWKS URI instead of the one derived from region and pool id.
    pub fn jwks_uri(mut self, url: &str) -> Result<Self, CognitoLoginError> {
        let parsed_url = Url::parse(url).map_err(|e| CognitoLoginError::InvalidUrl(e.to_string()))?;
        self.jwks_uri_override = Some(parsed_url);
        Ok(self)
    }

    /// Sets the allowed signing algorithms.
    /// Defaults to `[Algorithm::RS256]` if not set.
    pub fn algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.validation.algorithms = algorithms;
        self
    }

    /// Sets the clock skew tolerance.
    /// Defaults to 60 seconds.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway;
        self
    }

    /// Sets the timeout for outbound provider requests.
    /// Defaults to 10 seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Sets the time-to-live of a process-wide key set cache.
    /// Defaults to 24 hours.
    pub fn key_cache_ttl(mut self, ttl: Duration) -> Self {
        self.key_cache_ttl = Some(ttl);
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` naming the first required field that is
    /// absent or empty, or `InvalidUrl` if the domain cannot form a URL.
    pub fn build(self) -> Result<Config, CognitoLoginError> {
        let region = required(self.region, "region")?;
        let pool_id = required(self.pool_id, "pool_id")?;
        let domain = required(self.domain, "domain")?;
        let client_id = required(self.client_id, "client_id")?;
        let client_secret = required(self.client_secret, "client_secret")?;
        let callback_url = required(self.callback_url, "callback_url")?;

        let domain = hosted_ui_base(&domain)?;
        let jwks_uri = match self.jwks_uri_override {
            Some(uri) => uri,
            None => {
                let derived = format!(
                    "https://cognito-idp.{region}.amazonaws.com/{pool_id}/.well-known/jwks.json"
                );
                Url::parse(&derived).map_err(|e| CognitoLoginError::InvalidUrl(e.to_string()))?
            }
        };

        Ok(Config {
            region,
            pool_id,
            domain,
            client_id,
            client_secret,
            callback_url,
            jwks_uri,
            validation: self.validation,
            http_timeout: self.http_timeout.unwrap_or_else(|| Duration::from_secs(10)),
            key_cache_ttl: self
                .key_cache_ttl
                .unwrap_or_else(|| Duration::from_secs(24 * 60 * 60)),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, CognitoLoginError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CognitoLoginError::MissingConfiguration(field)),
    }
}

// Normalizes the domain to a base URL ending in '/', so `join` keeps any path prefix.
fn hosted_ui_base(domain: &str) -> Result<Url, CognitoLoginError> {
    let mut base = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| CognitoLoginError::InvalidUrl(e.to_string()))
}
