// src/broker.rs

use crate::claims::{CallbackParams, IdentityClaims, ProviderErrorBody, TokenSet};
use crate::config::Config;
use crate::error::CognitoLoginError;
use crate::session::{SessionStore, CSRF_STATE_KEY};
use crate::verifier::key_cache::KeySetCache;
use crate::verifier::TokenVerifier;
use chrono::Utc;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Why a sign-in or identity check did not yield an identity.
///
/// None of these are faults; the usual response is to send the visitor to
/// [`IdentityBroker::sign_in_url`] again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The callback's `state` is absent or differs from the one stored in the session.
    StateMismatch,
    /// The callback carried no authorization `code`.
    MissingCode,
    /// The token endpoint refused the grant.
    ProviderRejected { status: u16, error: Option<String> },
    /// The stored identity has no `exp` claim and can never be refreshed.
    MissingExpiry,
    /// The stored identity has no refresh token and can never be refreshed.
    MissingRefreshToken,
}

/// The result of [`IdentityBroker::get_identity`] and [`IdentityBroker::check_identity`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Claims freshly obtained from the provider and verified. Callers should persist them.
    Verified(IdentityClaims),
    /// The identity passed in is still within its expiry and is returned as is.
    Current(IdentityClaims),
    /// No identity.
    Rejected(Rejection),
}

impl Outcome {
    /// Collapses the outcome to the identity, if there is one.
    pub fn into_identity(self) -> Option<IdentityClaims> {
        match self {
            Outcome::Verified(claims) | Outcome::Current(claims) => Some(claims),
            Outcome::Rejected(_) => None,
        }
    }

    /// Borrows the identity, if there is one.
    pub fn identity(&self) -> Option<&IdentityClaims> {
        match self {
            Outcome::Verified(claims) | Outcome::Current(claims) => Some(claims),
            Outcome::Rejected(_) => None,
        }
    }

    /// The reason no identity was produced, if it was rejected.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Drives the authorization code flow against a Cognito hosted UI.
///
/// Create it once and reuse it across requests; it is cheap to clone. The
/// visitor's session is passed into the operations that need it, and the key set
/// cache is injected at construction.
#[derive(Clone)]
pub struct IdentityBroker {
    config: Arc<Config>,
    http_client: reqwest::Client,
    verifier: TokenVerifier,
}

impl IdentityBroker {
    /// Creates a broker from a validated configuration and a key set cache.
    ///
    /// No network activity happens here; the key set is fetched on the first
    /// verification that needs it.
    pub fn new(config: Config, key_cache: KeySetCache) -> Result<Self, CognitoLoginError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let config = Arc::new(config);
        let verifier = TokenVerifier::new(Arc::clone(&config), http_client.clone(), key_cache);
        Ok(Self {
            config,
            http_client,
            verifier,
        })
    }

    /// The configuration this broker was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the hosted UI sign-in URL.
    ///
    /// A fresh 128-bit anti-forgery state is generated and stored in `session`
    /// under [`CSRF_STATE_KEY`], replacing any earlier one.
    pub fn sign_in_url<S>(&self, session: &mut S) -> Result<Url, CognitoLoginError>
    where
        S: SessionStore + ?Sized,
    {
        let state = format!("{:032x}", rand::random::<u128>());
        session.insert(CSRF_STATE_KEY, state.clone());

        self.hosted_ui_url(&format!(
            "login?response_type=code&client_id={}&state={}&redirect_uri={}",
            self.config.client_id, state, self.config.callback_url
        ))
    }

    /// Returns the hosted UI logout URL. Touches no state.
    pub fn log_out_url(&self) -> Result<Url, CognitoLoginError> {
        self.hosted_ui_url(&format!(
            "logout?response_type=code&client_id={}&redirect_uri={}",
            self.config.client_id, self.config.callback_url
        ))
    }

    fn hosted_ui_url(&self, path_and_query: &str) -> Result<Url, CognitoLoginError> {
        self.config
            .domain
            .join(path_and_query)
            .map_err(|e| CognitoLoginError::InvalidUrl(e.to_string()))
    }

    /// Handles the provider's redirect back to the callback URL.
    ///
    /// The callback `state` must match the one stored by [`sign_in_url`](Self::sign_in_url);
    /// this is checked before the code is exchanged. On a match the stored state is
    /// removed, the code is exchanged at the token endpoint, both returned tokens are
    /// verified and the identity token's claims are returned with the refresh token
    /// appended.
    #[instrument(skip_all, err)]
    pub async fn get_identity<S>(
        &self,
        session: &mut S,
        params: &CallbackParams,
    ) -> Result<Outcome, CognitoLoginError>
    where
        S: SessionStore + ?Sized,
    {
        let stored = session.get(CSRF_STATE_KEY);
        let state_matches = match (params.state.as_deref(), stored.as_deref()) {
            (Some(received), Some(expected)) => {
                bool::from(received.as_bytes().ct_eq(expected.as_bytes()))
            }
            _ => false,
        };
        if !state_matches {
            warn!("Callback state does not match the session's anti-forgery state");
            return Ok(Outcome::Rejected(Rejection::StateMismatch));
        }
        session.remove(CSRF_STATE_KEY);

        let Some(code) = params.code.as_deref() else {
            warn!("Callback carried no authorization code");
            return Ok(Outcome::Rejected(Rejection::MissingCode));
        };

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.config.callback_url.as_str()),
        ];
        let tokens = match self.request_tokens(&form).await {
            Ok(tokens) => tokens,
            Err(CognitoLoginError::ProviderRejected { status, error }) => {
                return Ok(Outcome::Rejected(Rejection::ProviderRejected { status, error }));
            }
            Err(e) => return Err(e),
        };

        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or(CognitoLoginError::IncompleteTokenResponse("refresh_token"))?;
        let claims = self.verify_tokens(&tokens).await?;

        info!(sub = ?claims.sub(), "Sign-in completed");
        Ok(Outcome::Verified(claims.with_refresh_token(&refresh_token)))
    }

    /// Exchanges a refresh token for a new access and identity token.
    ///
    /// # Errors
    ///
    /// `ProviderRejected` if the token endpoint refuses the grant.
    #[instrument(skip_all, err)]
    pub async fn get_tokens(&self, refresh_token: &str) -> Result<TokenSet, CognitoLoginError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.request_tokens(&form).await
    }

    /// Checks a previously obtained identity, refreshing it when it has expired.
    ///
    /// An identity without `exp` or `refresh_token` is rejected outright. One that
    /// has not expired yet is returned unchanged without any network call. An
    /// expired one is refreshed; the new claims carry the original refresh token.
    #[instrument(skip_all, err)]
    pub async fn check_identity(
        &self,
        identity: IdentityClaims,
    ) -> Result<Outcome, CognitoLoginError> {
        let Some(exp) = identity.exp() else {
            return Ok(Outcome::Rejected(Rejection::MissingExpiry));
        };
        let Some(refresh_token) = identity.refresh_token().map(str::to_string) else {
            return Ok(Outcome::Rejected(Rejection::MissingRefreshToken));
        };

        // Compared directly: `exp` comes from the caller's record and may be any i64.
        let now = Utc::now().timestamp();
        if exp >= now {
            debug!(remaining = exp.saturating_sub(now), "Identity still valid");
            return Ok(Outcome::Current(identity));
        }

        debug!(expired_for = now.saturating_sub(exp), "Identity expired, refreshing");
        let tokens = match self.get_tokens(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(CognitoLoginError::ProviderRejected { status, error }) => {
                return Ok(Outcome::Rejected(Rejection::ProviderRejected { status, error }));
            }
            Err(e) => return Err(e),
        };

        let claims = self.verify_tokens(&tokens).await?;
        Ok(Outcome::Verified(claims.with_refresh_token(&refresh_token)))
    }

    async fn verify_tokens(&self, tokens: &TokenSet) -> Result<IdentityClaims, CognitoLoginError> {
        self.verifier.verify_access_token(&tokens.access_token).await?;
        let claims = self
            .verifier
            .verify_id_token(&tokens.id_token, &tokens.access_token)
            .await?;
        Ok(IdentityClaims::new(claims))
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenSet, CognitoLoginError> {
        let response = self
            .http_client
            .post(self.config.token_endpoint()?)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The body is informational only; a missing or odd body still means rejection.
            let error = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .map(|body| body.error);
            warn!(status = status.as_u16(), error = ?error, "Token endpoint rejected the grant");
            return Err(CognitoLoginError::ProviderRejected {
                status: status.as_u16(),
                error,
            });
        }

        Ok(response.json().await?)
    }
}
