// src/lib.rs

pub mod broker;
pub mod claims;
pub mod config;
pub mod error;
pub mod session;
pub mod verifier;

/// The public prelude for the `cognito-login` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::broker::{IdentityBroker, Outcome, Rejection};
    pub use crate::claims::{CallbackParams, IdentityClaims, TokenSet};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::CognitoLoginError;
    pub use crate::session::{SessionStore, CSRF_STATE_KEY};
    pub use crate::verifier::key_cache::KeySetCache;
    pub use jsonwebtoken::Algorithm;
}
