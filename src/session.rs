// src/session.rs

use std::collections::HashMap;

/// Session key under which the anti-forgery state is kept between the
/// sign-in redirect and the callback.
pub const CSRF_STATE_KEY: &str = "cognito_login_csrf_state";

/// Per-visitor server-side storage supplied by the host web framework.
///
/// The broker only ever touches [`CSRF_STATE_KEY`]. Implement this for whatever
/// session type your framework hands out; `HashMap<String, String>` works out of
/// the box.
pub trait SessionStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn insert(&mut self, key: &str, value: String);

    /// Removes and returns the value stored under `key`.
    fn remove(&mut self, key: &str) -> Option<String>;
}

impl SessionStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn insert(&mut self, key: &str, value: String) {
        HashMap::insert(self, key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        HashMap::remove(self, key)
    }
}
