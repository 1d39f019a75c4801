//! Admin token check guarding the review workflow.
//!
//! Every mutating review call must pass this check upstream. The secret is
//! held in a `SecretString` so it never shows up in Debug output or logs.

use secrecy::{ExposeSecret, SecretString};

pub const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";

pub struct AdminToken {
    secret: SecretString,
}

impl AdminToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
        }
    }

    /// Reads the token from the `ADMIN_TOKEN` environment variable.
    /// Returns `None` when the variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        match std::env::var(ADMIN_TOKEN_ENV) {
            Ok(value) if !value.trim().is_empty() => Some(Self::new(value)),
            _ => None,
        }
    }

    /// Returns true only when the presented token matches the secret.
    pub fn verify(&self, presented: &str) -> bool {
        !presented.is_empty() && presented == self.secret.expose_secret()
    }
}
