//! API credentials and the selection of which ones to try.

use crate::Policy;
use secrecy::{ExposeSecret, SecretString};

/// An API key for the generative-language service.
///
/// `Debug` never prints the key itself.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the raw key. Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Supplied by the user and stored locally.
    User,
    /// Built-in shared key, used only when the user has none.
    Fallback,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Decide which credentials to try, in order.
///
/// A stored value counts as the user's key when, once trimmed, it is longer
/// than `policy.user_key_min_len`. In that case it is the only credential
/// tried; the fallback keys are never mixed in.
pub fn select_credentials(
    stored: Option<&str>,
    policy: &Policy,
) -> Vec<(Credential, CredentialKind)> {
    let user_key = stored
        .map(str::trim)
        .filter(|key| key.len() > policy.user_key_min_len);

    match user_key {
        Some(key) => vec![(Credential::new(key), CredentialKind::User)],
        None => policy
            .fallback_credentials
            .iter()
            .cloned()
            .map(|credential| (credential, CredentialKind::Fallback))
            .collect(),
    }
}
