use thiserror::Error;

/// Why a single (credential, model) attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// No classifiable response: network failure or an unparseable body.
    #[error("transport: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider api {status}: {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<i64>,
    },

    /// The prompt tripped the provider's safety filter.
    #[error("blocked by safety filter: {0}")]
    Blocked(String),

    /// Success status, but no text where the answer should be.
    #[error("empty response")]
    EmptyResponse,
}

impl AttemptError {
    /// HTTP status, when the provider returned one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The text matched by the retry rules and recorded as the last error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(message) | Self::Api { message, .. } => message,
            Self::Blocked(_) => "BLOCK_SAFETY",
            Self::EmptyResponse => "EMPTY_RESPONSE",
        }
    }
}
