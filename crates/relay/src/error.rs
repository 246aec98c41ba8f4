use thiserror::Error;

/// Relay errors.
///
/// Provider failures never surface here; they are classified inside the
/// orchestrator and rendered as messages. Only collaborators around the
/// search (the credential store) can fail a call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Keystore(#[from] keystore::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
