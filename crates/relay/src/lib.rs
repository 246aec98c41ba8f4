//! Mentor relay — prompt orchestration against the Gemini API.
//!
//! This crate turns a chat message into a `generateContent` call, walking a
//! matrix of credentials and models until one of them produces an answer.
//! Every call resolves to a string: either the model's answer or a
//! human-readable failure message.
//!
//! # Overview
//!
//! - **Policy**: which models to try, which built-in fallback credentials
//!   exist, generation parameters and the user-facing failure messages.
//! - **Backend**: a trait issuing one request for one (credential, model)
//!   pair. [`GeminiBackend`] is the HTTP implementation.
//! - **Orchestrator**: the credential × model search and its rule table.
//! - **Mentor**: reads the stored user key fresh on every call and exposes
//!   chat and mind-map generation.
//!
//! # Example
//!
//! ```ignore
//! use keystore::KeyStore;
//! use relay::{GeminiBackend, Mentor, Orchestrator, Policy};
//!
//! # async fn example() -> relay::Result<()> {
//! let store = KeyStore::open("mentor.db")?;
//! let orchestrator = Orchestrator::new(GeminiBackend::builder().build(), Policy::default());
//! let mentor = Mentor::new(store, orchestrator);
//!
//! let answer = mentor.chat("Como começo a programar?", None).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod backend;
mod credential;
mod error;
mod mentor;
mod orchestrator;
mod policy;
mod prompt;

#[cfg(test)]
mod testing;

pub use backend::{AttemptError, Backend, GeminiBackend, GeminiBackendBuilder, GenerateRequest};
pub use credential::{Credential, CredentialKind, select_credentials};
pub use error::{Error, Result};
pub use mentor::{KeySource, Mentor};
pub use orchestrator::{Abort, Decision, Orchestrator, Outcome, decide};
pub use policy::{DEFAULT_MODELS, DEFAULT_USER_KEY_MIN_LEN, GenerationConfig, Messages, Policy};
pub use prompt::{ImagePart, Prompt, mind_map_request};
