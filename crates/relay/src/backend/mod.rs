//! Provider backend abstraction.
//!
//! A backend issues exactly one request for one (credential, model) pair and
//! classifies the result. Retrying across pairs is the orchestrator's job.

mod errors;
mod gemini;

pub use errors::AttemptError;
pub use gemini::{GeminiBackend, GeminiBackendBuilder, GenerateRequest};

use crate::Credential;
use std::future::Future;

/// Trait for generative-language backends.
pub trait Backend: Send + Sync {
    /// Send one request and return the answer text.
    fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerateRequest,
    ) -> impl Future<Output = Result<String, AttemptError>> + Send;
}
