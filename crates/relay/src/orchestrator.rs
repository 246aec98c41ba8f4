//! Credential × model search.
//!
//! The search is two nested loops with a single exit signal. The inner loop
//! walks the models for one credential and either breaks out of the whole
//! search with an [`Outcome`] (an answer or an abort) or lets the outer loop
//! move on to the next credential. What happens after a failed attempt is
//! decided by [`decide`], a pure function of the error and the kind of
//! credential that produced it.

use crate::{
    AttemptError, Backend, Credential, CredentialKind, GenerateRequest, Messages, Policy, Prompt,
    select_credentials,
};
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

/// Terminal conditions that end the search immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// The provider rejected the user's own key.
    KeyRejected,
    /// The user's own key is rate limited.
    QuotaExceeded,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The model is unavailable; try the next one without recording anything.
    SkipModel,
    /// Record the message as the last error and try the next model.
    Record(String),
    /// Stop using this credential and move to the next one.
    AbandonCredential,
    /// End the whole search.
    Abort(Abort),
}

/// Result of a whole search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answer(String),
    Aborted(Abort),
    Exhausted { last_error: Option<String> },
}

impl Outcome {
    /// Turn the outcome into the text shown to the user.
    pub fn render(self, messages: &Messages) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Aborted(Abort::KeyRejected) => messages.key_rejected.clone(),
            Self::Aborted(Abort::QuotaExceeded) => messages.quota_exceeded.clone(),
            Self::Exhausted { last_error } => messages.connection_failed(last_error.as_deref()),
        }
    }
}

/// Map a failed attempt to the next step. Rules apply in order, first match wins.
pub fn decide(error: &AttemptError, kind: CredentialKind) -> Decision {
    let status = error.status();
    let message = error.message();

    if status == Some(404) || message.contains("not found") {
        return Decision::SkipModel;
    }

    if status == Some(400) && message.contains("API key") {
        return match kind {
            CredentialKind::User => Decision::Abort(Abort::KeyRejected),
            CredentialKind::Fallback => Decision::AbandonCredential,
        };
    }

    // Built-in keys hitting 429 fall through to the generic rule.
    if status == Some(429) && kind == CredentialKind::User {
        return Decision::Abort(Abort::QuotaExceeded);
    }

    Decision::Record(message.to_string())
}

/// Runs prompts against every credential and model the policy allows.
pub struct Orchestrator<B> {
    backend: B,
    policy: Policy,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B, policy: Policy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    #[cfg(test)]
    pub(crate) fn backend_for_tests(&self) -> &B {
        &self.backend
    }

    /// Send a prompt and return the answer or a failure message. Never fails.
    ///
    /// `stored_key` is the raw value from the credential store, if any.
    pub async fn send(&self, prompt: &Prompt, stored_key: Option<&str>) -> String {
        self.search(prompt, stored_key)
            .await
            .render(&self.policy.messages)
    }

    /// Run the search and report how it ended.
    pub async fn search(&self, prompt: &Prompt, stored_key: Option<&str>) -> Outcome {
        let request = GenerateRequest::new(prompt, &self.policy.generation);
        let credentials = select_credentials(stored_key, &self.policy);
        let mut last_error = None;

        for (index, (credential, kind)) in credentials.iter().enumerate() {
            debug!(index, %kind, "using credential");
            let flow = self
                .try_models(credential, *kind, &request, &mut last_error)
                .await;
            if let ControlFlow::Break(outcome) = flow {
                return outcome;
            }
        }

        warn!(last_error = ?last_error, "all credentials and models failed");
        Outcome::Exhausted { last_error }
    }

    async fn try_models(
        &self,
        credential: &Credential,
        kind: CredentialKind,
        request: &GenerateRequest,
        last_error: &mut Option<String>,
    ) -> ControlFlow<Outcome> {
        for model in &self.policy.models {
            debug!(%model, "trying model");
            let error = match self.backend.generate(credential, model, request).await {
                Ok(text) => {
                    info!(%model, %kind, "answer received");
                    return ControlFlow::Break(Outcome::Answer(text));
                }
                Err(error) => error,
            };
            warn!(%model, %kind, %error, "attempt failed");

            match decide(&error, kind) {
                Decision::SkipModel => {}
                Decision::Record(message) => *last_error = Some(message),
                Decision::AbandonCredential => {
                    *last_error = Some(self.policy.messages.fallback_exhausted.clone());
                    return ControlFlow::Continue(());
                }
                Decision::Abort(abort) => {
                    info!(?abort, "search aborted");
                    return ControlFlow::Break(Outcome::Aborted(abort));
                }
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, api_error};

    const USER_KEY: &str = "AIzaSyUserKey0001";

    fn policy() -> Policy {
        Policy {
            fallback_credentials: vec!["fallback-a".into(), "fallback-b".into()],
            ..Policy::default()
        }
    }

    fn prompt() -> Prompt {
        Prompt::compose("SYS", "hello")
    }

    // ── decide ──────────────────────────────────────────────────────────────

    #[test]
    fn not_found_skips_model() {
        let err = api_error(404, "models/gemini-x is not found");
        assert_eq!(decide(&err, CredentialKind::User), Decision::SkipModel);
        let err = AttemptError::Transport("model not found".into());
        assert_eq!(decide(&err, CredentialKind::Fallback), Decision::SkipModel);
    }

    #[test]
    fn not_found_wins_over_key_rule() {
        let err = api_error(400, "API key not found");
        assert_eq!(decide(&err, CredentialKind::User), Decision::SkipModel);
    }

    #[test]
    fn bad_key_depends_on_kind() {
        let err = api_error(400, "API key not valid. Please pass a valid API key.");
        assert_eq!(
            decide(&err, CredentialKind::User),
            Decision::Abort(Abort::KeyRejected)
        );
        assert_eq!(
            decide(&err, CredentialKind::Fallback),
            Decision::AbandonCredential
        );
    }

    #[test]
    fn plain_bad_request_is_recorded() {
        let err = api_error(400, "Invalid JSON payload");
        assert_eq!(
            decide(&err, CredentialKind::User),
            Decision::Record("Invalid JSON payload".into())
        );
    }

    #[test]
    fn quota_aborts_only_for_user_key() {
        let err = api_error(429, "Resource has been exhausted");
        assert_eq!(
            decide(&err, CredentialKind::User),
            Decision::Abort(Abort::QuotaExceeded)
        );
        assert_eq!(
            decide(&err, CredentialKind::Fallback),
            Decision::Record("Resource has been exhausted".into())
        );
    }

    #[test]
    fn blocked_and_empty_are_recorded() {
        assert_eq!(
            decide(&AttemptError::Blocked("SAFETY".into()), CredentialKind::User),
            Decision::Record("BLOCK_SAFETY".into())
        );
        assert_eq!(
            decide(&AttemptError::EmptyResponse, CredentialKind::Fallback),
            Decision::Record("EMPTY_RESPONSE".into())
        );
    }

    // ── search ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn user_key_first_attempt_succeeds() {
        let backend = ScriptedBackend::new(vec![Ok("Resposta".into())]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), Some(USER_KEY)).await;

        assert_eq!(result, "Resposta");
        let calls = orchestrator.backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].credential, USER_KEY);
        assert_eq!(calls[0].model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn user_key_rejected_aborts() {
        let backend = ScriptedBackend::new(vec![
            Err(api_error(400, "API key not valid. Please pass a valid API key.")),
            Ok("never reached".into()),
        ]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), Some(USER_KEY)).await;

        assert_eq!(result, Messages::default().key_rejected);
        assert_eq!(orchestrator.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn user_key_quota_aborts() {
        let backend = ScriptedBackend::new(vec![
            Err(api_error(429, "Resource has been exhausted")),
            Ok("never reached".into()),
        ]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), Some(USER_KEY)).await;

        assert_eq!(result, Messages::default().quota_exceeded);
        assert_eq!(orchestrator.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn user_key_never_falls_back() {
        let backend = ScriptedBackend::failing(|| api_error(500, "Internal error"));
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), Some(USER_KEY)).await;

        assert_eq!(result, "FALHA NA CONEXÃO: Internal error");
        let calls = orchestrator.backend.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.credential == USER_KEY));
    }

    #[tokio::test]
    async fn not_found_tries_next_model_same_credential() {
        let backend = ScriptedBackend::new(vec![
            Err(api_error(404, "models/gemini-1.5-flash is not found")),
            Ok("from pro".into()),
        ]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), None).await;

        assert_eq!(result, "from pro");
        let calls = orchestrator.backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].credential, "fallback-a");
        assert_eq!(calls[1].credential, "fallback-a");
        assert_eq!(calls[0].model, "gemini-1.5-flash");
        assert_eq!(calls[1].model, "gemini-1.5-pro");
    }

    #[tokio::test]
    async fn rejected_fallback_moves_to_next_credential() {
        let backend = ScriptedBackend::new(vec![
            Err(api_error(400, "API key expired. Please renew the API key.")),
            Ok("from second key".into()),
        ]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), None).await;

        assert_eq!(result, "from second key");
        let calls = orchestrator.backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].credential, "fallback-b");
        assert_eq!(calls[1].model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn all_fallbacks_rejected_reports_exhaustion() {
        let backend =
            ScriptedBackend::failing(|| api_error(400, "API key not valid. Please pass a valid API key."));
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), None).await;

        assert_eq!(result, "FALHA NA CONEXÃO: Chaves públicas esgotadas.");
        assert_eq!(orchestrator.backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn fallback_quota_is_generic() {
        let backend = ScriptedBackend::new(vec![
            Err(api_error(429, "Resource has been exhausted")),
            Ok("second model".into()),
        ]);
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), None).await;

        assert_eq!(result, "second model");
        assert_eq!(orchestrator.backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn everything_fails_reports_last_error() {
        let mut replies: Vec<_> = (0..7)
            .map(|_| Err(AttemptError::Transport("connection refused".into())))
            .collect();
        replies.push(Err(AttemptError::Blocked("SAFETY".into())));
        let backend = ScriptedBackend::new(replies);
        let orchestrator = Orchestrator::new(backend, policy());

        let outcome = orchestrator.search(&prompt(), None).await;

        assert_eq!(
            outcome,
            Outcome::Exhausted {
                last_error: Some("BLOCK_SAFETY".into())
            }
        );
        assert_eq!(orchestrator.backend.calls().len(), 8);
    }

    #[tokio::test]
    async fn only_not_found_leaves_default_hint() {
        let backend = ScriptedBackend::failing(|| api_error(404, "not found"));
        let orchestrator = Orchestrator::new(backend, policy());

        let result = orchestrator.send(&prompt(), None).await;

        assert_eq!(result, "FALHA NA CONEXÃO: Verifique sua internet ou Chave API.");
        assert_eq!(orchestrator.backend.calls().len(), 8);
    }

    #[tokio::test]
    async fn no_credentials_makes_no_calls() {
        let backend = ScriptedBackend::new(vec![]);
        let orchestrator = Orchestrator::new(backend, Policy::default());

        let outcome = orchestrator.search(&prompt(), Some("short")).await;

        assert_eq!(outcome, Outcome::Exhausted { last_error: None });
        assert!(orchestrator.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn same_script_same_result() {
        let script = || {
            vec![
                Err(api_error(404, "not found")),
                Err(api_error(500, "Internal error")),
                Ok("third time".into()),
            ]
        };

        let first = Orchestrator::new(ScriptedBackend::new(script()), policy());
        let second = Orchestrator::new(ScriptedBackend::new(script()), policy());

        let a = first.send(&prompt(), None).await;
        let b = second.send(&prompt(), None).await;

        assert_eq!(a, b);
        assert_eq!(first.backend.calls(), second.backend.calls());
    }

    #[tokio::test]
    async fn request_carries_prompt_text() {
        let backend = ScriptedBackend::new(vec![Ok("ok".into())]);
        let orchestrator = Orchestrator::new(backend, policy());

        orchestrator.send(&prompt(), Some(USER_KEY)).await;

        assert_eq!(orchestrator.backend.calls()[0].prompt, prompt().text);
    }
}
