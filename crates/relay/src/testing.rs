//! Scripted backend shared by the unit tests.

use crate::{AttemptError, Backend, Credential, GenerateRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub credential: String,
    pub model: String,
    pub prompt: String,
}

enum Script {
    Replies(Mutex<VecDeque<Result<String, AttemptError>>>),
    Always(fn() -> AttemptError),
}

/// Backend that replays canned results in order and records every call.
pub(crate) struct ScriptedBackend {
    script: Script,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, AttemptError>>) -> Self {
        Self {
            script: Script::Replies(Mutex::new(replies.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with the same error.
    pub fn failing(error: fn() -> AttemptError) -> Self {
        Self {
            script: Script::Always(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, AttemptError> {
        self.calls.lock().unwrap().push(Call {
            credential: credential.expose().to_string(),
            model: model.to_string(),
            prompt: request.prompt_text().to_string(),
        });
        match &self.script {
            Script::Replies(replies) => replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AttemptError::Transport("script exhausted".into()))),
            Script::Always(error) => Err(error()),
        }
    }
}

pub(crate) fn api_error(status: u16, message: &str) -> AttemptError {
    AttemptError::Api {
        status,
        message: message.to_string(),
        code: Some(status.into()),
    }
}
