//! Chat front door: stored key lookup, prompt composition, mind maps.

use crate::{Backend, ImagePart, Orchestrator, Prompt, Result, mind_map_request};
use keystore::KeyStore;
use tracing::error;

/// Somewhere the user's API key may be stored.
pub trait KeySource {
    /// The raw stored value, if any.
    fn stored_key(&self) -> Result<Option<String>>;
}

impl KeySource for KeyStore {
    fn stored_key(&self) -> Result<Option<String>> {
        Ok(self.user_key()?)
    }
}

/// A chat client bound to a key source and an orchestrator.
pub struct Mentor<K, B> {
    keys: K,
    orchestrator: Orchestrator<B>,
}

impl<K: KeySource, B: Backend> Mentor<K, B> {
    pub fn new(keys: K, orchestrator: Orchestrator<B>) -> Self {
        Self { keys, orchestrator }
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Send a message and get the answer or a failure message.
    ///
    /// The stored key is read again on every call, so a key saved mid-session
    /// is picked up by the next message. Only that read can fail.
    pub async fn chat(&self, message: &str, image: Option<ImagePart>) -> Result<String> {
        let stored = self.keys.stored_key()?;
        let prompt = Prompt::compose(&self.orchestrator.policy().system_instruction, message)
            .with_image(image);
        Ok(self.orchestrator.send(&prompt, stored.as_deref()).await)
    }

    /// Ask for an indented mind map of `topic`. `None` if the request could not be made.
    pub async fn mind_map(&self, topic: &str) -> Option<String> {
        match self.chat(&mind_map_request(topic), None).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!(topic, error = %e, "mind map generation failed");
                None
            }
        }
    }
}
