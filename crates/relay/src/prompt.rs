//! Prompt composition.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// An image attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImagePart {
    /// Create an image part from already-encoded data.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Create an image part from raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }
}

/// Text sent to the model, plus an optional image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub image: Option<ImagePart>,
}

impl Prompt {
    /// Wrap a user message in the system instruction and conversation markers.
    pub fn compose(system_instruction: &str, message: &str) -> Self {
        Self {
            text: format!(
                "{system_instruction}\n\n---\n\nDIÁLOGO ATUAL:\nUSUÁRIO: {message}\nMENTOR:"
            ),
            image: None,
        }
    }

    /// Attach an image.
    pub fn with_image(mut self, image: Option<ImagePart>) -> Self {
        self.image = image;
        self
    }
}

/// The message asking the model for a mind map of `topic`.
pub fn mind_map_request(topic: &str) -> String {
    format!("Crie um Mapa Mental hierárquico (texto identado) prático sobre: \"{topic}\". Seja direto.")
}
