//! Search policy: models, fallback credentials, generation parameters and
//! user-facing messages.

use crate::Credential;
use serde::Deserialize;

/// Models tried for every credential, cheapest first.
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
    "gemini-1.0-pro",
];

/// Stored keys must be longer than this to count as the user's own.
pub const DEFAULT_USER_KEY_MIN_LEN: usize = 10;

const DEFAULT_SYSTEM_INSTRUCTION: &str = "Você é O MENTOR, um mentor de programação direto e prático. \
Responda em português, com exemplos curtos e passos acionáveis. \
Quando o aluno enviar uma imagem de código ou erro, analise-a antes de responder.";

/// Everything the orchestrator needs to know besides the stored user key.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Models in priority order.
    pub models: Vec<String>,
    /// Built-in credentials, tried in order when the user has no key.
    pub fallback_credentials: Vec<Credential>,
    /// A stored key qualifies as the user's when its trimmed length exceeds this.
    pub user_key_min_len: usize,
    pub generation: GenerationConfig,
    /// Prepended to every prompt.
    pub system_instruction: String,
    pub messages: Messages,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            fallback_credentials: Vec::new(),
            user_key_min_len: DEFAULT_USER_KEY_MIN_LEN,
            generation: GenerationConfig::default(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            messages: Messages::default(),
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1000,
        }
    }
}

/// Failure messages shown to the end user, in their language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// The provider refused the user's own key.
    pub key_rejected: String,
    /// The user's own key hit its quota.
    pub quota_exceeded: String,
    /// Prefix of the message returned when every attempt failed.
    pub connection_failure: String,
    /// Detail used when no attempt recorded an error.
    pub connection_hint: String,
    /// Recorded when a built-in credential is rejected.
    pub fallback_exhausted: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            key_rejected: "ERRO DE CHAVE: O Google recusou sua chave. Verifique se copiou \
                corretamente (sem espaços) e se a API 'Generative Language' está ativada \
                no Google Cloud Console."
                .to_string(),
            quota_exceeded: "ERRO DE LIMITES: Sua chave atingiu o limite gratuito de hoje. \
                Tente amanhã ou use outra chave."
                .to_string(),
            connection_failure: "FALHA NA CONEXÃO".to_string(),
            connection_hint: "Verifique sua internet ou Chave API.".to_string(),
            fallback_exhausted: "Chaves públicas esgotadas.".to_string(),
        }
    }
}

impl Messages {
    /// The message returned when the whole search came up empty.
    pub fn connection_failed(&self, last_error: Option<&str>) -> String {
        let detail = last_error
            .filter(|e| !e.is_empty())
            .unwrap_or(&self.connection_hint);
        format!("{}: {detail}", self.connection_failure)
    }
}
