//! Text completion backends.
//!
//! Every backend implements [`Completion`]: given a system instruction and the
//! ordered conversation, return the reply text. Backends that cannot be set up
//! (unknown provider name, missing API key) are replaced by [`Unavailable`], so
//! the chat loop still starts and reports the problem per turn.

pub mod ollama;
pub mod openai;

use serde_json::{json, Value};
use tracing::warn;

use localchat_core::config::LlmConfig;
use localchat_core::error::{Error, Result};
use localchat_core::traits::Completion;
use localchat_core::types::ChatMessage;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Pick the backend named by `config.provider`.
pub fn build_provider(config: &LlmConfig) -> Box<dyn Completion> {
    match config.provider.trim().to_ascii_lowercase().as_str() {
        "openai" => {
            let key = config
                .openai_api_key
                .clone()
                .filter(|k| !k.is_empty())
                .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(|k| !k.is_empty()));
            match key {
                Some(key) => match OpenAiProvider::new(config, key) {
                    Ok(p) => Box::new(p),
                    Err(e) => unavailable(format!("could not initialise OpenAI client: {}", e)),
                },
                None => unavailable(format!("OpenAI selected but no API key (set llm.openai_api_key or {})", OPENAI_API_KEY_ENV)),
            }
        }
        "ollama" => match OllamaProvider::new(config) {
            Ok(p) => Box::new(p),
            Err(e) => unavailable(format!("could not initialise Ollama client: {}", e)),
        },
        other => unavailable(format!("unknown provider '{}'", other)),
    }
}

fn unavailable(reason: String) -> Box<dyn Completion> {
    warn!(%reason, "completion provider unavailable");
    Box::new(Unavailable { reason })
}

/// Stand-in backend that refuses every request.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self { Self { reason: reason.into() } }
}

impl Completion for Unavailable {
    fn name(&self) -> &str { "unavailable" }

    fn complete(&self, _system_prompt: &str, _messages: &[ChatMessage]) -> Result<String> {
        Err(Error::ProviderUnavailable(self.reason.clone()))
    }
}

/// System instruction first, then the conversation, in the shape both
/// chat APIs accept.
pub(crate) fn chat_messages(system_prompt: &str, messages: &[ChatMessage]) -> Vec<Value> {
    std::iter::once(ChatMessage::system(system_prompt))
        .chain(messages.iter().cloned())
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect()
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Provider(format!("HTTP client: {}", e)))
}

/// Send `body` and decode the JSON reply, folding transport and status
/// failures into provider errors.
pub(crate) fn post_json(request: reqwest::blocking::RequestBuilder, body: &Value, provider: &str) -> Result<Value> {
    let resp = request
        .json(body)
        .send()
        .map_err(|e| Error::ProviderUnavailable(format!("{} connection failed: {}", provider, e)))?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().unwrap_or_default();
        return Err(Error::Provider(format!("{} returned {}: {}", provider, status, text)));
    }
    resp.json::<Value>().map_err(|e| Error::Provider(format!("{} sent invalid JSON: {}", provider, e)))
}
