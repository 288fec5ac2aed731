use serde_json::{json, Value};

use localchat_core::config::LlmConfig;
use localchat_core::error::{Error, Result};
use localchat_core::traits::Completion;
use localchat_core::types::ChatMessage;

use crate::{chat_messages, http_client, post_json};

/// Non-streaming calls to a local Ollama server's `/api/chat`.
pub struct OllamaProvider {
    host: String,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            host: config.ollama_host.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            temperature: config.temperature,
            client: http_client(config.timeout_secs)?,
        })
    }

    pub fn endpoint(&self) -> String { format!("{}/api/chat", self.host) }

    pub fn request_body(&self, system_prompt: &str, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.model,
            "messages": chat_messages(system_prompt, messages),
            "stream": false,
            "options": { "temperature": self.temperature },
        })
    }
}

/// `message.content`
pub fn parse_reply(resp: &Value) -> Result<String> {
    resp.pointer("/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Provider(format!("ollama response has no message content: {}", resp)))
}

impl Completion for OllamaProvider {
    fn name(&self) -> &str { "ollama" }

    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let body = self.request_body(system_prompt, messages);
        parse_reply(&post_json(self.client.post(self.endpoint()), &body, "ollama")?)
    }
}
