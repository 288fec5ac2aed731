use serde_json::{json, Value};

use localchat_core::config::LlmConfig;
use localchat_core::error::{Error, Result};
use localchat_core::traits::Completion;
use localchat_core::types::ChatMessage;

use crate::{chat_messages, http_client, post_json};

/// Chat completions against any OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        Ok(Self {
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.openai_model.clone(),
            temperature: config.temperature,
            client: http_client(config.timeout_secs)?,
        })
    }

    pub fn endpoint(&self) -> String { format!("{}/chat/completions", self.base_url) }

    pub fn request_body(&self, system_prompt: &str, messages: &[ChatMessage]) -> Value {
        json!({
            "model": self.model,
            "messages": chat_messages(system_prompt, messages),
            "temperature": self.temperature,
        })
    }
}

/// `choices[0].message.content`
pub fn parse_reply(resp: &Value) -> Result<String> {
    resp.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Provider(format!("openai response has no message content: {}", resp)))
}

impl Completion for OpenAiProvider {
    fn name(&self) -> &str { "openai" }

    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        let body = self.request_body(system_prompt, messages);
        let req = self.client.post(self.endpoint()).bearer_auth(&self.api_key);
        parse_reply(&post_json(req, &body, "openai")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiProvider {
        let config = LlmConfig { openai_base_url: "http://localhost:8080/v1/".to_string(), ..LlmConfig::default() };
        OpenAiProvider::new(&config, "sk-test".to_string()).unwrap()
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(provider().endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn body_carries_model_temperature_and_history() {
        let body = provider().request_body("sys", &[ChatMessage::user("hola")]);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!((body["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hola");
    }

    #[test]
    fn reply_is_first_choice_content() {
        let resp = json!({ "choices": [{ "message": { "role": "assistant", "content": "4" } }] });
        assert_eq!(parse_reply(&resp).unwrap(), "4");
        assert!(parse_reply(&json!({ "choices": [] })).is_err());
    }
}
