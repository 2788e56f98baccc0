use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{ChatMessage, LlmProvider};

/// FPT Cloud marketplace models behind an OpenAI-compatible endpoint.
pub struct FptProvider {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl FptProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            api_key,
            api_url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for FptProvider {
    async fn chat(&self, system_prompt: &str, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let mut chat_messages = vec![json!({
            "role": "system",
            "content": system_prompt,
        })];

        for msg in messages {
            chat_messages.push(json!({
                "role": msg.role,
                "content": msg.content,
            }));
        }

        let body = json!({
            "model": self.model,
            "messages": chat_messages,
            "temperature": 0.7,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call FPT API")?;

        let status = resp.status();
        let data: serde_json::Value = resp.json().await.context("failed to parse FPT response")?;

        if !status.is_success() {
            anyhow::bail!("FPT API error ({}): {}", status, data);
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in FPT response"))
    }
}
