use crate::config::Config;
use crate::models::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Capability to turn a prompt into an answer.
///
/// `Ok(None)` means the upstream call succeeded but returned no content.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<Option<String>>;
}

pub struct OpenAIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    verbose: bool,
}

impl OpenAIService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            verbose: config.verbose,
        }
    }

    fn build_request(&self, prompt: &Prompt) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIService {
    async fn complete(&self, prompt: &Prompt) -> Result<Option<String>> {
        let request = self.build_request(prompt);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read OpenAI response")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!("OpenAI API error ({}): {}", status, body));
        }

        if self.verbose {
            log::debug!("OpenAI API response: {}", body);
        }

        let chat_response: ChatResponse =
            serde_json::from_str(&body).context("Malformed OpenAI response")?;

        Ok(chat_response.first_content())
    }
}
