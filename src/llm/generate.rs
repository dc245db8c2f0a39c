use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{post_json, Provider};
use crate::config::LlmConfig;

/// Text completion provider.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String>;
}

/// Single-turn, non-streaming completion through the provider's chat endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpGenerator {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaChat<'a> {
    model: &'a str,
    messages: [UserMessage<'a>; 1],
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct OpenAiChat<'a> {
    model: &'a str,
    messages: [UserMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OllamaReply {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct OpenAiReply {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: ReplyMessage,
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str, temperature: f32, max_tokens: u32) -> Result<String> {
        let provider = Provider::of(&self.config)?;
        let messages = [UserMessage {
            role: "user",
            content: prompt,
        }];
        let model = self.config.chat_model.as_str();

        let content = match provider {
            Provider::Ollama => {
                let req = OllamaChat {
                    model,
                    messages,
                    stream: false,
                    options: SamplingOptions {
                        temperature,
                        num_predict: max_tokens,
                    },
                };
                let reply: OllamaReply =
                    post_json(&self.client, &self.config, provider, "/api/chat", &req).await?;
                reply.message.content
            }
            Provider::OpenAi => {
                let req = OpenAiChat {
                    model,
                    messages,
                    temperature,
                    max_tokens,
                };
                let reply: OpenAiReply = post_json(
                    &self.client,
                    &self.config,
                    provider,
                    "/v1/chat/completions",
                    &req,
                )
                .await?;
                reply.choices.into_iter().next().and_then(|c| c.message.content)
            }
        };

        content.context("Chat API returned no content")
    }
}
