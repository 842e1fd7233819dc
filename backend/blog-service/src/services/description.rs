//! Post descriptions generated by Gemini

use crate::config::AiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Language model returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Language model returned no text")]
    EmptyResponse,
}

#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn describe(&self, title: &str) -> Result<String, AiError>;
}

pub fn description_prompt(title: &str) -> String {
    format!(
        "Write a description for the given title: {}. The message should not be less than 30 words and use simple English vocabulary.",
        title
    )
}

// ============================================
// Request / response types
// ============================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: Content,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl DescriptionGenerator for GeminiClient {
    async fn describe(&self, title: &str) -> Result<String, AiError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: description_prompt(title),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.text().ok_or(AiError::EmptyResponse)
    }
}
