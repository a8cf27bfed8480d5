//! LLM inference client.
//!
//! The matcher depends on the `Inference` trait, never on a concrete client,
//! so tests can stub completions and the endpoint stays swappable.

use crate::config::PipelineConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text-in, text-out inference seam.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Run one completion for the given prompt.
    async fn infer(&self, prompt: &str) -> Result<String>;
}

/// Client for an Ollama-compatible completion endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(config: &PipelineConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.ollama_base_url.clone(),
            model: config.model_name.clone(),
        }
    }
}

#[async_trait]
impl Inference for OllamaClient {
    async fn infer(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!("inference request to {} ({} prompt chars)", url, prompt.len());

        let resp = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .context("inference request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("inference endpoint returned HTTP {}: {}", status, text);
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .context("inference response was not valid JSON")?;
        Ok(body.response)
    }
}
