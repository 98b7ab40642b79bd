//! LLM-backed narrative analysis
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Ollama serves
//! one under `/v1`). The PR-level reply is parsed with
//! [`parse_analysis_response`](crate::prompt::parse_analysis_response); per-file
//! replies are kept verbatim.

use common::models::{ChangedFile, PrSnapshot};
use common::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::prompt::{
    assess_risk_level, build_analysis_prompt, build_file_prompt, complexity_score,
    parse_analysis_response, significant_files, AnalysisResult, RiskLevel,
};
use crate::timeline::TimelineMetrics;

const TEMPERATURE: f32 = 0.1;
const PR_MAX_TOKENS: u32 = 2048;
const FILE_MAX_TOKENS: u32 = 512;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("LLM API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("LLM returned no choices")]
    EmptyResponse,
}

/// Per-file LLM review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub filename: String,
    pub analysis: String,
    pub complexity_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Chat-completions client for the narrative stage
pub struct NarrativeClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl NarrativeClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.llm_base_url.clone(),
            config.llm_model.clone(),
            config.llm_api_key.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: String, max_tokens: u32) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens,
        }
    }

    async fn chat(&self, prompt: String, max_tokens: u32) -> Result<String, NarrativeError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} ({} prompt chars)", url, prompt.len());

        let mut builder = self.client.post(&url).json(&self.request(prompt, max_tokens));
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        extract_content(chat_response)
    }

    /// PR-level narrative
    pub async fn analyze_pr(
        &self,
        snapshot: &PrSnapshot,
        metrics: &TimelineMetrics,
        repo_context: &str,
    ) -> Result<AnalysisResult, NarrativeError> {
        info!("Requesting PR analysis from {}", self.model);
        let prompt = build_analysis_prompt(snapshot, metrics, repo_context);
        let reply = self.chat(prompt, PR_MAX_TOKENS).await?;
        Ok(parse_analysis_response(&reply))
    }

    /// Review the `limit` most-changed files that carry a patch.
    ///
    /// A failed call becomes an entry with the error text and unknown risk.
    pub async fn analyze_code_changes(
        &self,
        files: &[ChangedFile],
        pr_context: &str,
        limit: usize,
    ) -> Vec<FileAnalysis> {
        let mut results = Vec::new();

        for file in significant_files(files, limit) {
            let prompt = build_file_prompt(file, pr_context);
            let entry = match self.chat(prompt, FILE_MAX_TOKENS).await {
                Ok(analysis) => FileAnalysis {
                    filename: file.filename.clone(),
                    analysis,
                    complexity_score: complexity_score(file),
                    risk_level: assess_risk_level(file),
                },
                Err(e) => {
                    warn!("Failed to analyze {}: {}", file.filename, e);
                    FileAnalysis {
                        filename: file.filename.clone(),
                        analysis: format!("Error analyzing file: {}", e),
                        complexity_score: 0.0,
                        risk_level: RiskLevel::Unknown,
                    }
                }
            };
            results.push(entry);
        }

        info!("Analyzed {} files", results.len());
        results
    }
}

fn extract_content(response: ChatResponse) -> Result<String, NarrativeError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(NarrativeError::EmptyResponse)
}
