//! Application configuration

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: Option<String>,
    /// Base URL of an OpenAI-compatible chat endpoint
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    /// Skip the narrative stage entirely when false
    pub llm_enabled: bool,
    /// How many of the most-changed files get their own LLM pass
    pub file_analysis_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            github_token: env::var("GITHUB_TOKEN").ok(),
            llm_base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3:latest".to_string()),
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_enabled: env::var("LLM_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            file_analysis_limit: env::var("FILE_ANALYSIS_LIMIT")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(5),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
