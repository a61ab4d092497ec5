//! Chat-completions client for DeepSeek-compatible endpoints.

use std::time::Duration;

use arxivdigest_shared::{DigestError, Result};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a helpful assistant. You are good at summarizing papers and extracting keywords and institutions.";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for the chat-completions API.
#[derive(Debug, Clone)]
pub struct LlmOptions {
    /// Base URL, e.g. `https://api.deepseek.com`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin client over the `POST /chat/completions` endpoint.
pub struct LlmClient {
    http: Client,
    opts: LlmOptions,
}

impl LlmClient {
    pub fn new(opts: LlmOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| DigestError::Enrichment(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, opts })
    }

    /// Ask the model to tag and summarize one paper. Returns the raw reply
    /// text; the caller parses it into structured fields.
    #[instrument(skip_all, fields(model = %self.opts.model))]
    pub async fn summarize(
        &self,
        title: &str,
        abstract_text: &str,
        first_page: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.opts.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.opts.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(title, abstract_text, first_page) },
            ],
            "stream": false,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.opts.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DigestError::Enrichment(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DigestError::Enrichment(format!(
                "chat request returned HTTP {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| DigestError::Enrichment(format!("invalid chat response: {e}")))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                DigestError::Enrichment("chat response missing message content".into())
            })?;

        debug!(chars = content.len(), "received model reply");
        Ok(content.trim().to_string())
    }
}

/// User prompt asking for the five labeled output lines.
fn build_prompt(title: &str, abstract_text: &str, first_page: &str) -> String {
    format!(
        r#"Title: {title}
Abstract: {abstract_text}
First Page Content: {first_page}

Please analyze the provided paper (including its title, abstract, first page content, and author information) and generate the following structured output:

- Assign three tags:
    - tag1: Choose one of "ai", "sys", or "mlsys" based on the content. If the content is about AI algorithms, then tag1 is "ai"; if the content is about traditional system, then tag1 is "sys"; if the content is about machine learning or deep learning or AI and system, then tag1 is "mlsys".
    - tag2: If tag1 is "mlsys", select one specific subfield from the following list: "llm training", "llm inference", "multi-modal training", "multi-modal inference", "diffusion training", "diffusion inference", "post-training", "cluster infrastructure", "GPU kernels", "fault-tolerance" or "others". If tag1 is "ai" or "sys", assign any reasonable domain-specific category for tag2.
    - tag3: Provide a comma-separated list of specific methods, techniques, or keywords used in the paper (e.g., "tensor parallelism, quantization, flash attention"). For "ai" or "sys" papers, this can be any relevant technical terms.

- Identify the institution(s): Infer the main research institution(s) from author affiliations or email domains if explicit affiliations are missing.
- Finally, provide a brief llm_summary in English (2-3 sentences) describing the paper's core method and main conclusion.

Output format (strictly follow, no extra text or code blocks):
tag1: <tag1>
tag2: <tag2>
tag3: <tag3, tag3, ...>
institution: <institution>
llm_summary: <2-3 sentences simple summary (method+conclusion)>"#
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
