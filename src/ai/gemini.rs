//! Gemini API integration.
//!
//! Implements the Advisor trait against the `generateContent` REST
//! endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Advisor, TaskContext};
use crate::ingest::{file_payload, PayloadPart};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API advisor.
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiAdvisor {
    /// Create a new Gemini advisor.
    ///
    /// Reads API key from GEMINI_API_KEY environment variable.
    pub fn new() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY not set"))?;

        Ok(Self { client: Client::new(), api_key, model: "gemini-2.5-flash".to_string() })
    }

    /// Create with a specific model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Make a generateContent request.
    async fn request(&self, request: &GenerateContentRequest) -> anyhow::Result<String> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        let response: GenerateContentResponse = response.json().await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| anyhow::anyhow!("No response from Gemini"))
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn advice(&self, prompt: &str) -> anyhow::Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part::text(prompt)] }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(0.5),
                top_p: Some(0.95),
                top_k: Some(64),
            }),
        };

        self.request(&request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get AI assistance. Details: {e}"))
    }

    async fn summarize_file(
        &self,
        context: &TaskContext,
        name: &str,
        mime_type: &str,
        content: &[u8],
    ) -> anyhow::Result<String> {
        let system = format!(
            r#"You are an AI assistant helping an IT engineer collect data for a RAG system in radiology.
Your task is to provide a brief, one-sentence summary of what useful information could be extracted from the provided file for this specific data collection task.

**Data Collection Task Context:**
- **Task Title:** "{}"
- **Task Description:** "{}"

**File Information:**
Below is either the content of the file or its metadata.

Analyze this information and generate a summary.
Focus on the *potential value* of the file's content for training a large language model on radiology IT support topics.
For example, instead of "This is a log file", say "This log file could provide patterns of system errors and user actions preceding a fault."
Instead of "An image of a PACS viewer", say "This screenshot likely demonstrates a common user workflow or a specific UI-related issue."
Keep your summary to a single, concise sentence."#,
            context.title, context.description
        );

        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![file_payload(name, mime_type, content).into()] }],
            system_instruction: Some(Content { parts: vec![Part::text(&system)] }),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                top_p: None,
                top_k: Some(32),
            }),
        };

        let summary = self
            .request(&request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to summarize. Details: {e}"))?;
        Ok(summary.trim().to_string())
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// generateContent request structure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// A content block: an ordered list of parts.
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

/// One part of a content block; exactly one field is set.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), inline_data: None }
    }
}

impl From<PayloadPart> for Part {
    fn from(part: PayloadPart) -> Self {
        match part {
            PayloadPart::Text(text) => Self::text(text),
            PayloadPart::InlineData { mime_type, data } => Self {
                text: None,
                inline_data: Some(InlineData { mime_type, data }),
            },
        }
    }
}

/// Inline binary data, base64-encoded.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Sampling configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

/// generateContent response structure.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
