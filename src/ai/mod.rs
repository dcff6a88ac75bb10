//! AI advisor integration.
//!
//! Two capabilities back the checklist: on-demand collection advice for a
//! task, and a one-sentence summary of each uploaded file. Both are single
//! attempts; a failed call is terminal for that call and its message is
//! surfaced to the user verbatim.

mod gemini;

pub use gemini::GeminiAdvisor;

use async_trait::async_trait;

use crate::model::Task;

/// The slice of a task an advisor call sees.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub title: String,
    pub description: String,
    pub details: Vec<String>,
}

impl TaskContext {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            details: task.details.clone(),
        }
    }
}

/// Trait for AI advisors.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Free-form advice for a prompt, returned as Markdown.
    async fn advice(&self, prompt: &str) -> anyhow::Result<String>;

    /// One-sentence summary of a file's value for the given task.
    async fn summarize_file(
        &self,
        context: &TaskContext,
        name: &str,
        mime_type: &str,
        content: &[u8],
    ) -> anyhow::Result<String>;

    /// Get the advisor name.
    fn name(&self) -> &str;

    /// Check if the advisor can take calls.
    fn is_available(&self) -> bool;
}

/// Build the collection-advice prompt for a task.
pub fn tip_prompt(context: &TaskContext) -> String {
    format!(
        r"As an expert in AI and data collection for RAG systems in a healthcare IT environment, provide concise, actionable advice for the following task. The user is an IT Support Engineer.

Task Title: {}
Task Description: {}
Task Details: {}

Your advice should focus on:
1. **Best practices** for collecting this specific type of data.
2. How to ensure the data is **high-quality and relevant** for fine-tuning a language model for Radiology IT support.
3. Crucial reminders about **data privacy and anonymization (like PHI)**.
4. A practical, pro-level tip that an expert would know.

Format your response as clean Markdown.",
        context.title,
        context.description,
        context.details.join("; ")
    )
}

/// Advisor returning canned responses. Used by tests and by offline runs
/// where no API key is configured.
#[derive(Debug, Clone)]
pub struct StaticAdvisor {
    response: Result<String, String>,
}

impl StaticAdvisor {
    /// Every call succeeds with the given text.
    pub fn summaries(text: impl Into<String>) -> Self {
        Self { response: Ok(text.into()) }
    }

    /// Every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { response: Err(message.into()) }
    }

    fn respond(&self) -> anyhow::Result<String> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}

#[async_trait]
impl Advisor for StaticAdvisor {
    async fn advice(&self, _prompt: &str) -> anyhow::Result<String> {
        self.respond()
    }

    async fn summarize_file(
        &self,
        _context: &TaskContext,
        _name: &str,
        _mime_type: &str,
        _content: &[u8],
    ) -> anyhow::Result<String> {
        self.respond()
    }

    fn name(&self) -> &str {
        "static"
    }

    fn is_available(&self) -> bool {
        self.response.is_ok()
    }
}
