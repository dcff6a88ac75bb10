//! Domain model for the collection workflow.
//!
//! Defines the phase/task/file/annotation tree that the rest of the
//! application operates on: phases group tasks, tasks accept uploaded
//! files, files carry free-text annotations.

mod plan;

pub use plan::{default_plan, load_plan};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named stage of the collection workflow, grouping related tasks.
///
/// Phases are static configuration: once loaded they are never mutated,
/// only the tasks inside them change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Optional headline (e.g. "Phase 1: Data Collection")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Sub-headline describing the time window or focus
    pub subtitle: String,

    /// Tasks in display order
    pub tasks: Vec<Task>,
}

/// Completion status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToDo => write!(f, "To Do"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Done => write!(f, "Done"),
        }
    }
}

impl TaskStatus {
    /// Parse a status from user input (CLI commands, plan files).
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "todo" => Some(Self::ToDo),
            "inprogress" | "started" => Some(Self::InProgress),
            "done" | "complete" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Per-task upload policy: what kinds of files a task accepts, how many,
/// and which archive folder they export into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Accepted-type filter, advisory for file pickers (e.g. "image/*,video/*").
    /// Not enforced by the core.
    pub accept: String,

    /// Maximum number of files this task may hold
    pub max_files: usize,

    /// Export folder name. Tasks sharing a folder name merge their files
    /// into one archive directory.
    pub folder: String,
}

/// A unit of work with a status and an associated file-upload slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique across the whole tree
    pub id: String,

    /// Short display title
    pub title: String,

    /// One-line description of the work
    pub description: String,

    /// Additional guidance bullets
    #[serde(default)]
    pub details: Vec<String>,

    /// Current completion status
    #[serde(default)]
    pub status: TaskStatus,

    /// Uploaded files, in upload order
    #[serde(default)]
    pub files: Vec<UploadedFile>,

    /// Upload policy; tasks without one do not accept files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_config: Option<FileConfig>,
}

impl Task {
    /// Create a task with no files and ToDo status.
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            details: Vec::new(),
            status: TaskStatus::ToDo,
            files: Vec::new(),
            file_config: None,
        }
    }

    /// Set the guidance bullets.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Set the upload policy.
    #[must_use]
    pub fn with_file_config(
        mut self,
        accept: impl Into<String>,
        max_files: usize,
        folder: impl Into<String>,
    ) -> Self {
        self.file_config =
            Some(FileConfig { accept: accept.into(), max_files, folder: folder.into() });
        self
    }

    /// Look up an uploaded file by id.
    pub fn file(&self, file_id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

/// Lifecycle state of an uploaded file.
///
/// Files start `Summarizing` and end in `Complete` or `Error`; both end
/// states are terminal. An errored file can only be removed and re-added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Summarizing,
    Complete,
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summarizing => write!(f, "Summarizing"),
            Self::Complete => write!(f, "Complete"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Summary text shown while a file awaits its AI summary.
pub const PENDING_SUMMARY: &str = "Awaiting summary...";

/// A file uploaded against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Identifier, unique within the task (random, tolerates duplicate names)
    pub id: String,

    /// Original file name, used as-is in the export archive
    pub name: String,

    /// MIME type reported by the file source
    pub mime_type: String,

    /// Raw byte content. Shared, never mutated after ingestion; empty when
    /// the read failed. Not serialized.
    #[serde(skip)]
    pub content: Arc<Vec<u8>>,

    /// One-sentence AI summary, or an error message in `Error` status
    pub summary: String,

    /// Lifecycle state
    pub status: FileStatus,

    /// Free-text notes, in creation order
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl UploadedFile {
    /// Create a file record in `Summarizing` state with placeholder summary.
    pub fn pending(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            mime_type: mime_type.into(),
            content: Arc::new(content),
            summary: PENDING_SUMMARY.to_string(),
            status: FileStatus::Summarizing,
            annotations: Vec::new(),
        }
    }

    /// Create a file record that failed before its bytes could be read.
    /// The record stays addressable so the user can remove it.
    pub fn read_failed(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        reason: &str,
    ) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            mime_type: mime_type.into(),
            content: Arc::new(Vec::new()),
            summary: format!("Error: {reason}"),
            status: FileStatus::Error,
            annotations: Vec::new(),
        }
    }

    /// Byte length of the file content.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// A free-text note attached to an uploaded file. Created and deleted by
/// user action, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub text: String,
}

impl Annotation {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: generate_id(), text: text.into() }
    }
}

/// Generate a collision-resistant identifier (random 128-bit).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("t1", "Collect Logs", "Copy recent log files.")
            .with_details(vec!["Last week only.".to_string()])
            .with_file_config(".log,text/plain", 50, "LogFiles");

        assert_eq!(task.id, "t1");
        assert_eq!(task.status, TaskStatus::ToDo);
        assert!(task.files.is_empty());
        let config = task.file_config.unwrap();
        assert_eq!(config.max_files, 50);
        assert_eq!(config.folder, "LogFiles");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TaskStatus::parse("todo"), Some(TaskStatus::ToDo));
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("bogus"), None);
    }

    #[test]
    fn test_status_display_roundtrip() {
        for status in [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done] {
            assert_eq!(TaskStatus::parse(&status.to_string()), Some(status));
        }
    }

    #[test]
    fn test_pending_file() {
        let file = UploadedFile::pending("a.log", "text/plain", b"hello".to_vec());
        assert_eq!(file.status, FileStatus::Summarizing);
        assert_eq!(file.summary, PENDING_SUMMARY);
        assert_eq!(file.size(), 5);
        assert!(!file.id.is_empty());
    }

    #[test]
    fn test_read_failed_file() {
        let file = UploadedFile::read_failed("a.log", "text/plain", "stream closed");
        assert_eq!(file.status, FileStatus::Error);
        assert_eq!(file.summary, "Error: stream closed");
        assert_eq!(file.size(), 0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: Vec<String> = (0..100).map(|_| generate_id()).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn test_duplicate_names_get_distinct_ids() {
        let a = UploadedFile::pending("same.pdf", "application/pdf", vec![1]);
        let b = UploadedFile::pending("same.pdf", "application/pdf", vec![2]);
        assert_ne!(a.id, b.id);
    }
}
