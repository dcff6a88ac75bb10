//! File ingestion pipeline.
//!
//! Turns raw file handles into fully realized [`UploadedFile`] records.
//! Each file runs its own two-step lifecycle on a spawned task: read the
//! bytes and publish a Summarizing placeholder, then summarize through the
//! advisor and resolve to Complete or Error. Every step posts an [`Action`]
//! tagged with the file's own id over the update channel, so files added
//! together complete in any order without coordination.

mod payload;

pub use payload::{file_payload, ContentCategory, PayloadPart};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::ai::{Advisor, TaskContext};
use crate::model::{Task, UploadedFile};
use crate::store::{Action, SummaryOutcome};

/// Ingestion failures reported before any state changes.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("You can only upload a maximum of {max_files} files for this task.")]
    CapacityExceeded { max_files: usize },

    #[error("Task '{0}' does not accept file uploads")]
    UploadsNotAccepted(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),
}

/// Where a raw file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read from disk at ingestion time
    Path(PathBuf),
    /// Already in memory (tests, programmatic callers)
    Memory(Vec<u8>),
}

/// A file handle as supplied by the file-input collaborator: a name, a
/// MIME type, and a readable byte source.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub source: FileSource,
}

impl RawFile {
    /// Handle for an on-disk file; MIME type guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let mime_type = guess_mime(&path).to_string();
        Self { name, mime_type, source: FileSource::Path(path) }
    }

    /// Handle over in-memory bytes.
    pub fn in_memory(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self { name: name.into(), mime_type: mime_type.into(), source: FileSource::Memory(bytes) }
    }

    /// Read the full byte content.
    async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Start ingesting a batch of files for a task.
///
/// Enforces the task's file-count limit against the current tree plus the
/// whole incoming batch; a rejected batch spawns nothing and mutates
/// nothing. On success, one detached task per file drives that file's
/// lifecycle and reports through `updates`. Returns the number of files
/// spawned.
pub fn spawn_ingestion(
    task: &Task,
    files: Vec<RawFile>,
    advisor: Arc<dyn Advisor>,
    updates: UnboundedSender<Action>,
) -> Result<usize, IngestError> {
    let Some(config) = &task.file_config else {
        return Err(IngestError::UploadsNotAccepted(task.id.clone()));
    };
    // Counts only files already in the tree: a batch still being read has
    // no placeholders yet, so two batches submitted back-to-back can
    // together land over the limit.
    if task.files.len() + files.len() > config.max_files {
        return Err(IngestError::CapacityExceeded { max_files: config.max_files });
    }

    let context = TaskContext::from_task(task);
    let spawned = files.len();
    for raw in files {
        let advisor = Arc::clone(&advisor);
        let updates = updates.clone();
        let context = context.clone();
        let task_id = task.id.clone();
        tokio::spawn(async move {
            ingest_file(task_id, context, raw, advisor, updates).await;
        });
    }
    Ok(spawned)
}

/// Run one file's lifecycle: read, publish, summarize, resolve.
async fn ingest_file(
    task_id: String,
    context: TaskContext,
    raw: RawFile,
    advisor: Arc<dyn Advisor>,
    updates: UnboundedSender<Action>,
) {
    let content = match raw.read().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(name = %raw.name, error = %e, "file read failed");
            let file = UploadedFile::read_failed(&raw.name, &raw.mime_type, &e.to_string());
            let _ = updates.send(Action::PublishFile { task_id, file });
            return;
        }
    };

    let file = UploadedFile::pending(&raw.name, &raw.mime_type, content);
    let file_id = file.id.clone();
    debug!(name = %raw.name, bytes = file.size(), "file read, requesting summary");

    // The record must be visible before summarization completes.
    let content = Arc::clone(&file.content);
    if updates.send(Action::PublishFile { task_id: task_id.clone(), file }).is_err() {
        return;
    }

    let outcome = match advisor.summarize_file(&context, &raw.name, &raw.mime_type, &content).await
    {
        Ok(summary) => SummaryOutcome::Summary(summary),
        Err(e) => {
            warn!(name = %raw.name, error = %e, "summarization failed");
            SummaryOutcome::Failed(e.to_string())
        }
    };
    let _ = updates.send(Action::ResolveFile { task_id, file_id, outcome });
}

/// Guess a MIME type from a path's extension. Unknown extensions report
/// as a generic binary stream.
fn guess_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("eml") => "message/rfc822",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StaticAdvisor;
    use crate::model::{default_plan, FileStatus};
    use crate::store::Store;
    use tokio::sync::mpsc;

    fn logs_task(store: &Store) -> &Task {
        store.task("t3").unwrap()
    }

    async fn drain(
        store: &mut Store,
        rx: &mut mpsc::UnboundedReceiver<Action>,
        expected: usize,
    ) {
        let mut seen = 0;
        while seen < expected {
            let action = rx.recv().await.expect("channel closed early");
            store.dispatch(&action);
            seen += 1;
        }
    }

    #[tokio::test]
    async fn test_successful_ingestion_lifecycle() {
        let mut store = Store::new(default_plan());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let advisor = Arc::new(StaticAdvisor::summaries("Shows PACS error bursts."));

        let spawned = spawn_ingestion(
            logs_task(&store),
            vec![RawFile::in_memory("a.log", "text/plain", b"boom".to_vec())],
            advisor,
            tx,
        )
        .unwrap();
        assert_eq!(spawned, 1);

        // publish then resolve
        drain(&mut store, &mut rx, 2).await;
        let file = &store.task("t3").unwrap().files[0];
        assert_eq!(file.status, FileStatus::Complete);
        assert_eq!(file.summary, "Shows PACS error bursts.");
        assert_eq!(file.size(), 4);
    }

    #[tokio::test]
    async fn test_read_failure_yields_error_record() {
        let mut store = Store::new(default_plan());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let advisor = Arc::new(StaticAdvisor::summaries("unused"));

        spawn_ingestion(
            logs_task(&store),
            vec![RawFile::from_path("/nonexistent/ragpack/missing.log")],
            advisor,
            tx,
        )
        .unwrap();

        // read failures publish a single terminal record
        drain(&mut store, &mut rx, 1).await;
        let file = &store.task("t3").unwrap().files[0];
        assert_eq!(file.status, FileStatus::Error);
        assert_eq!(file.size(), 0);
        assert!(file.summary.starts_with("Error:"), "summary was {:?}", file.summary);
    }

    #[tokio::test]
    async fn test_summarize_failure_keeps_bytes() {
        let mut store = Store::new(default_plan());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let advisor = Arc::new(StaticAdvisor::failing("Failed to summarize. Details: 429"));

        spawn_ingestion(
            logs_task(&store),
            vec![RawFile::in_memory("a.log", "text/plain", b"payload".to_vec())],
            advisor,
            tx,
        )
        .unwrap();

        drain(&mut store, &mut rx, 2).await;
        let file = &store.task("t3").unwrap().files[0];
        assert_eq!(file.status, FileStatus::Error);
        assert_eq!(file.summary, "Failed to summarize. Details: 429");
        assert_eq!(file.size(), 7);
    }

    #[tokio::test]
    async fn test_capacity_rejection_spawns_nothing() {
        let mut store = Store::new(default_plan());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let advisor: Arc<dyn Advisor> = Arc::new(StaticAdvisor::summaries("ok"));

        // t6 allows at most 5 files
        let batch: Vec<RawFile> = (0..6)
            .map(|i| RawFile::in_memory(format!("n{i}.md"), "text/markdown", vec![]))
            .collect();
        let err =
            spawn_ingestion(store.task("t6").unwrap(), batch, Arc::clone(&advisor), tx.clone())
                .unwrap_err();
        assert!(matches!(err, IngestError::CapacityExceeded { max_files: 5 }));

        // partial fill then an over-limit batch: still rejected, count unchanged
        spawn_ingestion(
            store.task("t6").unwrap(),
            vec![RawFile::in_memory("one.md", "text/markdown", vec![])],
            Arc::clone(&advisor),
            tx.clone(),
        )
        .unwrap();
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(store.task("t6").unwrap().files.len(), 1);

        let refill: Vec<RawFile> = (0..5)
            .map(|i| RawFile::in_memory(format!("m{i}.md"), "text/markdown", vec![]))
            .collect();
        let err = spawn_ingestion(store.task("t6").unwrap(), refill, advisor, tx).unwrap_err();
        assert!(matches!(err, IngestError::CapacityExceeded { max_files: 5 }));
        assert_eq!(store.task("t6").unwrap().files.len(), 1);
    }

    #[tokio::test]
    async fn test_task_without_config_rejects_uploads() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let task = Task::new("bare", "No uploads", "Nothing to attach.");
        let err = spawn_ingestion(
            &task,
            vec![RawFile::in_memory("x", "text/plain", vec![])],
            Arc::new(StaticAdvisor::summaries("ok")),
            tx,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::UploadsNotAccepted(_)));
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a.PDF")), "application/pdf");
        assert_eq!(guess_mime(Path::new("shot.png")), "image/png");
        assert_eq!(guess_mime(Path::new("sys.log")), "text/plain");
        assert_eq!(guess_mime(Path::new("mystery")), "application/octet-stream");
    }
}
