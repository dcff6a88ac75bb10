//! Application session.
//!
//! Ties the store, the ingestion pipeline, the advisor, and the export
//! pipeline together behind the operation surface the CLI drives. One
//! `App` is one in-memory session; nothing persists across runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::ai::{tip_prompt, Advisor, TaskContext};
use crate::export::{self, ExportError};
use crate::ingest::{spawn_ingestion, IngestError, RawFile};
use crate::model::{Annotation, FileStatus, Phase, Task, TaskStatus};
use crate::store::{Action, Store};

/// An interactive collection session over one plan.
pub struct App {
    store: Store,
    advisor: Arc<dyn Advisor>,
    updates_tx: UnboundedSender<Action>,
    updates_rx: UnboundedReceiver<Action>,
    /// Files whose ingestion has not yet reached a terminal status
    pending_files: usize,
}

impl App {
    /// Create a session over a plan.
    pub fn new(phases: Vec<Phase>, advisor: Arc<dyn Advisor>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self { store: Store::new(phases), advisor, updates_tx, updates_rx, pending_files: 0 }
    }

    /// Current state tree.
    pub fn phases(&self) -> &[Phase] {
        self.store.phases()
    }

    /// Percentage of tasks Done, 0-100.
    pub fn progress(&self) -> u8 {
        self.store.progress()
    }

    /// Look up a task by id.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.store.task(task_id)
    }

    /// Name of the configured advisor.
    pub fn advisor_name(&self) -> &str {
        self.advisor.name()
    }

    /// Set a task's status. No-op on unknown ids.
    pub fn set_status(&mut self, task_id: &str, status: TaskStatus) {
        self.store.dispatch(&Action::SetTaskStatus { task_id: task_id.to_string(), status });
    }

    /// Start ingesting files for a task. Returns the number of files whose
    /// pipelines were started; a rejected batch starts none and changes
    /// nothing.
    pub fn add_files(&mut self, task_id: &str, files: Vec<RawFile>) -> Result<usize, IngestError> {
        let task = self
            .store
            .task(task_id)
            .ok_or_else(|| IngestError::TaskNotFound(task_id.to_string()))?;
        let spawned =
            spawn_ingestion(task, files, Arc::clone(&self.advisor), self.updates_tx.clone())?;
        self.pending_files += spawned;
        Ok(spawned)
    }

    /// Remove an uploaded file. No-op on unknown ids.
    pub fn remove_file(&mut self, task_id: &str, file_id: &str) {
        self.store.dispatch(&Action::RemoveFile {
            task_id: task_id.to_string(),
            file_id: file_id.to_string(),
        });
    }

    /// Attach a note to an uploaded file. No-op if the file is unknown.
    pub fn add_annotation(&mut self, task_id: &str, file_id: &str, text: &str) {
        self.store.dispatch(&Action::AddAnnotation {
            task_id: task_id.to_string(),
            file_id: file_id.to_string(),
            annotation: Annotation::new(text),
        });
    }

    /// Remove a note from an uploaded file. No-op on unknown ids.
    pub fn remove_annotation(&mut self, task_id: &str, file_id: &str, annotation_id: &str) {
        self.store.dispatch(&Action::RemoveAnnotation {
            task_id: task_id.to_string(),
            file_id: file_id.to_string(),
            annotation_id: annotation_id.to_string(),
        });
    }

    /// Apply any ingestion updates that have already arrived, without
    /// waiting for in-flight summarizations.
    pub fn apply_ready_updates(&mut self) {
        while let Ok(action) = self.updates_rx.try_recv() {
            self.absorb(&action);
        }
    }

    /// Wait until every in-flight file has reached Complete or Error,
    /// applying updates as they arrive.
    pub async fn settle(&mut self) {
        while self.pending_files > 0 {
            let Some(action) = self.updates_rx.recv().await else { break };
            self.absorb(&action);
        }
    }

    /// Number of files still being read or summarized.
    pub fn pending_files(&self) -> usize {
        self.pending_files
    }

    fn absorb(&mut self, action: &Action) {
        // A file settles on its resolve message, or immediately when its
        // read failed and it was published already terminal.
        let settled = match action {
            Action::ResolveFile { .. } => true,
            Action::PublishFile { file, .. } => file.status == FileStatus::Error,
            _ => false,
        };
        self.store.dispatch(action);
        if settled {
            self.pending_files = self.pending_files.saturating_sub(1);
            debug!(remaining = self.pending_files, "file settled");
        }
    }

    /// Fetch AI advice for a task. Fails if the task is unknown or the
    /// advisor call fails; task state is never affected.
    pub async fn tip(&self, task_id: &str) -> anyhow::Result<String> {
        let task = self
            .store
            .task(task_id)
            .ok_or_else(|| anyhow::anyhow!("Task '{task_id}' not found"))?;
        let prompt = tip_prompt(&TaskContext::from_task(task));
        self.advisor.advice(&prompt).await
    }

    /// Export every uploaded file as a zip archive in `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        export::write_archive(self.store.phases(), dir)
    }

    /// Export to an in-memory blob.
    pub fn export_bytes(&self) -> Result<Vec<u8>, ExportError> {
        export::build_archive(self.store.phases())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StaticAdvisor;
    use crate::model::default_plan;

    fn session(advisor: StaticAdvisor) -> App {
        App::new(default_plan(), Arc::new(advisor))
    }

    #[tokio::test]
    async fn test_full_session_flow() {
        let mut app = session(StaticAdvisor::summaries("Useful for error patterns."));

        app.set_status("t3", TaskStatus::InProgress);
        let spawned = app
            .add_files("t3", vec![RawFile::in_memory("a.log", "text/plain", b"log".to_vec())])
            .unwrap();
        assert_eq!(spawned, 1);
        app.settle().await;
        assert_eq!(app.pending_files(), 0);

        let file = &app.task("t3").unwrap().files[0];
        assert_eq!(file.status, FileStatus::Complete);
        let file_id = file.id.clone();

        app.add_annotation("t3", &file_id, "worth a second look");
        app.set_status("t3", TaskStatus::Done);
        assert_eq!(app.progress(), 17);

        let bytes = app.export_bytes().unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn test_add_files_unknown_task() {
        let mut app = session(StaticAdvisor::summaries("x"));
        let err = app
            .add_files("missing", vec![RawFile::in_memory("a", "text/plain", vec![])])
            .unwrap_err();
        assert!(matches!(err, IngestError::TaskNotFound(_)));
        assert_eq!(app.pending_files(), 0);
    }

    #[tokio::test]
    async fn test_settle_counts_read_failures() {
        let mut app = session(StaticAdvisor::summaries("x"));
        app.add_files("t3", vec![RawFile::from_path("/nonexistent/zzz.log")]).unwrap();
        app.settle().await;
        assert_eq!(app.pending_files(), 0);
        assert_eq!(app.task("t3").unwrap().files[0].status, FileStatus::Error);
    }

    #[tokio::test]
    async fn test_tip_failure_leaves_task_untouched() {
        let app = session(StaticAdvisor::failing("Failed to get AI assistance. Details: down"));
        let before = app.task("t1").unwrap().clone();
        let err = app.tip("t1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get AI assistance. Details: down");
        assert_eq!(app.task("t1").unwrap(), &before);
    }

    #[tokio::test]
    async fn test_export_empty_session() {
        let app = session(StaticAdvisor::summaries("x"));
        assert!(matches!(app.export_bytes(), Err(ExportError::NothingToExport)));
    }

    #[tokio::test]
    async fn test_export_snapshot_unaffected_by_later_changes() {
        let mut app = session(StaticAdvisor::summaries("ok"));
        app.add_files("t3", vec![RawFile::in_memory("a.log", "text/plain", b"x".to_vec())])
            .unwrap();
        app.settle().await;

        let bytes = app.export_bytes().unwrap();
        let file_id = app.task("t3").unwrap().files[0].id.clone();
        app.remove_file("t3", &file_id);

        // already-built archive still holds the file; a new export does not
        assert!(!bytes.is_empty());
        assert!(matches!(app.export_bytes(), Err(ExportError::NothingToExport)));
    }
}
