//! State store for the phase tree.
//!
//! All mutation goes through [`Action`] values applied by the pure
//! [`reduce`] function: `(tree, action) -> new tree`. Unknown task, file,
//! or annotation ids make the action a no-op. Async work (file ingestion)
//! posts actions tagged with the entity id it owns, so completions need no
//! ordering between each other.
//!
//! [`Store`] is the owning facade: it applies actions and keeps the derived
//! progress percentage current.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Annotation, FileStatus, Phase, Task, TaskStatus, UploadedFile};

/// Result of a summarization attempt, posted back by the ingestion
/// pipeline once the AI call resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryOutcome {
    /// One-sentence summary text
    Summary(String),
    /// Error message, surfaced verbatim as the file's summary
    Failed(String),
}

/// A single update to the phase tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace a task's status
    SetTaskStatus { task_id: String, status: TaskStatus },

    /// Append an uploaded-file record to a task. Capacity is checked by the
    /// ingestion entry point before any record is created, not here.
    PublishFile { task_id: String, file: UploadedFile },

    /// Finish a file's two-step lifecycle: Complete with a summary, or
    /// Error with the failure message (bytes kept either way).
    ResolveFile { task_id: String, file_id: String, outcome: SummaryOutcome },

    /// Delete a file record
    RemoveFile { task_id: String, file_id: String },

    /// Append an annotation to a file
    AddAnnotation { task_id: String, file_id: String, annotation: Annotation },

    /// Delete an annotation from a file
    RemoveAnnotation { task_id: String, file_id: String, annotation_id: String },
}

impl Action {
    /// The task this action targets.
    fn task_id(&self) -> &str {
        match self {
            Self::SetTaskStatus { task_id, .. }
            | Self::PublishFile { task_id, .. }
            | Self::ResolveFile { task_id, .. }
            | Self::RemoveFile { task_id, .. }
            | Self::AddAnnotation { task_id, .. }
            | Self::RemoveAnnotation { task_id, .. } => task_id,
        }
    }
}

/// Apply an action to the tree, returning the new tree.
///
/// Pure: the input is not mutated. File byte buffers are behind `Arc`, so
/// untouched content is shared between the old and new trees rather than
/// copied.
pub fn reduce(phases: &[Phase], action: &Action) -> Vec<Phase> {
    let target = action.task_id();
    phases
        .iter()
        .map(|phase| Phase {
            title: phase.title.clone(),
            subtitle: phase.subtitle.clone(),
            tasks: phase
                .tasks
                .iter()
                .map(|task| {
                    if task.id == target {
                        apply_to_task(task, action)
                    } else {
                        task.clone()
                    }
                })
                .collect(),
        })
        .collect()
}

fn apply_to_task(task: &Task, action: &Action) -> Task {
    let mut task = task.clone();
    match action {
        Action::SetTaskStatus { status, .. } => {
            task.status = *status;
        }
        Action::PublishFile { file, .. } => {
            task.files.push(file.clone());
        }
        Action::ResolveFile { file_id, outcome, .. } => {
            if let Some(file) = task.files.iter_mut().find(|f| f.id == *file_id) {
                match outcome {
                    SummaryOutcome::Summary(text) => {
                        file.summary = text.clone();
                        file.status = FileStatus::Complete;
                    }
                    SummaryOutcome::Failed(message) => {
                        file.summary = message.clone();
                        file.status = FileStatus::Error;
                    }
                }
            } else {
                debug!(file_id, "resolve for unknown file, ignoring");
            }
        }
        Action::RemoveFile { file_id, .. } => {
            task.files.retain(|f| f.id != *file_id);
        }
        Action::AddAnnotation { file_id, annotation, .. } => {
            if let Some(file) = task.files.iter_mut().find(|f| f.id == *file_id) {
                file.annotations.push(annotation.clone());
            }
        }
        Action::RemoveAnnotation { file_id, annotation_id, .. } => {
            if let Some(file) = task.files.iter_mut().find(|f| f.id == *file_id) {
                file.annotations.retain(|a| a.id != *annotation_id);
            }
        }
    }
    task
}

/// Overall progress: percentage of tasks marked Done, rounded to the
/// nearest whole percent. 0 when the plan has no tasks.
pub fn progress_percent(phases: &[Phase]) -> u8 {
    let total = phases.iter().map(|p| p.tasks.len()).sum::<usize>();
    if total == 0 {
        return 0;
    }
    let done =
        phases.iter().flat_map(|p| &p.tasks).filter(|t| t.status == TaskStatus::Done).count();
    (done as f64 / total as f64 * 100.0).round() as u8
}

/// Owner of the phase tree.
pub struct Store {
    phases: Vec<Phase>,
    progress: u8,
}

impl Store {
    /// Create a store over an initial plan.
    pub fn new(phases: Vec<Phase>) -> Self {
        let progress = progress_percent(&phases);
        Self { phases, progress }
    }

    /// Apply one action and refresh the derived progress.
    pub fn dispatch(&mut self, action: &Action) {
        self.phases = reduce(&self.phases, action);
        self.progress = progress_percent(&self.phases);
    }

    /// Current tree. Cloning it is cheap enough for snapshots: file bytes
    /// are shared, not copied.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Percentage of tasks Done, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Look up a task by id.
    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.phases.iter().flat_map(|p| &p.tasks).find(|t| t.id == task_id)
    }

    /// Total number of uploaded files across the tree.
    pub fn file_count(&self) -> usize {
        self.phases.iter().flat_map(|p| &p.tasks).map(|t| t.files.len()).sum()
    }
}
