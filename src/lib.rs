//! # Ragpack
//!
//! Guided data-collection checklist for building RAG corpora.
//!
//! Ragpack walks a support engineer through a multi-phase collection plan:
//! upload files against categorized tasks, get a one-sentence AI summary of
//! each upload, annotate anything noteworthy, and export the lot as a
//! review-ready zip archive with per-folder annotation sidecars.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install
//! cargo install ragpack
//!
//! # Show the built-in plan
//! ragpack list
//!
//! # Start an interactive collection session
//! ragpack run
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

pub mod ai;
pub mod app;
pub mod export;
pub mod ingest;
pub mod model;
pub mod store;

pub use ai::{tip_prompt, Advisor, GeminiAdvisor, StaticAdvisor, TaskContext};
pub use app::App;
pub use export::{
    build_archive, write_archive, ExportError, ANNOTATIONS_FILE_NAME, ARCHIVE_FILE_NAME,
};
pub use ingest::{ContentCategory, FileSource, IngestError, PayloadPart, RawFile};
pub use model::{
    default_plan, load_plan, Annotation, FileConfig, FileStatus, Phase, Task, TaskStatus,
    UploadedFile,
};
pub use store::{progress_percent, reduce, Action, Store, SummaryOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ragpack";
