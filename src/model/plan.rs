//! Collection plans.
//!
//! A plan is the ordered list of phases the checklist walks through. The
//! built-in plan targets a one-week radiology IT data-collection effort;
//! custom plans load from JSON or TOML files.

use std::path::Path;

use serde::Deserialize;

use super::{Phase, Task};

/// Wrapper for deserializing plan files.
#[derive(Debug, Deserialize)]
struct PlanFile {
    phases: Vec<Phase>,
}

/// Load a plan from a JSON or TOML file, chosen by extension.
pub fn load_plan(path: &Path) -> anyhow::Result<Vec<Phase>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read plan {}: {e}", path.display()))?;

    let plan: PlanFile = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&raw)?,
        _ => serde_json::from_str(&raw)?,
    };

    if plan.phases.iter().all(|p| p.tasks.is_empty()) {
        anyhow::bail!("plan {} contains no tasks", path.display());
    }

    Ok(plan.phases)
}

/// The built-in plan: one week of data gathering for a radiology IT
/// support RAG corpus.
pub fn default_plan() -> Vec<Phase> {
    vec![
        Phase {
            title: Some("Phase 1: Data Collection (1 week)".to_string()),
            subtitle: "Day 1-2: Initial Data Gathering".to_string(),
            tasks: vec![
                Task::new(
                    "t1",
                    "Export Support Tickets",
                    "Export the most recent 50-100 tickets to PDF format.",
                )
                .with_details(vec![
                    "Prioritize tickets related to PACS Viewer, annotations, and dictation issues."
                        .to_string(),
                    "These PDFs are crucial for training the language model to understand common issues and resolution patterns."
                        .to_string(),
                ])
                .with_file_config("application/pdf", 100, "SupportTickets"),
                Task::new(
                    "t2",
                    "Screen Capture Collection",
                    "Capture 5-10 typical workflow scenarios in PACS Viewer.",
                )
                .with_details(vec![
                    "Use existing screen capture software on the workstation.".to_string(),
                    "Include examples of annotation processes.".to_string(),
                    "Aim for 2-3 hours of total screen capture footage.".to_string(),
                    "Visual data helps in developing the model's understanding of UI interactions and workflow patterns."
                        .to_string(),
                ])
                .with_file_config("image/*,video/*", 20, "ScreenCaptures"),
            ],
        },
        Phase {
            title: None,
            subtitle: "Day 3-4: Log Files and Audio Collection".to_string(),
            tasks: vec![
                Task::new(
                    "t3",
                    "Collect Log Files",
                    "Locate and copy log files for PACS, EMR, DICOM, and HL7 systems.",
                )
                .with_details(vec![
                    "Copy the most recent week's worth of log files to a designated secure location."
                        .to_string(),
                    "Log files will be used to train the model on system behavior and error patterns."
                        .to_string(),
                ])
                .with_file_config(".log,text/plain", 50, "LogFiles"),
                Task::new(
                    "t4",
                    "Gather Dictation Audio Samples",
                    "Collect 10-15 anonymized dictation audio samples.",
                )
                .with_details(vec![
                    "Ensure a mix of different radiologists and study types.".to_string(),
                    "If dictation audio is unavailable, collect any relevant audio recordings from support calls."
                        .to_string(),
                    "Audio data will help in developing speech-to-text capabilities and understanding dictation-related issues."
                        .to_string(),
                ])
                .with_file_config("audio/*", 20, "AudioSamples"),
            ],
        },
        Phase {
            title: None,
            subtitle: "Day 5: Email Correspondence and Observations".to_string(),
            tasks: vec![
                Task::new(
                    "t5",
                    "Compile Email Correspondence",
                    "Export the last month's worth of support-related emails.",
                )
                .with_details(vec![
                    "Focus on emails that show the triage process and common communication patterns."
                        .to_string(),
                    "Remove any sensitive or identifying information.".to_string(),
                    "Email data will be crucial for training the model on communication styles and triage processes."
                        .to_string(),
                ])
                .with_file_config(".eml,.msg,text/plain", 100, "Emails"),
                Task::new(
                    "t6",
                    "Document Initial Observations",
                    "Create a brief report noting any initial observations or patterns.",
                )
                .with_details(vec![
                    "Focus on insights that could be relevant for developing the GenAI tool."
                        .to_string(),
                ])
                .with_file_config("text/markdown,.md,text/plain", 5, "Observations"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_plan_shape() {
        let phases = default_plan();
        assert_eq!(phases.len(), 3);
        let tasks: Vec<_> = phases.iter().flat_map(|p| &p.tasks).collect();
        assert_eq!(tasks.len(), 6);
        assert!(tasks.iter().all(|t| t.file_config.is_some()));
    }

    #[test]
    fn test_default_plan_ids_unique() {
        let phases = default_plan();
        let mut ids: Vec<_> =
            phases.iter().flat_map(|p| &p.tasks).map(|t| t.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_load_plan_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"phases": [{{"subtitle": "Day 1", "tasks": [
                {{"id": "x1", "title": "T", "description": "D",
                  "file_config": {{"accept": "*", "max_files": 3, "folder": "F"}}}}
            ]}}]}}"#
        )
        .unwrap();

        let phases = load_plan(file.path()).unwrap();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].tasks[0].id, "x1");
        assert_eq!(phases[0].tasks[0].file_config.as_ref().unwrap().max_files, 3);
    }

    #[test]
    fn test_load_plan_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[phases]]
subtitle = "Day 1"

[[phases.tasks]]
id = "x1"
title = "T"
description = "D"
"#
        )
        .unwrap();

        let phases = load_plan(file.path()).unwrap();
        assert_eq!(phases[0].tasks[0].title, "T");
        assert!(phases[0].tasks[0].file_config.is_none());
    }

    #[test]
    fn test_load_plan_rejects_empty() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"phases": [{{"subtitle": "empty", "tasks": []}}]}}"#).unwrap();
        assert!(load_plan(file.path()).is_err());
    }
}
