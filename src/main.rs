//! Ragpack - guided data-collection checklist for RAG corpora.
//!
//! Walks a collection plan task by task: upload files, let the AI
//! summarize each one, annotate, and export everything as a zip archive.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ragpack::{
    default_plan, load_plan, Advisor, App, FileStatus, GeminiAdvisor, Phase, RawFile,
    StaticAdvisor, Task, TaskStatus,
};

/// Guided data-collection checklist for RAG corpora
#[derive(Parser)]
#[command(name = "ragpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use a custom plan file (JSON or TOML) instead of the built-in plan
    #[arg(short, long, global = true)]
    plan: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive collection session (default)
    Run,

    /// List the plan's phases and tasks
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Ingest files listed in a manifest and export the archive
    Collect {
        /// JSON manifest mapping task ids to file paths
        manifest: PathBuf,

        /// Directory to write the archive into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragpack=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragpack=warn"))
    };
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let phases = match &cli.plan {
        Some(path) => load_plan(path)?,
        None => default_plan(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::List { format } => list_plan(&phases, &format),
        Commands::Run => run_session(phases).await,
        Commands::Collect { manifest, output } => collect(phases, &manifest, &output).await,
    }
}

/// Pick the advisor: Gemini when an API key is configured, otherwise a
/// stand-in whose calls fail so files land in Error status but the rest
/// of the session keeps working.
fn make_advisor() -> Arc<dyn Advisor> {
    match GeminiAdvisor::new() {
        Ok(advisor) => Arc::new(advisor),
        Err(e) => {
            eprintln!("Warning: AI summaries disabled ({e})");
            Arc::new(StaticAdvisor::failing(format!("AI unavailable: {e}")))
        }
    }
}

fn list_plan(phases: &[Phase], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(phases)?);
        return Ok(());
    }
    for phase in phases {
        if let Some(title) = &phase.title {
            println!("{title}");
        }
        println!("  {}", phase.subtitle);
        for task in &phase.tasks {
            println!("    [{}] {} - {}", task.id, task.title, task.description);
            if let Some(config) = &task.file_config {
                println!(
                    "        uploads: {} (max {}, folder {})",
                    config.accept, config.max_files, config.folder
                );
            }
        }
    }
    Ok(())
}

async fn collect(phases: Vec<Phase>, manifest: &Path, output: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(manifest)?;
    let entries: BTreeMap<String, Vec<PathBuf>> = serde_json::from_str(&raw)?;

    let mut app = App::new(phases, make_advisor());
    for (task_id, paths) in entries {
        let files = paths.into_iter().map(RawFile::from_path).collect();
        match app.add_files(&task_id, files) {
            Ok(count) => println!("{task_id}: ingesting {count} file(s)"),
            Err(e) => eprintln!("{task_id}: {e}"),
        }
    }

    app.settle().await;
    for task in app.phases().iter().flat_map(|p| &p.tasks) {
        for file in &task.files {
            println!("  {} [{}] {}", file.name, file.status, file.summary);
        }
    }

    match app.export(output) {
        Ok(path) => println!("Exported {}", path.display()),
        Err(e) => eprintln!("{e}"),
    }
    Ok(())
}

async fn run_session(phases: Vec<Phase>) -> Result<()> {
    let mut app = App::new(phases, make_advisor());
    println!("ragpack interactive session - type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        app.apply_ready_updates();
        print!("ragpack> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if !handle_command(&mut app, &line).await? {
            break;
        }
    }
    Ok(())
}

/// Run one session command. Returns false when the session should end.
async fn handle_command(app: &mut App, line: &str) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "help" => print_help(),
        "quit" | "exit" => return Ok(false),
        "progress" => println!("Progress: {}%", app.progress()),
        "show" => match args.first() {
            Some(task_id) => match app.task(task_id) {
                Some(task) => print_task(task),
                None => println!("Task '{task_id}' not found"),
            },
            None => {
                for phase in app.phases() {
                    if let Some(title) = &phase.title {
                        println!("{title}");
                    }
                    println!("  {}", phase.subtitle);
                    for task in &phase.tasks {
                        println!(
                            "    [{}] {} ({}, {} file(s))",
                            task.id,
                            task.title,
                            task.status,
                            task.files.len()
                        );
                    }
                }
            }
        },
        "status" => match args.as_slice() {
            [task_id, status] => match TaskStatus::parse(status) {
                Some(status) => app.set_status(task_id, status),
                None => println!("Unknown status '{status}' (todo, inprogress, done)"),
            },
            _ => println!("Usage: status <task> <todo|inprogress|done>"),
        },
        "add" => match args.split_first() {
            Some((task_id, paths)) if !paths.is_empty() => {
                let files = paths.iter().map(|p| RawFile::from_path(*p)).collect();
                match app.add_files(task_id, files) {
                    Ok(count) => println!("Ingesting {count} file(s); 'wait' to finish summaries"),
                    Err(e) => println!("{e}"),
                }
            }
            _ => println!("Usage: add <task> <path>..."),
        },
        "wait" => {
            app.settle().await;
            println!("All files settled");
        }
        "rm" => match args.as_slice() {
            [task_id, index] => match file_id_at(app, task_id, index) {
                Ok(file_id) => app.remove_file(task_id, &file_id),
                Err(message) => println!("{message}"),
            },
            _ => println!("Usage: rm <task> <file#>"),
        },
        "note" => match args.as_slice() {
            [task_id, index, text @ ..] if !text.is_empty() => {
                match file_id_at(app, task_id, index) {
                    Ok(file_id) => app.add_annotation(task_id, &file_id, &text.join(" ")),
                    Err(message) => println!("{message}"),
                }
            }
            _ => println!("Usage: note <task> <file#> <text>"),
        },
        "unnote" => match args.as_slice() {
            [task_id, index, note_index] => match file_id_at(app, task_id, index) {
                Ok(file_id) => {
                    let annotation_id = app
                        .task(task_id)
                        .and_then(|t| t.file(&file_id))
                        .and_then(|f| {
                            let i: usize = note_index.parse().ok()?;
                            f.annotations.get(i.checked_sub(1)?).map(|a| a.id.clone())
                        });
                    match annotation_id {
                        Some(annotation_id) => {
                            app.remove_annotation(task_id, &file_id, &annotation_id);
                        }
                        None => println!("No note #{note_index} on that file"),
                    }
                }
                Err(message) => println!("{message}"),
            },
            _ => println!("Usage: unnote <task> <file#> <note#>"),
        },
        "tip" => match args.first() {
            Some(task_id) => match app.tip(task_id).await {
                Ok(tip) => println!("{tip}"),
                Err(e) => println!("**Error:** Could not fetch AI assistance. {e}"),
            },
            None => println!("Usage: tip <task>"),
        },
        "export" => {
            let dir = args.first().map_or_else(|| PathBuf::from("."), |p| PathBuf::from(*p));
            match app.export(&dir) {
                Ok(path) => println!("Exported {}", path.display()),
                Err(e) => println!("{e}"),
            }
        }
        other => println!("Unknown command '{other}' - type 'help'"),
    }
    Ok(true)
}

/// Resolve a 1-based file index within a task to the file's id.
fn file_id_at(app: &App, task_id: &str, index: &str) -> Result<String, String> {
    let task = app.task(task_id).ok_or_else(|| format!("Task '{task_id}' not found"))?;
    let index: usize = index.parse().map_err(|_| format!("Not a file number: '{index}'"))?;
    index
        .checked_sub(1)
        .and_then(|i| task.files.get(i))
        .map(|f| f.id.clone())
        .ok_or_else(|| format!("No file #{index} on task '{task_id}'"))
}

fn print_task(task: &Task) {
    println!("[{}] {} ({})", task.id, task.title, task.status);
    println!("    {}", task.description);
    for detail in &task.details {
        println!("    - {detail}");
    }
    if let Some(config) = &task.file_config {
        println!(
            "    uploads: {} (max {}, folder {})",
            config.accept, config.max_files, config.folder
        );
    }
    for (i, file) in task.files.iter().enumerate() {
        let marker = match file.status {
            FileStatus::Summarizing => "~",
            FileStatus::Complete => "+",
            FileStatus::Error => "!",
        };
        println!("    {} {}. {} ({} bytes)", marker, i + 1, file.name, file.size());
        println!("         {}", file.summary);
        for (j, annotation) in file.annotations.iter().enumerate() {
            println!("         note {}: {}", j + 1, annotation.text);
        }
    }
}

fn print_help() {
    println!(
        "Commands:
  show [task]                  show the plan, or one task in detail
  status <task> <state>        set task state (todo, inprogress, done)
  add <task> <path>...         upload files to a task
  wait                         wait for pending AI summaries
  rm <task> <file#>            remove an uploaded file
  note <task> <file#> <text>   annotate an uploaded file
  unnote <task> <file#> <n#>   remove an annotation
  tip <task>                   AI advice for a task
  progress                     overall completion percentage
  export [dir]                 write the zip archive
  quit                         end the session"
    );
}
