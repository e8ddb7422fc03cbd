//! Lectern Console
//!
//! Drives the content coordinator against a live content service.
//!
//! ## Usage
//!
//! ```bash
//! # Show a course outline, annotated for one learner
//! lectern outline course-1 --user user-7
//!
//! # Reorder the modules of a course
//! lectern reorder-modules course-1 m3 m1 m2
//!
//! # Reorder the lessons of a module
//! lectern reorder-lessons course-1 m1 l2 l1 l3
//!
//! # Complete a lesson / submit a quiz
//! lectern complete-lesson course-1 l1 --user user-7
//! lectern submit-quiz course-1 m1 --user user-7 --answers answers.json
//!
//! # Point at another service
//! lectern --base-url https://church.example/api --config lectern.toml outline course-1
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use lectern_sdk::{ContentClient, ContentCoordinator, LecternConfig, QuizAnswer, ReorderOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(about = "Course content ordering and progression console")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Content service base URL
    #[arg(long, env = "LECTERN_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token for the content service
    #[arg(long, env = "LECTERN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip the re-fetch after each reorder
    #[arg(long)]
    no_reconcile: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the course hierarchy as JSON
    Outline {
        course_id: String,
        /// Annotate lock state for this learner
        #[arg(long)]
        user: Option<String>,
    },

    /// Persist a new module order
    ReorderModules {
        course_id: String,
        /// Every module id of the course, in the new order
        #[arg(required = true)]
        module_ids: Vec<String>,
    },

    /// Persist a new lesson order within one module
    ReorderLessons {
        course_id: String,
        module_id: String,
        /// Every lesson id of the module, in the new order
        #[arg(required = true)]
        lesson_ids: Vec<String>,
    },

    /// Mark a lesson complete for a learner
    CompleteLesson {
        course_id: String,
        lesson_id: String,
        #[arg(long)]
        user: String,
    },

    /// Submit answers for a module's quiz
    SubmitQuiz {
        course_id: String,
        module_id: String,
        #[arg(long)]
        user: String,
        /// JSON file holding `[{"questionId": ..., "answer": ...}]`
        #[arg(long)]
        answers: Option<PathBuf>,
    },
}

impl Command {
    fn course_id(&self) -> &str {
        match self {
            Command::Outline { course_id, .. }
            | Command::ReorderModules { course_id, .. }
            | Command::ReorderLessons { course_id, .. }
            | Command::CompleteLesson { course_id, .. }
            | Command::SubmitQuiz { course_id, .. } => course_id,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lectern_sdk=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => LecternConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LecternConfig::default(),
    };

    // Apply CLI overrides
    if let Some(base_url) = args.base_url {
        config.service.base_url = base_url;
    }
    if let Some(api_key) = args.api_key {
        config.service.api_key = Some(api_key);
    }
    if args.no_reconcile {
        config.coordinator.reconcile_after_reorder = false;
    }

    info!(base_url = %config.service.base_url, "Starting lectern console");

    let client = ContentClient::new(config.service.clone()).context("building content client")?;
    let coordinator = ContentCoordinator::with_config(Arc::new(client), config.coordinator.clone());

    let course_id = args.command.course_id().to_string();
    coordinator.load_hierarchy(&course_id).await?;

    match args.command {
        Command::Outline { user, .. } => match user {
            Some(user) => {
                let (outline, view) = coordinator.annotated_outline(&user).await?;
                if let Some(next) = view.next_node() {
                    info!(user_id = %user, next = %next.id(), "Next accessible node");
                }
                print_json(&outline)?;
            }
            None => print_json(&coordinator.outline().await?)?,
        },

        Command::ReorderModules { module_ids, .. } => {
            let outcome = coordinator.reorder_modules(&course_id, module_ids).await?;
            report_reorder(outcome);
            print_json(&coordinator.outline().await?.module_ids())?;
        }

        Command::ReorderLessons {
            module_id,
            lesson_ids,
            ..
        } => {
            let outcome = coordinator.reorder_lessons(&module_id, lesson_ids).await?;
            report_reorder(outcome);
            print_json(&coordinator.outline().await?.lesson_ids(&module_id))?;
        }

        Command::CompleteLesson { lesson_id, user, .. } => {
            let record = coordinator.complete_lesson(&user, &lesson_id).await?;
            print_json(&record)?;
        }

        Command::SubmitQuiz {
            module_id,
            user,
            answers,
            ..
        } => {
            let answers = read_answers(answers.as_deref())?;
            let outcome = coordinator.submit_quiz(&user, &module_id, &answers).await?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}

fn report_reorder(outcome: ReorderOutcome) {
    match outcome {
        ReorderOutcome::Confirmed => info!("Reorder confirmed"),
        ReorderOutcome::Superseded => warn!("Reorder superseded by a newer one"),
    }
}

fn read_answers(path: Option<&std::path::Path>) -> anyhow::Result<Vec<QuizAnswer>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading answers from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing answers in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
