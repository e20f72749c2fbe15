use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use grader::worker::{self, GradeJob, JobQueue};
use grader::{GraderConfig, Judger, LanguageTable};

#[derive(Parser)]
#[command(name = "grader", version, about = "Multi-language execution and grading harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade one job file and print the report as JSON
    Run {
        /// Path to a grading job (JSON)
        job: PathBuf,
    },
    /// Consume grading jobs from the Redis queue
    Worker,
    /// List configured languages and their commands
    Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grader=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = GraderConfig::from_env();

    let languages = Arc::new(LanguageTable::load(config.languages_config.as_deref())?);
    match &config.languages_config {
        Some(path) => info!("Loaded language configurations from {}", path.display()),
        None => info!("Using builtin language configurations"),
    }

    match cli.command {
        Command::Run { job } => {
            let content = std::fs::read_to_string(&job)
                .with_context(|| format!("Failed to read job file {}", job.display()))?;
            let job: GradeJob = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse job file {}", job.display()))?;

            let judger = Judger::from_config(&config, languages)?;
            let report = worker::grade_job(&judger, job).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Worker => {
            info!("Starting grader worker...");
            let judger = Judger::from_config(&config, languages)?;
            let mut queue = JobQueue::connect(&config.redis_url).await?;
            worker::run_worker(&judger, &mut queue).await?;
        }
        Command::Languages => {
            for language in languages.languages() {
                let Some(lang) = languages.get(language) else {
                    continue;
                };
                let compile = lang
                    .compile_command
                    .as_ref()
                    .map(|cmd| cmd.join(" "))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<12} .{:<6} compile: {:<48} run: {}",
                    language,
                    lang.extension,
                    compile,
                    lang.run_command.join(" ")
                );
            }
        }
    }

    Ok(())
}
