//! Redub - Transcript-driven video dubbing
//!
//! Command-line entry point: loads and validates the configuration, installs
//! logging and dispatches to the dubbing pipeline.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use redub::cli::{Args, Commands};
use redub::config::Config;
use redub::error::DubError;
use redub::jobs::{JobStatus, JobStore};
use redub::workflow::{check_tools, DubbingPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Redub - Transcript-driven video dubbing");

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.resolve_credentials();
    config.validate()?;

    // Execute command
    match args.command {
        Commands::Dub { video, target_language, json } => {
            let mut pipeline = DubbingPipeline::new(config)?;
            if json {
                pipeline = pipeline.without_progress();
            }

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling job...");
                    ctrl_c.cancel();
                }
            });

            let report = match pipeline.run_dubbing_job(&video, &target_language, &cancel).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Dubbing failed: {}", e);
                    print_suggestions(&e);
                    return Err(e.into());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nDubbing completed");
                println!("Job id:             {}", report.job_id);
                println!("Output:             {}", display_path(&report.output_path));
                println!("Transcript segments: {}", report.transcript_segment_count);
                println!("Untranslated:       {}", report.translation_error_count);
                println!("Audio clips:        {}", report.clip_count);
                if !report.degradations.is_empty() {
                    println!("Degradations:");
                    for degradation in &report.degradations {
                        println!("  - {}", serde_json::to_string(degradation)?);
                    }
                }
            }
        }
        Commands::Status { job_id } => {
            let store = JobStore::new(&config.jobs.root);
            match store.status(&job_id)? {
                JobStatus::Processing => {
                    let failure = Uuid::parse_str(job_id.trim()).ok().and_then(|id| store.read_failure(&id).ok().flatten());
                    match failure {
                        Some(failure) => println!("{}: failed ({})", job_id, failure.error),
                        None => println!("{}: processing", job_id),
                    }
                }
                JobStatus::Completed { output_path } => {
                    println!("{}: completed -> {}", job_id, display_path(&output_path))
                }
            }
        }
        Commands::Check { video } => {
            let pipeline = DubbingPipeline::without_tool_check(config)?;
            let check = pipeline.check_transcript(&video).await;
            if check.available {
                println!("Transcript available");
                println!("Segments: {}", check.segment_count);
                println!("Duration: {}", format_duration(check.total_duration_secs as u64));
                println!("Preview:  {}", check.preview);
            } else {
                println!("Transcript unavailable: {}", check.error.unwrap_or_default());
            }
        }
        Commands::Jobs => {
            let store = JobStore::new(&config.jobs.root);
            let jobs = store.list()?;
            if jobs.is_empty() {
                println!("No jobs found in {}", display_path(store.root()));
            } else {
                println!("{:<38} {:<12} {:<13} {:<12} {:<10}", "Job", "Status", "Video", "Language", "Finished");
                println!("{}", "-".repeat(90));
                for job in jobs {
                    let status = match (&job.status, job.is_failed()) {
                        (JobStatus::Completed { .. }, _) => "completed",
                        (JobStatus::Processing, true) => "failed",
                        (JobStatus::Processing, false) => "processing",
                    };
                    let (video, language, finished) = match store.read_report(&job.id) {
                        Ok(Some(report)) => {
                            let ago = (Utc::now() - report.finished_at).num_seconds().max(0) as u64;
                            (report.video_id, report.target_language, format!("{} ago", format_duration(ago)))
                        }
                        Ok(None) => match &job.failure {
                            Some(failure) => {
                                let ago = (Utc::now() - failure.failed_at).num_seconds().max(0) as u64;
                                (failure.video_id.clone(), failure.target_language.clone(), format!("{} ago", format_duration(ago)))
                            }
                            None => ("-".to_string(), "-".to_string(), "-".to_string()),
                        },
                        Err(e) => {
                            warn!("Unreadable report for {}: {}", job.id, e);
                            ("?".to_string(), "?".to_string(), "?".to_string())
                        }
                    };
                    println!("{:<38} {:<12} {:<13} {:<12} {:<10}", job.id, status, video, language, finished);
                }
            }
        }
        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(anyhow::anyhow!(
                    "{} already exists; pass --force to overwrite", output.display()
                ));
            }
            Config::default().save_to_file(&output)?;
            println!("Default configuration written to {}", display_path(&output));
        }
        Commands::Doctor => {
            let statuses = check_tools(&config).await;
            println!("{:<24} {:<10} {}", "Tool", "Status", "Details");
            println!("{}", "-".repeat(80));
            for status in &statuses {
                let state = if status.available { "ok" } else { "missing" };
                println!("{:<24} {:<10} {}", status.name, state, status.detail);
            }
            if statuses.iter().any(|s| !s.available) {
                warn!("Some tools are unavailable; dubbing may fail or degrade");
            }
        }
    }

    Ok(())
}

fn print_suggestions(e: &DubError) {
    let suggestions = e.suggestions();
    if suggestions.is_empty() {
        return;
    }
    eprintln!("\nSuggestions:");
    for suggestion in suggestions {
        eprintln!("  - {}", suggestion);
    }
}

/// Path relative to the working directory when that is shorter
fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|relative| !relative.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let redub_dir = std::env::current_dir()?.join(".redub");
    let log_dir = redub_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "redub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("redub.log").display());

    Ok(())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}
