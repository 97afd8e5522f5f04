use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub a YouTube video into another language
    Dub {
        /// YouTube URL or 11-character video id
        video: String,

        /// Target language name (e.g. spanish, japanese, "chinese traditional")
        #[arg(short, long, default_value = "spanish")]
        target_language: String,

        /// Print the job report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show whether a job has finished
    Status {
        /// Job id printed by `dub`
        job_id: String,
    },

    /// Check whether a video has a usable transcript
    Check {
        /// YouTube URL or 11-character video id
        video: String,
    },

    /// List all jobs in the jobs directory
    Jobs,

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check external tools and credentials
    Doctor,
}
