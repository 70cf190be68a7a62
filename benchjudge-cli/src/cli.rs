use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://benchjudge.db?mode=rwc";

#[derive(Parser, Debug)]
#[command(name = "benchjudge")]
#[command(author, version, about = "Score benchmark answers with an LLM judge", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database URL
    #[arg(long, global = true, env = "BENCHJUDGE_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database: String,

    /// User that owns the records being read or written
    #[arg(short, long, global = true, env = "BENCHJUDGE_USER", default_value = "local")]
    pub user: String,

    /// TOML file with dispatch and client settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a bench, its questions and a generation task's answers from JSON
    Import {
        /// Fixture file
        fixture: PathBuf,
    },

    /// Score every answer of a completed generation task
    Evaluate {
        /// Generation task to score
        generation_task_id: i64,

        /// Evaluation name; the part before '@' is the plot name
        #[arg(short, long)]
        name: String,

        /// Judge model identifier, e.g. gpt-4o or gemini/gemini-1.5-pro
        #[arg(short, long)]
        judge_model: String,

        /// Concurrent judge calls per window
        #[arg(short, long, default_value = "8")]
        workers: usize,

        /// Base URL overriding the provider default
        #[arg(long)]
        host: Option<String>,

        /// Aggregate category averages when the run completes
        #[arg(long)]
        aggregate: bool,
    },

    /// Recompute category averages of a completed evaluation
    Aggregate {
        evaluation_task_id: i64,
    },

    /// Print the summary of an evaluation
    Show {
        evaluation_task_id: i64,
    },

    /// List the rates of an evaluation, or every rate of one question
    #[command(group(ArgGroup::new("target").required(true).args(["evaluation_task_id", "question"])))]
    Rates {
        evaluation_task_id: Option<i64>,

        /// Question id to list rates for instead
        #[arg(short, long)]
        question: Option<i64>,
    },
}
