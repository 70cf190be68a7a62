//! # benchjudge-cli
//!
//! Operator commands for benchjudge: import fixtures, run an evaluation,
//! aggregate it and inspect the stored rates.
//!
//! ```bash
//! benchjudge import fixtures/elyza.json
//! OPENAI_API_KEY=... benchjudge evaluate 2 --name gpt-4o@v1 --judge-model gpt-4o --workers 8
//! benchjudge aggregate 5
//! benchjudge show 5
//! benchjudge rates 5
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod fixture;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use fixture::{Fixture, ImportSummary, import_fixture};
