//! # benchjudge-dispatch
//!
//! Batched LLM-judge scoring of benchmark answers.
//!
//! ## Features
//!
//! - **Windows**: judge calls go out `worker_count` at a time, each bounded by a timeout
//! - **Cool-downs**: fixed per-provider pause between windows
//! - **Benchmark kinds**: exact match, single turn, few-shot rubric, multi turn, tool call
//! - **Aggregation**: per-category averages of non-zero points
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use benchjudge_dispatch::prelude::*;
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new(store.clone(), client);
//! let ctx = RequestContext::new("alice");
//!
//! let task = dispatcher
//!     .run(&ctx, EvaluationRequest::new(generation_task_id, "gpt-4o@v1", "gpt-4o", 8))
//!     .await?;
//! if task.status == EvaluationStatus::Completed {
//!     update_aggregates(store.as_ref(), &ctx, task.id).await?;
//! }
//! ```

pub mod aggregate;
pub mod bench;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod report;
pub mod scoring;

pub use aggregate::{average_by_category, update_aggregates};
pub use bench::{JUDGE_SYSTEM_PROMPT, JudgePrompt, PromptContext, ScoringMode};
pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, EvaluationRequest};
pub use error::{DispatchError, Result};
pub use job::{JudgeJob, JudgeOutcome, run_judge_job, run_judge_job_with_timeout};
pub use report::RunSummary;
pub use scoring::{exact_match_point, exact_match_value, extract_judge_point};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::aggregate::update_aggregates;
    pub use crate::config::DispatchConfig;
    pub use crate::dispatcher::{Dispatcher, EvaluationRequest};
    pub use crate::error::{DispatchError, Result};
    pub use crate::report::RunSummary;
    pub use benchjudge_core::{EvaluationStatus, EvaluationTask, RequestContext};
}
