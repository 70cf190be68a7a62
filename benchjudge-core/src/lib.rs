//! # benchjudge-core
//!
//! Core records, traits and types for LLM-judged benchmark evaluation.
//!
//! ## Overview
//!
//! This crate provides the shared vocabulary of the benchjudge workspace:
//!
//! - [`ChatClient`] - The trait every judge backend implements
//! - [`ChatRequest`] / [`ChatResponse`] - One chat-completion round trip
//! - [`EvaluationTask`], [`Rate`], [`RateAnswer`] - Records an evaluation run produces
//! - [`GenerationTask`], [`Answer`], [`Question`], [`Bench`] - Read-only inputs
//! - [`RequestContext`] - Explicit caller identity
//! - [`BenchError`] / [`Result`] - Unified error handling
//!
//! ## Chat clients
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait ChatClient: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;
//! }
//! ```

pub mod context;
pub mod error;
pub mod model;
pub mod records;
pub mod template;
pub mod types;

pub use context::RequestContext;
pub use error::{BenchError, Result};
pub use model::{
    ChatClient, ChatRequest, ChatResponse, RequestMetadata, SafetySetting, SamplingParams,
    TokenUsage,
};
pub use records::{
    Answer, AnswerWithQuestion, Bench, CategoryMap, EvaluationStatus, EvaluationTask,
    GenerationStatus, GenerationTask, NewEvaluationTask, NewRate, Question, Rate, RateAnswer,
    RateWithAnswers, ScoredRate, plot_name,
};
pub use template::render_template;
pub use types::{ChatMessage, Role};
