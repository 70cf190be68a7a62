//! Persistent records shared by the store, the dispatcher and the CLI.

use crate::types::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Category name → averaged value.
pub type CategoryMap = BTreeMap<String, f64>;

/// Lifecycle of an evaluation run.
///
/// The discriminants are the persisted codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationStatus {
    Created = 0,
    Started = 10,
    Completed = 20,
    Failed = 30,
}

impl EvaluationStatus {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Created),
            10 => Some(Self::Started),
            20 => Some(Self::Completed),
            30 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationStatus {
    Created = 0,
    Started = 10,
    Completed = 20,
    Failed = 30,
    Aborted = 40,
}

impl GenerationStatus {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Created),
            10 => Some(Self::Started),
            20 => Some(Self::Completed),
            30 => Some(Self::Failed),
            40 => Some(Self::Aborted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bench {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub bench_id: i64,
    pub question_number: u32,
    pub category: String,
    pub turns: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub eval_aspects: Vec<String>,
}

impl Question {
    pub fn first_correct_answer(&self) -> Option<&str> {
        self.correct_answers.first().map(String::as_str)
    }

    pub fn first_eval_aspect(&self) -> Option<&str> {
        self.eval_aspects.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub model_name: String,
    pub description: Option<String>,
    pub status: GenerationStatus,
    pub bench: Bench,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub generation_task_id: i64,
    pub question_id: i64,
    pub turn_number: u32,
    pub text: String,
    /// Messages sent to the generating model, used by tool-call benches.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Seconds spent generating this answer.
    pub processing_time: f64,
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub usage: Value,
}

/// An answer joined with the question it responds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerWithQuestion {
    pub answer: Answer,
    pub question: Question,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTask {
    pub id: i64,
    pub user_id: String,
    pub generation_task_id: i64,
    pub name: String,
    pub plot_name: String,
    pub active: bool,
    pub points: CategoryMap,
    pub processing_times: CategoryMap,
    pub status: EvaluationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvaluationTask {
    pub generation_task_id: i64,
    pub name: String,
    pub status: EvaluationStatus,
}

impl NewEvaluationTask {
    /// Plot group name: the part of `name` before the first `@`.
    pub fn plot_name(&self) -> String {
        plot_name(&self.name)
    }
}

pub fn plot_name(name: &str) -> String {
    name.split('@').next().unwrap_or_default().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: i64,
    pub user_id: String,
    pub evaluation_task_id: i64,
    /// Answer whose question category the rate is aggregated under.
    pub answer_id: i64,
    pub point: i64,
    pub text: String,
    pub usage: Value,
    pub finish_reason: String,
    pub processing_time: f64,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRate {
    pub evaluation_task_id: i64,
    pub answer_id: i64,
    pub point: i64,
    pub text: String,
    pub usage: Value,
    pub finish_reason: String,
    pub processing_time: f64,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateAnswer {
    pub id: i64,
    pub rate_id: i64,
    pub answer_id: i64,
}

/// A rate with every answer it was joined to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateWithAnswers {
    pub rate: Rate,
    pub answers: Vec<Answer>,
}

/// One row feeding category aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRate {
    pub category: String,
    pub point: i64,
    pub processing_time: f64,
}
