//! JSON fixture import
//!
//! A fixture carries one bench, its questions and one generation task with
//! its answers. Answers refer to questions by `question_number`.
//!
//! ```json
//! {
//!   "bench": { "code": "elyza", "name": "ELYZA-tasks-100", "template": "..." },
//!   "questions": [
//!     { "question_number": 1, "category": "math", "turns": ["..."], "correct_answers": ["4"] }
//!   ],
//!   "generation_task": { "name": "llm-jp@v1", "model_name": "llm-jp-13b" },
//!   "answers": [
//!     { "question_number": 1, "turn_number": 1, "text": "4", "processing_time": 1.2 }
//!   ]
//! }
//! ```

use anyhow::{Context, Result, bail};
use benchjudge_core::{ChatMessage, GenerationStatus, RequestContext};
use benchjudge_store::{EvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub bench: NewBench,
    pub questions: Vec<FixtureQuestion>,
    pub generation_task: FixtureGenerationTask,
    pub answers: Vec<FixtureAnswer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureQuestion {
    pub question_number: u32,
    pub category: String,
    pub turns: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub eval_aspects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureGenerationTask {
    pub name: String,
    pub model_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "completed")]
    pub status: GenerationStatus,
}

fn completed() -> GenerationStatus {
    GenerationStatus::Completed
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureAnswer {
    pub question_number: u32,
    #[serde(default = "first_turn")]
    pub turn_number: u32,
    pub text: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub usage: Value,
}

fn first_turn() -> u32 {
    1
}

/// Ids assigned to an imported fixture.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bench_id: i64,
    pub generation_task_id: i64,
    pub questions: usize,
    pub answers: usize,
}

impl Fixture {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid fixture JSON")
    }
}

/// Write every record of `fixture`, owned by the caller where ownership applies.
///
/// Unknown question numbers are rejected before anything is written.
pub async fn import_fixture(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    fixture: Fixture,
) -> Result<ImportSummary> {
    for answer in &fixture.answers {
        if !fixture.questions.iter().any(|q| q.question_number == answer.question_number) {
            bail!("answer refers to unknown question {}", answer.question_number);
        }
    }

    let bench = store.create_bench(fixture.bench).await?;

    let mut question_ids = HashMap::new();
    for question in fixture.questions {
        let number = question.question_number;
        let created = store
            .create_question(NewQuestion {
                bench_id: bench.id,
                question_number: number,
                category: question.category,
                turns: question.turns,
                correct_answers: question.correct_answers,
                eval_aspects: question.eval_aspects,
            })
            .await?;
        question_ids.insert(number, created.id);
    }

    let generation = store
        .create_generation_task(
            ctx,
            NewGenerationTask {
                bench_id: bench.id,
                name: fixture.generation_task.name,
                model_name: fixture.generation_task.model_name,
                description: fixture.generation_task.description,
                status: fixture.generation_task.status,
            },
        )
        .await?;

    let answer_count = fixture.answers.len();
    for answer in fixture.answers {
        let question_id = *question_ids
            .get(&answer.question_number)
            .with_context(|| format!("unknown question {}", answer.question_number))?;
        store
            .create_answer(NewAnswer {
                generation_task_id: generation.id,
                question_id,
                turn_number: answer.turn_number,
                text: answer.text,
                messages: answer.messages,
                processing_time: answer.processing_time,
                finish_reason: answer.finish_reason,
                usage: answer.usage,
            })
            .await?;
    }

    tracing::info!(
        bench.id = bench.id,
        generation.id = generation.id,
        answers = answer_count,
        "fixture imported"
    );

    Ok(ImportSummary {
        bench_id: bench.id,
        generation_task_id: generation.id,
        questions: question_ids.len(),
        answers: answer_count,
    })
}
