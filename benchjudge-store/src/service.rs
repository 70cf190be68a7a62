use async_trait::async_trait;
use benchjudge_core::{
    Answer, AnswerWithQuestion, Bench, ChatMessage, EvaluationTask, GenerationStatus,
    GenerationTask, NewEvaluationTask, NewRate, Question, Rate, RateAnswer, RateWithAnswers,
    RequestContext, Result, ScoredRate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBench {
    pub code: String,
    pub name: String,
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub bench_id: i64,
    pub question_number: u32,
    pub category: String,
    pub turns: Vec<String>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub eval_aspects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGenerationTask {
    pub bench_id: i64,
    pub name: String,
    pub model_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: GenerationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAnswer {
    pub generation_task_id: i64,
    pub question_id: i64,
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

/// Persistence boundary of an evaluation run.
///
/// Every read takes the caller's [`RequestContext`] and only sees records the
/// caller owns. Rates and rate-answers are append-only: there is no update or
/// delete for them.
#[async_trait]
pub trait EvalStore: Send + Sync {
    /// Owned generation task in any status, or `NotFound`.
    async fn get_generation_task(&self, ctx: &RequestContext, id: i64) -> Result<GenerationTask>;

    /// Answers of an owned generation task joined with their questions,
    /// ordered by answer id. `turn` restricts to one turn number.
    async fn list_answers(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        turn: Option<u32>,
    ) -> Result<Vec<AnswerWithQuestion>>;

    async fn find_answer(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        question_id: i64,
        turn_number: u32,
    ) -> Result<Option<Answer>>;

    async fn create_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: NewEvaluationTask,
    ) -> Result<EvaluationTask>;

    async fn save_evaluation_task(&self, ctx: &RequestContext, task: &EvaluationTask)
    -> Result<()>;

    async fn get_evaluation_task(&self, ctx: &RequestContext, id: i64) -> Result<EvaluationTask>;

    async fn list_evaluation_tasks(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
    ) -> Result<Vec<EvaluationTask>>;

    async fn create_rate(&self, ctx: &RequestContext, rate: NewRate) -> Result<Rate>;

    /// Fails with `Store` when `rate_id` does not name an existing rate.
    async fn create_rate_answer(
        &self,
        ctx: &RequestContext,
        rate_id: i64,
        answer_id: i64,
    ) -> Result<RateAnswer>;

    /// Rates of an evaluation task ordered by id.
    async fn list_rates(&self, ctx: &RequestContext, evaluation_task_id: i64) -> Result<Vec<Rate>>;

    /// Rates linked to any answer of `question_id`, each with all of its answers.
    async fn rates_for_question(
        &self,
        ctx: &RequestContext,
        question_id: i64,
    ) -> Result<Vec<RateWithAnswers>>;

    /// Non-zero rates of an evaluation task joined to the category of their
    /// primary answer's question.
    async fn scored_rates(
        &self,
        ctx: &RequestContext,
        evaluation_task_id: i64,
    ) -> Result<Vec<ScoredRate>>;

    async fn create_bench(&self, bench: NewBench) -> Result<Bench>;

    async fn create_question(&self, question: NewQuestion) -> Result<Question>;

    async fn create_generation_task(
        &self,
        ctx: &RequestContext,
        task: NewGenerationTask,
    ) -> Result<GenerationTask>;

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer>;
}
