#![allow(dead_code)]

use async_trait::async_trait;
use benchjudge_core::{
    Answer, AnswerWithQuestion, Bench, BenchError, ChatClient, EvaluationTask, GenerationStatus,
    GenerationTask, NewEvaluationTask, NewRate, Question, Rate, RateAnswer, RateWithAnswers,
    RequestContext, Result, ScoredRate,
};
use benchjudge_dispatch::{DispatchConfig, Dispatcher};
use benchjudge_model::MockChatClient;
use benchjudge_store::{
    EvalStore, InMemoryEvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion,
};
use serde_json::json;
use std::sync::Arc;

pub const TEMPLATE: &str = "質問: {question}\n回答: {answer}\n正解: {correct_answer}";

pub struct Fixture {
    pub store: Arc<InMemoryEvalStore>,
    pub ctx: RequestContext,
    pub generation_task_id: i64,
    pub question_ids: Vec<i64>,
    pub answer_ids: Vec<i64>,
}

pub struct SeedAnswer<'a> {
    pub category: &'a str,
    pub text: &'a str,
    pub correct_answer: Option<&'a str>,
    pub processing_time: f64,
    /// Adds a turn-2 answer with this text.
    pub second_turn: Option<&'a str>,
}

impl<'a> SeedAnswer<'a> {
    pub fn new(category: &'a str, text: &'a str) -> Self {
        Self { category, text, correct_answer: None, processing_time: 1.0, second_turn: None }
    }

    pub fn expecting(mut self, correct_answer: &'a str) -> Self {
        self.correct_answer = Some(correct_answer);
        self
    }

    pub fn taking(mut self, processing_time: f64) -> Self {
        self.processing_time = processing_time;
        self
    }

    pub fn with_second_turn(mut self, text: &'a str) -> Self {
        self.second_turn = Some(text);
        self
    }
}

pub async fn fixture(code: &str, template: &str, answers: Vec<SeedAnswer<'_>>) -> Fixture {
    fixture_with_status(code, template, answers, GenerationStatus::Completed).await
}

pub async fn fixture_with_status(
    code: &str,
    template: &str,
    answers: Vec<SeedAnswer<'_>>,
    status: GenerationStatus,
) -> Fixture {
    let store = Arc::new(InMemoryEvalStore::new());
    let ctx = RequestContext::new("alice");

    let bench = store
        .create_bench(NewBench {
            code: code.to_string(),
            name: format!("{code} bench"),
            template: template.to_string(),
        })
        .await
        .unwrap();
    let generation = store
        .create_generation_task(
            &ctx,
            NewGenerationTask {
                bench_id: bench.id,
                name: "candidate".to_string(),
                model_name: "llm-jp-13b".to_string(),
                description: None,
                status,
            },
        )
        .await
        .unwrap();

    let mut question_ids = Vec::new();
    let mut answer_ids = Vec::new();
    for (index, seed) in answers.iter().enumerate() {
        let number = index as u32 + 1;
        let question = store
            .create_question(NewQuestion {
                bench_id: bench.id,
                question_number: number,
                category: seed.category.to_string(),
                turns: vec![format!("question {number}"), format!("follow-up {number}")],
                correct_answers: seed.correct_answer.map(str::to_string).into_iter().collect(),
                eval_aspects: vec![],
            })
            .await
            .unwrap();
        question_ids.push(question.id);

        let turns = std::iter::once(seed.text).chain(seed.second_turn);
        for (turn, text) in turns.enumerate() {
            let answer = store
                .create_answer(NewAnswer {
                    generation_task_id: generation.id,
                    question_id: question.id,
                    turn_number: turn as u32 + 1,
                    text: text.to_string(),
                    messages: vec![],
                    processing_time: seed.processing_time,
                    finish_reason: Some("stop".to_string()),
                    usage: json!({}),
                })
                .await
                .unwrap();
            answer_ids.push(answer.id);
        }
    }

    Fixture { store, ctx, generation_task_id: generation.id, question_ids, answer_ids }
}

/// `count` single-turn answers in category `general`.
pub async fn plain_fixture(count: usize) -> Fixture {
    let answers = (0..count).map(|_| SeedAnswer::new("general", "an answer")).collect();
    fixture("elyza", TEMPLATE, answers).await
}

pub fn dispatcher(fixture: &Fixture, client: &Arc<MockChatClient>) -> Dispatcher {
    let store: Arc<dyn EvalStore> = fixture.store.clone();
    let client: Arc<dyn ChatClient> = client.clone();
    Dispatcher::new(store, client)
        .with_config(DispatchConfig::default())
        .with_credential_lookup(|var| Some(format!("key-for-{var}")))
}

/// Store that rejects every evaluation task update and delegates the rest.
pub struct ReadOnlyTaskStore(pub Arc<InMemoryEvalStore>);

#[async_trait]
impl EvalStore for ReadOnlyTaskStore {
    async fn get_generation_task(&self, ctx: &RequestContext, id: i64) -> Result<GenerationTask> {
        self.0.get_generation_task(ctx, id).await
    }

    async fn list_answers(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        turn: Option<u32>,
    ) -> Result<Vec<AnswerWithQuestion>> {
        self.0.list_answers(ctx, generation_task_id, turn).await
    }

    async fn find_answer(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        question_id: i64,
        turn_number: u32,
    ) -> Result<Option<Answer>> {
        self.0.find_answer(ctx, generation_task_id, question_id, turn_number).await
    }

    async fn create_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: NewEvaluationTask,
    ) -> Result<EvaluationTask> {
        self.0.create_evaluation_task(ctx, task).await
    }

    async fn save_evaluation_task(
        &self,
        _ctx: &RequestContext,
        task: &EvaluationTask,
    ) -> Result<()> {
        Err(BenchError::Store(format!("evaluation task {} is read-only", task.id)))
    }

    async fn get_evaluation_task(&self, ctx: &RequestContext, id: i64) -> Result<EvaluationTask> {
        self.0.get_evaluation_task(ctx, id).await
    }

    async fn list_evaluation_tasks(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
    ) -> Result<Vec<EvaluationTask>> {
        self.0.list_evaluation_tasks(ctx, generation_task_id).await
    }

    async fn create_rate(&self, ctx: &RequestContext, rate: NewRate) -> Result<Rate> {
        self.0.create_rate(ctx, rate).await
    }

    async fn create_rate_answer(
        &self,
        ctx: &RequestContext,
        rate_id: i64,
        answer_id: i64,
    ) -> Result<RateAnswer> {
        self.0.create_rate_answer(ctx, rate_id, answer_id).await
    }

    async fn list_rates(&self, ctx: &RequestContext, evaluation_task_id: i64) -> Result<Vec<Rate>> {
        self.0.list_rates(ctx, evaluation_task_id).await
    }

    async fn rates_for_question(
        &self,
        ctx: &RequestContext,
        question_id: i64,
    ) -> Result<Vec<RateWithAnswers>> {
        self.0.rates_for_question(ctx, question_id).await
    }

    async fn scored_rates(
        &self,
        ctx: &RequestContext,
        evaluation_task_id: i64,
    ) -> Result<Vec<ScoredRate>> {
        self.0.scored_rates(ctx, evaluation_task_id).await
    }

    async fn create_bench(&self, bench: NewBench) -> Result<Bench> {
        self.0.create_bench(bench).await
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        self.0.create_question(question).await
    }

    async fn create_generation_task(
        &self,
        ctx: &RequestContext,
        task: NewGenerationTask,
    ) -> Result<GenerationTask> {
        self.0.create_generation_task(ctx, task).await
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        self.0.create_answer(answer).await
    }
}
