use crate::{EvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion};
use async_trait::async_trait;
use benchjudge_core::{
    Answer, AnswerWithQuestion, Bench, BenchError, CategoryMap, EvaluationTask, GenerationTask,
    NewEvaluationTask, NewRate, Question, Rate, RateAnswer, RateWithAnswers, RequestContext,
    Result, ScoredRate,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
struct StoredGenerationTask {
    id: i64,
    user_id: String,
    bench_id: i64,
    name: String,
    model_name: String,
    description: Option<String>,
    status: benchjudge_core::GenerationStatus,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    benches: BTreeMap<i64, Bench>,
    questions: BTreeMap<i64, Question>,
    generation_tasks: BTreeMap<i64, StoredGenerationTask>,
    answers: BTreeMap<i64, Answer>,
    evaluation_tasks: BTreeMap<i64, EvaluationTask>,
    rates: BTreeMap<i64, Rate>,
    rate_answers: BTreeMap<i64, RateAnswer>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn generation_task(&self, ctx: &RequestContext, id: i64) -> Result<GenerationTask> {
        let stored = self
            .generation_tasks
            .get(&id)
            .filter(|t| t.user_id == ctx.user_id())
            .ok_or_else(|| BenchError::NotFound(format!("generation task {}", id)))?;
        let bench = self
            .benches
            .get(&stored.bench_id)
            .cloned()
            .ok_or_else(|| BenchError::Store(format!("bench {} missing", stored.bench_id)))?;

        Ok(GenerationTask {
            id: stored.id,
            user_id: stored.user_id.clone(),
            name: stored.name.clone(),
            model_name: stored.model_name.clone(),
            description: stored.description.clone(),
            status: stored.status,
            bench,
            created_at: stored.created_at,
        })
    }

    fn owned_evaluation_task(&self, ctx: &RequestContext, id: i64) -> Result<&EvaluationTask> {
        self.evaluation_tasks
            .get(&id)
            .filter(|t| t.user_id == ctx.user_id())
            .ok_or_else(|| BenchError::NotFound(format!("evaluation task {}", id)))
    }
}

/// Store kept entirely in process memory. Ids are allocated from one counter
/// shared by every table.
#[derive(Clone, Default)]
pub struct InMemoryEvalStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryEvalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|e| BenchError::Store(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|e| BenchError::Store(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl EvalStore for InMemoryEvalStore {
    async fn get_generation_task(&self, ctx: &RequestContext, id: i64) -> Result<GenerationTask> {
        self.read()?.generation_task(ctx, id)
    }

    async fn list_answers(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        turn: Option<u32>,
    ) -> Result<Vec<AnswerWithQuestion>> {
        let tables = self.read()?;
        tables.generation_task(ctx, generation_task_id)?;

        tables
            .answers
            .values()
            .filter(|a| a.generation_task_id == generation_task_id)
            .filter(|a| turn.is_none_or(|t| a.turn_number == t))
            .map(|answer| {
                let question = tables.questions.get(&answer.question_id).cloned().ok_or_else(
                    || BenchError::Store(format!("question {} missing", answer.question_id)),
                )?;
                Ok(AnswerWithQuestion { answer: answer.clone(), question })
            })
            .collect()
    }

    async fn find_answer(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        question_id: i64,
        turn_number: u32,
    ) -> Result<Option<Answer>> {
        let tables = self.read()?;
        tables.generation_task(ctx, generation_task_id)?;

        Ok(tables
            .answers
            .values()
            .find(|a| {
                a.generation_task_id == generation_task_id
                    && a.question_id == question_id
                    && a.turn_number == turn_number
            })
            .cloned())
    }

    async fn create_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: NewEvaluationTask,
    ) -> Result<EvaluationTask> {
        let mut tables = self.write()?;
        tables.generation_task(ctx, task.generation_task_id)?;

        let id = tables.allocate_id();
        let created = EvaluationTask {
            id,
            user_id: ctx.user_id().to_string(),
            generation_task_id: task.generation_task_id,
            plot_name: task.plot_name(),
            name: task.name,
            active: true,
            points: CategoryMap::new(),
            processing_times: CategoryMap::new(),
            status: task.status,
            created_at: Utc::now(),
        };
        tables.evaluation_tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn save_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: &EvaluationTask,
    ) -> Result<()> {
        let mut tables = self.write()?;
        tables.owned_evaluation_task(ctx, task.id)?;
        tables.evaluation_tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get_evaluation_task(&self, ctx: &RequestContext, id: i64) -> Result<EvaluationTask> {
        self.read()?.owned_evaluation_task(ctx, id).cloned()
    }

    async fn list_evaluation_tasks(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
    ) -> Result<Vec<EvaluationTask>> {
        Ok(self
            .read()?
            .evaluation_tasks
            .values()
            .filter(|t| t.user_id == ctx.user_id() && t.generation_task_id == generation_task_id)
            .cloned()
            .collect())
    }

    async fn create_rate(&self, ctx: &RequestContext, rate: NewRate) -> Result<Rate> {
        let mut tables = self.write()?;
        tables.owned_evaluation_task(ctx, rate.evaluation_task_id)?;

        let id = tables.allocate_id();
        let created = Rate {
            id,
            user_id: ctx.user_id().to_string(),
            evaluation_task_id: rate.evaluation_task_id,
            answer_id: rate.answer_id,
            point: rate.point,
            text: rate.text,
            usage: rate.usage,
            finish_reason: rate.finish_reason,
            processing_time: rate.processing_time,
            model: rate.model,
            created_at: Utc::now(),
        };
        tables.rates.insert(id, created.clone());
        Ok(created)
    }

    async fn create_rate_answer(
        &self,
        ctx: &RequestContext,
        rate_id: i64,
        answer_id: i64,
    ) -> Result<RateAnswer> {
        let mut tables = self.write()?;
        if !tables.rates.get(&rate_id).is_some_and(|r| r.user_id == ctx.user_id()) {
            return Err(BenchError::Store(format!("rate {} does not exist", rate_id)));
        }
        if !tables.answers.contains_key(&answer_id) {
            return Err(BenchError::Store(format!("answer {} does not exist", answer_id)));
        }

        let id = tables.allocate_id();
        let created = RateAnswer { id, rate_id, answer_id };
        tables.rate_answers.insert(id, created.clone());
        Ok(created)
    }

    async fn list_rates(&self, ctx: &RequestContext, evaluation_task_id: i64) -> Result<Vec<Rate>> {
        let tables = self.read()?;
        tables.owned_evaluation_task(ctx, evaluation_task_id)?;

        Ok(tables
            .rates
            .values()
            .filter(|r| r.evaluation_task_id == evaluation_task_id)
            .cloned()
            .collect())
    }

    async fn rates_for_question(
        &self,
        ctx: &RequestContext,
        question_id: i64,
    ) -> Result<Vec<RateWithAnswers>> {
        let tables = self.read()?;

        let answers_of = |rate_id: i64| -> Vec<Answer> {
            tables
                .rate_answers
                .values()
                .filter(|ra| ra.rate_id == rate_id)
                .filter_map(|ra| tables.answers.get(&ra.answer_id).cloned())
                .collect()
        };

        Ok(tables
            .rates
            .values()
            .filter(|r| r.user_id == ctx.user_id())
            .filter_map(|rate| {
                let answers = answers_of(rate.id);
                answers
                    .iter()
                    .any(|a| a.question_id == question_id)
                    .then(|| RateWithAnswers { rate: rate.clone(), answers })
            })
            .collect())
    }

    async fn scored_rates(
        &self,
        ctx: &RequestContext,
        evaluation_task_id: i64,
    ) -> Result<Vec<ScoredRate>> {
        let tables = self.read()?;
        tables.owned_evaluation_task(ctx, evaluation_task_id)?;

        Ok(tables
            .rates
            .values()
            .filter(|r| r.evaluation_task_id == evaluation_task_id && r.point != 0)
            .filter_map(|rate| {
                let answer = tables.answers.get(&rate.answer_id)?;
                let question = tables.questions.get(&answer.question_id)?;
                Some(ScoredRate {
                    category: question.category.clone(),
                    point: rate.point,
                    processing_time: answer.processing_time,
                })
            })
            .collect())
    }

    async fn create_bench(&self, bench: NewBench) -> Result<Bench> {
        let mut tables = self.write()?;
        let id = tables.allocate_id();
        let created = Bench { id, code: bench.code, name: bench.name, template: bench.template };
        tables.benches.insert(id, created.clone());
        Ok(created)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let mut tables = self.write()?;
        if !tables.benches.contains_key(&question.bench_id) {
            return Err(BenchError::Store(format!("bench {} does not exist", question.bench_id)));
        }
        let id = tables.allocate_id();
        let created = Question {
            id,
            bench_id: question.bench_id,
            question_number: question.question_number,
            category: question.category,
            turns: question.turns,
            correct_answers: question.correct_answers,
            eval_aspects: question.eval_aspects,
        };
        tables.questions.insert(id, created.clone());
        Ok(created)
    }

    async fn create_generation_task(
        &self,
        ctx: &RequestContext,
        task: NewGenerationTask,
    ) -> Result<GenerationTask> {
        let mut tables = self.write()?;
        if !tables.benches.contains_key(&task.bench_id) {
            return Err(BenchError::Store(format!("bench {} does not exist", task.bench_id)));
        }
        let id = tables.allocate_id();
        tables.generation_tasks.insert(
            id,
            StoredGenerationTask {
                id,
                user_id: ctx.user_id().to_string(),
                bench_id: task.bench_id,
                name: task.name,
                model_name: task.model_name,
                description: task.description,
                status: task.status,
                created_at: Utc::now(),
            },
        );
        tables.generation_task(ctx, id)
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        let mut tables = self.write()?;
        if !tables.generation_tasks.contains_key(&answer.generation_task_id) {
            return Err(BenchError::Store(format!(
                "generation task {} does not exist",
                answer.generation_task_id
            )));
        }
        if !tables.questions.contains_key(&answer.question_id) {
            return Err(BenchError::Store(format!(
                "question {} does not exist",
                answer.question_id
            )));
        }
        let id = tables.allocate_id();
        let created = Answer {
            id,
            generation_task_id: answer.generation_task_id,
            question_id: answer.question_id,
            turn_number: answer.turn_number,
            text: answer.text,
            messages: answer.messages,
            processing_time: answer.processing_time,
            finish_reason: answer.finish_reason,
            usage: answer.usage,
        };
        tables.answers.insert(id, created.clone());
        Ok(created)
    }
}
