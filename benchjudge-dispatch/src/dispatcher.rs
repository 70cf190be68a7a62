//! Batched scoring dispatcher
//!
//! Scores every answer of a completed generation task and records one Rate per
//! judge reply. Judge calls go out in windows of `worker_count` concurrent
//! jobs; a window is fully awaited before its results are persisted and the
//! next window is submitted.

use crate::bench::{JudgePrompt, PromptContext, ScoringMode};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::job::{JudgeJob, JudgeOutcome, run_judge_job_with_timeout};
use crate::scoring::{exact_match_point, extract_judge_point};
use benchjudge_core::{
    Answer, AnswerWithQuestion, ChatClient, ChatRequest, EvaluationStatus, EvaluationTask,
    GenerationStatus, GenerationTask, NewEvaluationTask, NewRate, RequestContext,
    RequestMetadata, SamplingParams,
};
use benchjudge_model::ProviderTag;
use benchjudge_store::EvalStore;
use benchjudge_telemetry::{evaluation_run_span, record_run_status, window_span};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;

type CredentialLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Parameters of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub generation_task_id: i64,
    /// Evaluation name; the part before the first `@` becomes the plot name.
    pub name: String,
    pub judge_model: String,
    pub worker_count: usize,
    /// Overrides the judge provider's base URL
    pub host: Option<String>,
}

impl EvaluationRequest {
    pub fn new(
        generation_task_id: i64,
        name: impl Into<String>,
        judge_model: impl Into<String>,
        worker_count: usize,
    ) -> Self {
        Self {
            generation_task_id,
            name: name.into(),
            judge_model: judge_model.into(),
            worker_count,
            host: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// Per-run values shared by every job of a judge-scored run.
struct JudgeRun<'a> {
    ctx: &'a RequestContext,
    generation: &'a GenerationTask,
    task: &'a EvaluationTask,
    request: &'a EvaluationRequest,
    prompt: JudgePrompt,
    session_id: String,
    api_key: Option<String>,
    params: SamplingParams,
}

pub struct Dispatcher {
    store: Arc<dyn EvalStore>,
    client: Arc<dyn ChatClient>,
    config: DispatchConfig,
    credentials: Arc<CredentialLookup>,
}

impl Dispatcher {
    /// Credentials are read from the process environment.
    pub fn new(store: Arc<dyn EvalStore>, client: Arc<dyn ChatClient>) -> Self {
        Self {
            store,
            client,
            config: DispatchConfig::default(),
            credentials: Arc::new(|var: &str| std::env::var(var).ok()),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the environment lookup used to resolve provider credentials.
    pub fn with_credential_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.credentials = Arc::new(lookup);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run one evaluation to a terminal status.
    ///
    /// Precondition failures (`worker_count == 0`, a generation task that is
    /// missing, foreign or not completed) are returned as errors before any
    /// record is written. Once the evaluation task exists, every failure ends
    /// the run as [`EvaluationStatus::Failed`] and the task is returned as `Ok`.
    /// That includes a failure to save the terminal status: it is logged and
    /// the task is still returned.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        request: EvaluationRequest,
    ) -> Result<EvaluationTask> {
        if request.worker_count == 0 {
            return Err(DispatchError::Config("worker_count must be at least 1".to_string()));
        }

        let generation = self.store.get_generation_task(ctx, request.generation_task_id).await?;
        if generation.status != GenerationStatus::Completed {
            return Err(DispatchError::NotFound(format!(
                "completed generation task {}",
                request.generation_task_id
            )));
        }

        let mut task = self
            .store
            .create_evaluation_task(
                ctx,
                NewEvaluationTask {
                    generation_task_id: generation.id,
                    name: request.name.clone(),
                    status: EvaluationStatus::Started,
                },
            )
            .await?;

        let span = evaluation_run_span(task.id, &request.judge_model, &generation.bench.code);
        let outcome = async {
            tracing::info!(
                evaluation.name = %task.name,
                worker_count = request.worker_count,
                "evaluation started"
            );
            match ScoringMode::for_bench(&generation.bench.code) {
                ScoringMode::ExactMatch => self.score_exact_match(ctx, &generation, &task).await,
                ScoringMode::Judge(prompt) => {
                    self.score_with_judge(ctx, &generation, &task, &request, prompt).await
                }
            }
        }
        .instrument(span.clone())
        .await;

        task.status = match outcome {
            Ok(()) => EvaluationStatus::Completed,
            Err(err) => {
                span.in_scope(|| tracing::error!(error = %err, "evaluation failed"));
                EvaluationStatus::Failed
            }
        };
        span.in_scope(|| {
            record_run_status(if task.status == EvaluationStatus::Completed {
                "completed"
            } else {
                "failed"
            })
        });

        if let Err(err) = self.store.save_evaluation_task(ctx, &task).await {
            tracing::error!(
                evaluation.id = task.id,
                status = ?task.status,
                error = %err,
                "failed to save final evaluation status"
            );
        }
        tracing::info!(evaluation.id = task.id, status = ?task.status, "evaluation finished");
        Ok(task)
    }

    async fn score_exact_match(
        &self,
        ctx: &RequestContext,
        generation: &GenerationTask,
        task: &EvaluationTask,
    ) -> Result<()> {
        let answers = self.store.list_answers(ctx, generation.id, None).await?;

        for AnswerWithQuestion { answer, question } in answers {
            let expected = question.first_correct_answer();
            let rate = self
                .store
                .create_rate(
                    ctx,
                    NewRate {
                        evaluation_task_id: task.id,
                        answer_id: answer.id,
                        point: exact_match_point(&answer.text, expected),
                        text: expected.unwrap_or_default().to_string(),
                        usage: json!({}),
                        finish_reason: "stop".to_string(),
                        processing_time: 0.0,
                        model: String::new(),
                    },
                )
                .await?;
            self.store.create_rate_answer(ctx, rate.id, answer.id).await?;
        }
        Ok(())
    }

    async fn score_with_judge(
        &self,
        ctx: &RequestContext,
        generation: &GenerationTask,
        task: &EvaluationTask,
        request: &EvaluationRequest,
        prompt: JudgePrompt,
    ) -> Result<()> {
        let model = request.judge_model.as_str();
        let policy = ProviderTag::from_model(model).policy();
        let run = JudgeRun {
            ctx,
            generation,
            task,
            request,
            prompt,
            session_id: format!("{}_{}", task.name.replace('/', "_"), task.id),
            api_key: policy.credential_with(|var| (self.credentials)(var)),
            params: SamplingParams {
                temperature: Some(self.config.temperature),
                max_tokens: Some(self.config.max_tokens),
                safety_settings: policy.safety_settings(),
            },
        };
        let cooldown = self.config.cooldown_for(model);
        let limit = self.config.job_timeout();

        let answers = self.store.list_answers(ctx, generation.id, Some(1)).await?;
        let window_count = answers.len().div_ceil(request.worker_count);
        tracing::info!(answers = answers.len(), windows = window_count, "judge scoring");

        for (index, window) in answers.chunks(request.worker_count).enumerate() {
            let mut jobs = Vec::with_capacity(window.len());
            for item in window {
                jobs.push(self.build_job(&run, item).await?);
            }

            let results = join_all(jobs.into_iter().map(|job| {
                let client = Arc::clone(&self.client);
                async move { run_judge_job_with_timeout(client.as_ref(), job, limit).await }
            }))
            .instrument(window_span(index, window.len()))
            .await;

            for result in results {
                self.persist(&run, result?).await?;
            }

            if index + 1 < window_count && !cooldown.is_zero() {
                tracing::debug!(cooldown = ?cooldown, "cooling down before next window");
                tokio::time::sleep(cooldown).await;
            }
        }
        Ok(())
    }

    async fn build_job(
        &self,
        run: &JudgeRun<'_>,
        item: &AnswerWithQuestion,
    ) -> Result<JudgeJob<Vec<Answer>>> {
        let AnswerWithQuestion { answer, question } = item;

        let second_answer = if run.prompt.needs_second_turn() {
            let found = self
                .store
                .find_answer(run.ctx, run.generation.id, question.id, 2)
                .await?
                .ok_or_else(|| {
                    DispatchError::NotFound(format!(
                        "turn 2 answer for question {}",
                        question.question_number
                    ))
                })?;
            Some(found)
        } else {
            None
        };

        let messages = run.prompt.render(&PromptContext {
            template: &run.generation.bench.template,
            question,
            answer,
            second_answer: second_answer.as_ref(),
        })?;

        let trace_id = format!("{}.{:03}", run.session_id, question.question_number);
        let chat_request = ChatRequest::new(&run.request.judge_model, messages)
            .with_host(run.request.host.clone())
            .with_api_key(run.api_key.clone())
            .with_metadata(RequestMetadata {
                session_id: run.session_id.clone(),
                trace_id: trace_id.clone(),
            })
            .with_params(run.params.clone());

        let mut context = vec![answer.clone()];
        context.extend(second_answer);
        Ok(JudgeJob { trace_id, request: chat_request, context })
    }

    async fn persist(&self, run: &JudgeRun<'_>, outcome: JudgeOutcome<Vec<Answer>>) -> Result<()> {
        let JudgeOutcome { response, processing_time, context } = outcome;
        let primary = context
            .first()
            .ok_or_else(|| DispatchError::Store("judge job without answers".to_string()))?;

        let usage = match &response.usage {
            Some(usage) => json!({
                "prompt_tokens": usage.prompt_tokens,
                "completion_tokens": usage.completion_tokens,
                "total_tokens": usage.total_tokens,
            }),
            None => json!({}),
        };

        let rate = self
            .store
            .create_rate(
                run.ctx,
                NewRate {
                    evaluation_task_id: run.task.id,
                    answer_id: primary.id,
                    point: extract_judge_point(&response.answer),
                    text: response.answer,
                    usage,
                    finish_reason: response.finish_reason.unwrap_or_default(),
                    processing_time,
                    model: run.request.judge_model.clone(),
                },
            )
            .await?;

        for answer in &context {
            self.store.create_rate_answer(run.ctx, rate.id, answer.id).await?;
        }
        Ok(())
    }
}
