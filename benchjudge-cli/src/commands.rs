//! Command handlers. Each returns the text printed to stdout.

use crate::fixture::{Fixture, import_fixture};
use anyhow::{Context, Result};
use benchjudge_core::{EvaluationStatus, Rate, RequestContext};
use benchjudge_dispatch::{Dispatcher, EvaluationRequest, RunSummary, update_aggregates};
use benchjudge_store::EvalStore;
use std::path::Path;

pub async fn import(store: &dyn EvalStore, ctx: &RequestContext, path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let summary = import_fixture(store, ctx, Fixture::from_json(&raw)?).await?;
    Ok(format!(
        "Imported bench {} with {} questions\nGeneration task {}: {} answers\n",
        summary.bench_id, summary.questions, summary.generation_task_id, summary.answers
    ))
}

/// Run one evaluation and optionally aggregate it.
///
/// A run that ends Failed is reported, not returned as an error.
pub async fn evaluate(
    dispatcher: &Dispatcher,
    store: &dyn EvalStore,
    ctx: &RequestContext,
    request: EvaluationRequest,
    aggregate: bool,
) -> Result<String> {
    let mut task = dispatcher.run(ctx, request).await?;
    if aggregate && task.status == EvaluationStatus::Completed {
        task = update_aggregates(store, ctx, task.id).await?;
    }
    let rates = store.list_rates(ctx, task.id).await?;
    Ok(RunSummary::new(&task, &rates).format_summary())
}

pub async fn aggregate(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    evaluation_task_id: i64,
) -> Result<String> {
    let task = update_aggregates(store, ctx, evaluation_task_id).await?;
    let rates = store.list_rates(ctx, task.id).await?;
    Ok(RunSummary::new(&task, &rates).format_summary())
}

pub async fn show(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    evaluation_task_id: i64,
) -> Result<String> {
    let task = store.get_evaluation_task(ctx, evaluation_task_id).await?;
    let rates = store.list_rates(ctx, task.id).await?;
    Ok(RunSummary::new(&task, &rates).format_summary())
}

pub async fn rates_of_evaluation(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    evaluation_task_id: i64,
) -> Result<String> {
    let rates = store.list_rates(ctx, evaluation_task_id).await?;
    Ok(rates.iter().map(format_rate).collect())
}

pub async fn rates_of_question(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    question_id: i64,
) -> Result<String> {
    let mut output = String::new();
    for linked in store.rates_for_question(ctx, question_id).await? {
        output.push_str(&format_rate(&linked.rate));
        let answer_ids: Vec<String> = linked.answers.iter().map(|a| a.id.to_string()).collect();
        output.push_str(&format!("    answers: {}\n", answer_ids.join(", ")));
    }
    Ok(output)
}

fn format_rate(rate: &Rate) -> String {
    let model = if rate.model.is_empty() { "exact-match" } else { rate.model.as_str() };
    format!(
        "rate {} answer {} point {} ({}, {:.2}s)\n",
        rate.id, rate.answer_id, rate.point, model, rate.processing_time
    )
}
