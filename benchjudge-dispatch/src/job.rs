//! A single judge call with its caller context.

use crate::error::{DispatchError, Result};
use benchjudge_core::{ChatClient, ChatRequest, ChatResponse};
use benchjudge_telemetry::judge_call_span;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// One prepared judge call. `context` travels with the call untouched and is
/// handed back with the response.
#[derive(Debug, Clone)]
pub struct JudgeJob<C> {
    pub trace_id: String,
    pub request: ChatRequest,
    pub context: C,
}

#[derive(Debug, Clone)]
pub struct JudgeOutcome<C> {
    pub response: ChatResponse,
    /// Wall-clock seconds spent in the call
    pub processing_time: f64,
    pub context: C,
}

/// Send the request and time it.
pub async fn run_judge_job<C>(client: &dyn ChatClient, job: JudgeJob<C>) -> Result<JudgeOutcome<C>> {
    let JudgeJob { trace_id, request, context } = job;
    let span = judge_call_span(&request.model, &trace_id);

    let started = Instant::now();
    let response = client.chat(request).instrument(span).await.map_err(DispatchError::from)?;
    let processing_time = started.elapsed().as_secs_f64();

    tracing::debug!(trace_id = %trace_id, processing_time, "judge call finished");
    Ok(JudgeOutcome { response, processing_time, context })
}

/// [`run_judge_job`] bounded by `limit`. Expiry becomes [`DispatchError::Timeout`].
pub async fn run_judge_job_with_timeout<C>(
    client: &dyn ChatClient,
    job: JudgeJob<C>,
    limit: Duration,
) -> Result<JudgeOutcome<C>> {
    let trace_id = job.trace_id.clone();
    match tokio::time::timeout(limit, run_judge_job(client, job)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(trace_id = %trace_id, after = ?limit, "judge call timed out");
            Err(DispatchError::Timeout { trace_id, after: limit })
        }
    }
}
