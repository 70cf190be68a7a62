//! Span helpers for evaluation runs
//!
//! One run span wraps the whole dispatch; window and judge-call spans nest
//! inside it.

use tracing::Span;

/// Create a span for one evaluation run
///
/// # Example
/// ```
/// use benchjudge_telemetry::evaluation_run_span;
/// let span = evaluation_run_span(42, "gpt-4o", "tengu");
/// let _enter = span.enter();
/// ```
pub fn evaluation_run_span(evaluation_id: i64, judge_model: &str, bench_code: &str) -> Span {
    tracing::info_span!(
        "evaluation.run",
        evaluation.id = evaluation_id,
        judge.model = judge_model,
        bench.code = bench_code,
        status = tracing::field::Empty,
    )
}

/// Create a span for one window of concurrent judge calls
pub fn window_span(index: usize, size: usize) -> Span {
    tracing::info_span!("evaluation.window", window.index = index, window.size = size)
}

/// Create a span for a single judge call
///
/// # Example
/// ```
/// use benchjudge_telemetry::judge_call_span;
/// let span = judge_call_span("gpt-4o", "run_7.003");
/// let _enter = span.enter();
/// ```
pub fn judge_call_span(judge_model: &str, trace_id: &str) -> Span {
    tracing::debug_span!("judge.call", judge.model = judge_model, trace.id = trace_id)
}

/// Record the final status on the current run span
pub fn record_run_status(status: &str) {
    Span::current().record("status", status);
}
