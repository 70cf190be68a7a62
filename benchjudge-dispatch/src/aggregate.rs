//! Per-category aggregation of a finished evaluation

use crate::error::{DispatchError, Result};
use benchjudge_core::{CategoryMap, EvaluationStatus, EvaluationTask, RequestContext, ScoredRate};
use benchjudge_store::EvalStore;
use std::collections::BTreeMap;

/// Mean point and mean answer processing time per category.
///
/// Rows with point 0 are skipped: a zero means the judge gave no usable score.
pub fn average_by_category(rows: &[ScoredRate]) -> (CategoryMap, CategoryMap) {
    let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.point != 0) {
        let entry = sums.entry(row.category.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += row.point as f64;
        entry.1 += row.processing_time;
        entry.2 += 1;
    }

    let mut points = CategoryMap::new();
    let mut processing_times = CategoryMap::new();
    for (category, (point_sum, time_sum, count)) in sums {
        let count = count as f64;
        points.insert(category.to_string(), point_sum / count);
        processing_times.insert(category.to_string(), time_sum / count);
    }
    (points, processing_times)
}

/// Recompute and store the category maps of a completed evaluation task.
pub async fn update_aggregates(
    store: &dyn EvalStore,
    ctx: &RequestContext,
    evaluation_task_id: i64,
) -> Result<EvaluationTask> {
    let mut task = store.get_evaluation_task(ctx, evaluation_task_id).await?;
    if task.status != EvaluationStatus::Completed {
        return Err(DispatchError::NotFound(format!(
            "completed evaluation task {}",
            evaluation_task_id
        )));
    }

    let rows = store.scored_rates(ctx, evaluation_task_id).await?;
    let (points, processing_times) = average_by_category(&rows);
    tracing::info!(
        evaluation.id = evaluation_task_id,
        scored = rows.len(),
        categories = points.len(),
        "aggregates updated"
    );

    task.points = points;
    task.processing_times = processing_times;
    store.save_evaluation_task(ctx, &task).await?;
    Ok(task)
}
