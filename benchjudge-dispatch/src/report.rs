//! Run summaries
//!
//! Structures for presenting a finished evaluation to an operator.

use benchjudge_core::{CategoryMap, EvaluationStatus, EvaluationTask, Rate};
use serde::{Deserialize, Serialize};

/// Summary of one evaluation task and its rates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub evaluation_id: i64,
    pub name: String,
    pub plot_name: String,
    pub status: EvaluationStatus,
    /// Number of rates written
    pub total_rates: usize,
    /// Rates with a non-zero point
    pub scored_rates: usize,
    /// Mean of the non-zero points, if any
    pub mean_point: Option<f64>,
    pub points: CategoryMap,
    pub processing_times: CategoryMap,
}

impl RunSummary {
    pub fn new(task: &EvaluationTask, rates: &[Rate]) -> Self {
        let scored: Vec<i64> = rates.iter().map(|r| r.point).filter(|p| *p != 0).collect();
        let mean_point = (!scored.is_empty())
            .then(|| scored.iter().sum::<i64>() as f64 / scored.len() as f64);

        Self {
            evaluation_id: task.id,
            name: task.name.clone(),
            plot_name: task.plot_name.clone(),
            status: task.status,
            total_rates: rates.len(),
            scored_rates: scored.len(),
            mean_point,
            points: task.points.clone(),
            processing_times: task.processing_times.clone(),
        }
    }

    /// Format as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Evaluation {}: {}\n", self.evaluation_id, self.name));
        output.push_str(&format!("  Plot name: {}\n", self.plot_name));
        output.push_str(&format!("  Status: {:?}\n", self.status));
        output.push_str(&format!("  Rates: {} ({} scored)\n", self.total_rates, self.scored_rates));
        if let Some(mean) = self.mean_point {
            output.push_str(&format!("  Mean point: {:.2}\n", mean));
        }

        if !self.points.is_empty() {
            output.push_str("\nCategory averages:\n");
            for (category, point) in &self.points {
                let time = self.processing_times.get(category).copied().unwrap_or_default();
                output.push_str(&format!("  {}: {:.2} ({:.1}s)\n", category, point, time));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn task() -> EvaluationTask {
        EvaluationTask {
            id: 3,
            user_id: "alice".to_string(),
            generation_task_id: 1,
            name: "gpt-4o@judge".to_string(),
            plot_name: "gpt-4o".to_string(),
            active: true,
            points: CategoryMap::from([("math".to_string(), 4.0)]),
            processing_times: CategoryMap::from([("math".to_string(), 2.5)]),
            status: EvaluationStatus::Completed,
            created_at: Utc::now(),
        }
    }

    fn rate(point: i64) -> Rate {
        Rate {
            id: point,
            user_id: "alice".to_string(),
            evaluation_task_id: 3,
            answer_id: 1,
            point,
            text: String::new(),
            usage: json!({}),
            finish_reason: "stop".to_string(),
            processing_time: 0.0,
            model: "gpt-4o".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary::new(&task(), &[rate(0), rate(3), rate(5)]);
        assert_eq!(summary.total_rates, 3);
        assert_eq!(summary.scored_rates, 2);
        assert_eq!(summary.mean_point, Some(4.0));
    }

    #[test]
    fn test_format_summary() {
        let text = RunSummary::new(&task(), &[rate(4)]).format_summary();
        assert!(text.contains("Evaluation 3: gpt-4o@judge"));
        assert!(text.contains("Status: Completed"));
        assert!(text.contains("math: 4.00 (2.5s)"));
    }

    #[test]
    fn test_no_scored_rates() {
        let summary = RunSummary::new(&task(), &[rate(0)]);
        assert_eq!(summary.mean_point, None);
        assert!(!summary.format_summary().contains("Mean point"));
    }
}
