//! Behaviour shared by every `EvalStore` implementation.

#![allow(dead_code)]

use benchjudge_core::{
    BenchError, EvaluationStatus, GenerationStatus, NewEvaluationTask, NewRate, RequestContext,
};
use benchjudge_store::{EvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion};
use serde_json::json;

pub struct Seeded {
    pub generation_task_id: i64,
    pub question_ids: Vec<i64>,
    pub answer_ids: Vec<i64>,
}

/// One bench with two questions; each question has a turn-1 and a turn-2 answer.
pub async fn seed(store: &dyn EvalStore, ctx: &RequestContext) -> Seeded {
    let bench = store
        .create_bench(NewBench {
            code: "jmt-multi".to_string(),
            name: "Japanese MT-Bench".to_string(),
            template: "{question_1} {answer_1}".to_string(),
        })
        .await
        .unwrap();

    let task = store
        .create_generation_task(
            ctx,
            NewGenerationTask {
                bench_id: bench.id,
                name: "gpt-4o run".to_string(),
                model_name: "gpt-4o".to_string(),
                description: None,
                status: GenerationStatus::Completed,
            },
        )
        .await
        .unwrap();

    let mut question_ids = Vec::new();
    let mut answer_ids = Vec::new();
    for (number, category) in [(1, "writing"), (2, "math")] {
        let question = store
            .create_question(NewQuestion {
                bench_id: bench.id,
                question_number: number,
                category: category.to_string(),
                turns: vec![format!("q{number} turn 1"), format!("q{number} turn 2")],
                correct_answers: vec![],
                eval_aspects: vec![],
            })
            .await
            .unwrap();
        question_ids.push(question.id);

        for turn in [1, 2] {
            let answer = store
                .create_answer(NewAnswer {
                    generation_task_id: task.id,
                    question_id: question.id,
                    turn_number: turn,
                    text: format!("answer {number}.{turn}"),
                    messages: vec![],
                    processing_time: f64::from(number) * 10.0,
                    finish_reason: Some("stop".to_string()),
                    usage: json!({"total_tokens": 12}),
                })
                .await
                .unwrap();
            answer_ids.push(answer.id);
        }
    }

    Seeded { generation_task_id: task.id, question_ids, answer_ids }
}

fn new_rate(evaluation_task_id: i64, answer_id: i64, point: i64) -> NewRate {
    NewRate {
        evaluation_task_id,
        answer_id,
        point,
        text: format!("[[{point}]]"),
        usage: json!({}),
        finish_reason: "stop".to_string(),
        processing_time: 0.5,
        model: "gpt-4o".to_string(),
    }
}

pub async fn generation_task_is_scoped_to_owner(store: &dyn EvalStore) {
    let owner = RequestContext::new("alice");
    let seeded = seed(store, &owner).await;

    let task = store.get_generation_task(&owner, seeded.generation_task_id).await.unwrap();
    assert_eq!(task.bench.code, "jmt-multi");
    assert_eq!(task.status, GenerationStatus::Completed);

    let other = RequestContext::new("mallory");
    let err = store.get_generation_task(&other, seeded.generation_task_id).await.unwrap_err();
    assert!(matches!(err, BenchError::NotFound(_)));
}

pub async fn list_answers_filters_turn_and_orders_by_id(store: &dyn EvalStore) {
    let ctx = RequestContext::new("alice");
    let seeded = seed(store, &ctx).await;

    let all = store.list_answers(&ctx, seeded.generation_task_id, None).await.unwrap();
    assert_eq!(all.len(), 4);
    let ids: Vec<_> = all.iter().map(|a| a.answer.id).collect();
    assert_eq!(ids, seeded.answer_ids);

    let first_turns = store.list_answers(&ctx, seeded.generation_task_id, Some(1)).await.unwrap();
    assert_eq!(first_turns.len(), 2);
    assert!(first_turns.iter().all(|a| a.answer.turn_number == 1));
    assert_eq!(first_turns[1].question.category, "math");
    assert_eq!(first_turns[0].question.turns.len(), 2);
    assert_eq!(first_turns[0].answer.usage["total_tokens"], 12);
}

pub async fn find_answer_by_turn(store: &dyn EvalStore) {
    let ctx = RequestContext::new("alice");
    let seeded = seed(store, &ctx).await;

    let found = store
        .find_answer(&ctx, seeded.generation_task_id, seeded.question_ids[0], 2)
        .await
        .unwrap()
        .expect("turn 2 answer exists");
    assert_eq!(found.text, "answer 1.2");

    let missing =
        store.find_answer(&ctx, seeded.generation_task_id, seeded.question_ids[0], 3).await.unwrap();
    assert!(missing.is_none());
}

pub async fn evaluation_task_lifecycle(store: &dyn EvalStore) {
    let ctx = RequestContext::new("alice");
    let seeded = seed(store, &ctx).await;

    let mut task = store
        .create_evaluation_task(
            &ctx,
            NewEvaluationTask {
                generation_task_id: seeded.generation_task_id,
                name: "gpt-4o@judge".to_string(),
                status: EvaluationStatus::Started,
            },
        )
        .await
        .unwrap();
    assert_eq!(task.plot_name, "gpt-4o");
    assert!(task.active);
    assert!(task.points.is_empty());
    assert_eq!(task.status, EvaluationStatus::Started);

    task.status = EvaluationStatus::Completed;
    task.points.insert("writing".to_string(), 6.5);
    store.save_evaluation_task(&ctx, &task).await.unwrap();

    let loaded = store.get_evaluation_task(&ctx, task.id).await.unwrap();
    assert_eq!(loaded.status, EvaluationStatus::Completed);
    assert_eq!(loaded.points.get("writing"), Some(&6.5));

    let listed = store.list_evaluation_tasks(&ctx, seeded.generation_task_id).await.unwrap();
    assert_eq!(listed.len(), 1);

    let other = RequestContext::new("mallory");
    assert!(matches!(
        store.get_evaluation_task(&other, task.id).await.unwrap_err(),
        BenchError::NotFound(_)
    ));
}

pub async fn rates_and_queries(store: &dyn EvalStore) {
    let ctx = RequestContext::new("alice");
    let seeded = seed(store, &ctx).await;
    let task = store
        .create_evaluation_task(
            &ctx,
            NewEvaluationTask {
                generation_task_id: seeded.generation_task_id,
                name: "run".to_string(),
                status: EvaluationStatus::Started,
            },
        )
        .await
        .unwrap();

    // Multi-turn rate on question 1 covering both turns, plus a zero rate on question 2.
    let rate = store.create_rate(&ctx, new_rate(task.id, seeded.answer_ids[0], 8)).await.unwrap();
    store.create_rate_answer(&ctx, rate.id, seeded.answer_ids[0]).await.unwrap();
    store.create_rate_answer(&ctx, rate.id, seeded.answer_ids[1]).await.unwrap();
    let zero = store.create_rate(&ctx, new_rate(task.id, seeded.answer_ids[2], 0)).await.unwrap();
    store.create_rate_answer(&ctx, zero.id, seeded.answer_ids[2]).await.unwrap();

    let rates = store.list_rates(&ctx, task.id).await.unwrap();
    assert_eq!(rates.iter().map(|r| r.point).collect::<Vec<_>>(), vec![8, 0]);

    let for_question = store.rates_for_question(&ctx, seeded.question_ids[0]).await.unwrap();
    assert_eq!(for_question.len(), 1);
    assert_eq!(for_question[0].rate.id, rate.id);
    assert_eq!(for_question[0].answers.len(), 2);

    let scored = store.scored_rates(&ctx, task.id).await.unwrap();
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].category, "writing");
    assert_eq!(scored[0].point, 8);
    assert_eq!(scored[0].processing_time, 10.0);
}

pub async fn rate_answer_requires_existing_rate(store: &dyn EvalStore) {
    let ctx = RequestContext::new("alice");
    let seeded = seed(store, &ctx).await;

    let err = store.create_rate_answer(&ctx, 999_999, seeded.answer_ids[0]).await.unwrap_err();
    assert!(matches!(err, BenchError::Store(_)));
}
