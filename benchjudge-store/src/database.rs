use crate::{EvalStore, NewAnswer, NewBench, NewGenerationTask, NewQuestion};
use async_trait::async_trait;
use benchjudge_core::{
    Answer, AnswerWithQuestion, Bench, BenchError, CategoryMap, EvaluationStatus, EvaluationTask,
    GenerationStatus, GenerationTask, NewEvaluationTask, NewRate, Question, Rate, RateAnswer,
    RateWithAnswers, RequestContext, Result, ScoredRate,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

const ANSWER_COLUMNS: &str = "a.id, a.generation_task_id, a.question_id, a.turn_number, a.text, \
     a.messages, a.processing_time, a.finish_reason, a.usage";

const QUESTION_COLUMNS: &str = "q.id AS q_id, q.bench_id, q.question_number, q.category, q.turns, \
     q.correct_answers, q.eval_aspects";

const RATE_COLUMNS: &str = "r.id, r.user_id, r.evaluation_task_id, r.answer_id, r.point, r.text, \
     r.usage, r.finish_reason, r.processing_time, r.model, r.created_at";

fn store_err(action: &str) -> impl FnOnce(sqlx::Error) -> BenchError + '_ {
    move |e| BenchError::Store(format!("{} failed: {}", action, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| BenchError::Store(format!("serialize failed: {}", e)))
}

fn from_json<T: DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BenchError::Store(format!("invalid timestamp {}: {}", raw, e)))
}

/// SQLite-backed store.
///
/// Timestamps are RFC 3339 text and structured columns are JSON text.
pub struct SqliteEvalStore {
    pool: SqlitePool,
}

impl SqliteEvalStore {
    /// Connect to `database_url`. In-memory databases are pinned to a single
    /// connection that is never recycled, since the database lives and dies
    /// with it.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| BenchError::Store(format!("database connection failed: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS benches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                template TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                bench_id INTEGER NOT NULL REFERENCES benches(id),
                question_number INTEGER NOT NULL,
                category TEXT NOT NULL,
                turns TEXT NOT NULL,
                correct_answers TEXT NOT NULL,
                eval_aspects TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS generation_tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                bench_id INTEGER NOT NULL REFERENCES benches(id),
                name TEXT NOT NULL,
                model_name TEXT NOT NULL,
                description TEXT,
                status INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                generation_task_id INTEGER NOT NULL REFERENCES generation_tasks(id),
                question_id INTEGER NOT NULL REFERENCES questions(id),
                turn_number INTEGER NOT NULL,
                text TEXT NOT NULL,
                messages TEXT NOT NULL,
                processing_time REAL NOT NULL,
                finish_reason TEXT,
                usage TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS evaluation_tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                generation_task_id INTEGER NOT NULL REFERENCES generation_tasks(id),
                name TEXT NOT NULL,
                plot_name TEXT NOT NULL,
                active INTEGER NOT NULL,
                points TEXT NOT NULL,
                processing_times TEXT NOT NULL,
                status INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS rates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                evaluation_task_id INTEGER NOT NULL REFERENCES evaluation_tasks(id),
                answer_id INTEGER NOT NULL REFERENCES answers(id),
                point INTEGER NOT NULL,
                text TEXT NOT NULL,
                usage TEXT NOT NULL,
                finish_reason TEXT NOT NULL,
                processing_time REAL NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS rate_answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rate_id INTEGER NOT NULL REFERENCES rates(id),
                answer_id INTEGER NOT NULL REFERENCES answers(id)
            )
            "#,
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await.map_err(store_err("migration"))?;
        }
        tracing::debug!("sqlite schema is up to date");
        Ok(())
    }

    fn row_to_answer(row: &SqliteRow) -> Answer {
        Answer {
            id: row.get("id"),
            generation_task_id: row.get("generation_task_id"),
            question_id: row.get("question_id"),
            turn_number: row.get::<i64, _>("turn_number") as u32,
            text: row.get("text"),
            messages: from_json(row.get("messages")),
            processing_time: row.get("processing_time"),
            finish_reason: row.get("finish_reason"),
            usage: from_json(row.get("usage")),
        }
    }

    fn row_to_question(row: &SqliteRow) -> Question {
        Question {
            id: row.get("q_id"),
            bench_id: row.get("bench_id"),
            question_number: row.get::<i64, _>("question_number") as u32,
            category: row.get("category"),
            turns: from_json(row.get("turns")),
            correct_answers: from_json(row.get("correct_answers")),
            eval_aspects: from_json(row.get("eval_aspects")),
        }
    }

    fn row_to_rate(row: &SqliteRow) -> Result<Rate> {
        Ok(Rate {
            id: row.get("id"),
            user_id: row.get("user_id"),
            evaluation_task_id: row.get("evaluation_task_id"),
            answer_id: row.get("answer_id"),
            point: row.get("point"),
            text: row.get("text"),
            usage: from_json(row.get("usage")),
            finish_reason: row.get("finish_reason"),
            processing_time: row.get("processing_time"),
            model: row.get("model"),
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_evaluation_task(row: &SqliteRow) -> Result<EvaluationTask> {
        let code: i64 = row.get("status");
        Ok(EvaluationTask {
            id: row.get("id"),
            user_id: row.get("user_id"),
            generation_task_id: row.get("generation_task_id"),
            name: row.get("name"),
            plot_name: row.get("plot_name"),
            active: row.get::<i64, _>("active") != 0,
            points: from_json::<CategoryMap>(row.get("points")),
            processing_times: from_json::<CategoryMap>(row.get("processing_times")),
            status: EvaluationStatus::from_code(code)
                .ok_or_else(|| BenchError::Store(format!("unknown evaluation status {}", code)))?,
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }

    async fn answers_of_rate(&self, rate_id: i64) -> Result<Vec<Answer>> {
        let sql = format!(
            "SELECT {ANSWER_COLUMNS} FROM rate_answers ra \
             JOIN answers a ON a.id = ra.answer_id \
             WHERE ra.rate_id = ? ORDER BY ra.id"
        );
        let rows = sqlx::query(&sql)
            .bind(rate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("query"))?;
        Ok(rows.iter().map(Self::row_to_answer).collect())
    }
}

#[async_trait]
impl EvalStore for SqliteEvalStore {
    async fn get_generation_task(&self, ctx: &RequestContext, id: i64) -> Result<GenerationTask> {
        let row = sqlx::query(
            "SELECT g.id, g.user_id, g.name, g.model_name, g.description, g.status, g.created_at, \
             b.id AS b_id, b.code, b.name AS b_name, b.template \
             FROM generation_tasks g JOIN benches b ON b.id = g.bench_id \
             WHERE g.id = ? AND g.user_id = ?",
        )
        .bind(id)
        .bind(ctx.user_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("query"))?
        .ok_or_else(|| BenchError::NotFound(format!("generation task {}", id)))?;

        let code: i64 = row.get("status");
        Ok(GenerationTask {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            model_name: row.get("model_name"),
            description: row.get("description"),
            status: GenerationStatus::from_code(code)
                .ok_or_else(|| BenchError::Store(format!("unknown generation status {}", code)))?,
            bench: Bench {
                id: row.get("b_id"),
                code: row.get("code"),
                name: row.get("b_name"),
                template: row.get("template"),
            },
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }

    async fn list_answers(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        turn: Option<u32>,
    ) -> Result<Vec<AnswerWithQuestion>> {
        self.get_generation_task(ctx, generation_task_id).await?;

        let sql = format!(
            "SELECT {ANSWER_COLUMNS}, {QUESTION_COLUMNS} FROM answers a \
             JOIN questions q ON q.id = a.question_id \
             WHERE a.generation_task_id = ? AND (? IS NULL OR a.turn_number = ?) \
             ORDER BY a.id"
        );
        let turn = turn.map(i64::from);
        let rows = sqlx::query(&sql)
            .bind(generation_task_id)
            .bind(turn)
            .bind(turn)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("query"))?;

        Ok(rows
            .iter()
            .map(|row| AnswerWithQuestion {
                answer: Self::row_to_answer(row),
                question: Self::row_to_question(row),
            })
            .collect())
    }

    async fn find_answer(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
        question_id: i64,
        turn_number: u32,
    ) -> Result<Option<Answer>> {
        self.get_generation_task(ctx, generation_task_id).await?;

        let sql = format!(
            "SELECT {ANSWER_COLUMNS} FROM answers a \
             WHERE a.generation_task_id = ? AND a.question_id = ? AND a.turn_number = ? \
             ORDER BY a.id LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(generation_task_id)
            .bind(question_id)
            .bind(i64::from(turn_number))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("query"))?;
        Ok(row.as_ref().map(Self::row_to_answer))
    }

    async fn create_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: NewEvaluationTask,
    ) -> Result<EvaluationTask> {
        self.get_generation_task(ctx, task.generation_task_id).await?;

        let now = Utc::now();
        let empty = to_json(&CategoryMap::new())?;
        let result = sqlx::query(
            "INSERT INTO evaluation_tasks \
             (user_id, generation_task_id, name, plot_name, active, points, processing_times, status, created_at) \
             VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?)",
        )
        .bind(ctx.user_id())
        .bind(task.generation_task_id)
        .bind(&task.name)
        .bind(task.plot_name())
        .bind(&empty)
        .bind(&empty)
        .bind(task.status.code())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        self.get_evaluation_task(ctx, result.last_insert_rowid()).await
    }

    async fn save_evaluation_task(
        &self,
        ctx: &RequestContext,
        task: &EvaluationTask,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE evaluation_tasks SET name = ?, plot_name = ?, active = ?, points = ?, \
             processing_times = ?, status = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&task.name)
        .bind(&task.plot_name)
        .bind(i64::from(task.active))
        .bind(to_json(&task.points)?)
        .bind(to_json(&task.processing_times)?)
        .bind(task.status.code())
        .bind(task.id)
        .bind(ctx.user_id())
        .execute(&self.pool)
        .await
        .map_err(store_err("update"))?;

        if result.rows_affected() == 0 {
            return Err(BenchError::NotFound(format!("evaluation task {}", task.id)));
        }
        Ok(())
    }

    async fn get_evaluation_task(&self, ctx: &RequestContext, id: i64) -> Result<EvaluationTask> {
        let row = sqlx::query("SELECT * FROM evaluation_tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(ctx.user_id())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("query"))?
            .ok_or_else(|| BenchError::NotFound(format!("evaluation task {}", id)))?;
        Self::row_to_evaluation_task(&row)
    }

    async fn list_evaluation_tasks(
        &self,
        ctx: &RequestContext,
        generation_task_id: i64,
    ) -> Result<Vec<EvaluationTask>> {
        let rows = sqlx::query(
            "SELECT * FROM evaluation_tasks WHERE generation_task_id = ? AND user_id = ? ORDER BY id",
        )
        .bind(generation_task_id)
        .bind(ctx.user_id())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query"))?;
        rows.iter().map(Self::row_to_evaluation_task).collect()
    }

    async fn create_rate(&self, ctx: &RequestContext, rate: NewRate) -> Result<Rate> {
        self.get_evaluation_task(ctx, rate.evaluation_task_id).await?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO rates \
             (user_id, evaluation_task_id, answer_id, point, text, usage, finish_reason, processing_time, model, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ctx.user_id())
        .bind(rate.evaluation_task_id)
        .bind(rate.answer_id)
        .bind(rate.point)
        .bind(&rate.text)
        .bind(to_json(&rate.usage)?)
        .bind(&rate.finish_reason)
        .bind(rate.processing_time)
        .bind(&rate.model)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        Ok(Rate {
            id: result.last_insert_rowid(),
            user_id: ctx.user_id().to_string(),
            evaluation_task_id: rate.evaluation_task_id,
            answer_id: rate.answer_id,
            point: rate.point,
            text: rate.text,
            usage: rate.usage,
            finish_reason: rate.finish_reason,
            processing_time: rate.processing_time,
            model: rate.model,
            created_at: now,
        })
    }

    async fn create_rate_answer(
        &self,
        ctx: &RequestContext,
        rate_id: i64,
        answer_id: i64,
    ) -> Result<RateAnswer> {
        let result = sqlx::query(
            "INSERT INTO rate_answers (rate_id, answer_id) \
             SELECT r.id, a.id FROM rates r, answers a \
             WHERE r.id = ? AND r.user_id = ? AND a.id = ?",
        )
        .bind(rate_id)
        .bind(ctx.user_id())
        .bind(answer_id)
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        if result.rows_affected() == 0 {
            return Err(BenchError::Store(format!(
                "rate {} or answer {} does not exist",
                rate_id, answer_id
            )));
        }
        Ok(RateAnswer { id: result.last_insert_rowid(), rate_id, answer_id })
    }

    async fn list_rates(&self, ctx: &RequestContext, evaluation_task_id: i64) -> Result<Vec<Rate>> {
        self.get_evaluation_task(ctx, evaluation_task_id).await?;

        let sql = format!("SELECT {RATE_COLUMNS} FROM rates r WHERE r.evaluation_task_id = ? ORDER BY r.id");
        let rows = sqlx::query(&sql)
            .bind(evaluation_task_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("query"))?;
        rows.iter().map(Self::row_to_rate).collect()
    }

    async fn rates_for_question(
        &self,
        ctx: &RequestContext,
        question_id: i64,
    ) -> Result<Vec<RateWithAnswers>> {
        let sql = format!(
            "SELECT DISTINCT {RATE_COLUMNS} FROM rates r \
             JOIN rate_answers ra ON ra.rate_id = r.id \
             JOIN answers a ON a.id = ra.answer_id \
             WHERE a.question_id = ? AND r.user_id = ? ORDER BY r.id"
        );
        let rows = sqlx::query(&sql)
            .bind(question_id)
            .bind(ctx.user_id())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("query"))?;

        let mut joined = Vec::with_capacity(rows.len());
        for row in &rows {
            let rate = Self::row_to_rate(row)?;
            let answers = self.answers_of_rate(rate.id).await?;
            joined.push(RateWithAnswers { rate, answers });
        }
        Ok(joined)
    }

    async fn scored_rates(
        &self,
        ctx: &RequestContext,
        evaluation_task_id: i64,
    ) -> Result<Vec<ScoredRate>> {
        self.get_evaluation_task(ctx, evaluation_task_id).await?;

        let rows = sqlx::query(
            "SELECT q.category, r.point, a.processing_time FROM rates r \
             JOIN answers a ON a.id = r.answer_id \
             JOIN questions q ON q.id = a.question_id \
             WHERE r.evaluation_task_id = ? AND r.point != 0 ORDER BY r.id",
        )
        .bind(evaluation_task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err("query"))?;

        Ok(rows
            .iter()
            .map(|row| ScoredRate {
                category: row.get("category"),
                point: row.get("point"),
                processing_time: row.get("processing_time"),
            })
            .collect())
    }

    async fn create_bench(&self, bench: NewBench) -> Result<Bench> {
        let result = sqlx::query("INSERT INTO benches (code, name, template) VALUES (?, ?, ?)")
            .bind(&bench.code)
            .bind(&bench.name)
            .bind(&bench.template)
            .execute(&self.pool)
            .await
            .map_err(store_err("insert"))?;

        Ok(Bench {
            id: result.last_insert_rowid(),
            code: bench.code,
            name: bench.name,
            template: bench.template,
        })
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let result = sqlx::query(
            "INSERT INTO questions \
             (bench_id, question_number, category, turns, correct_answers, eval_aspects) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(question.bench_id)
        .bind(i64::from(question.question_number))
        .bind(&question.category)
        .bind(to_json(&question.turns)?)
        .bind(to_json(&question.correct_answers)?)
        .bind(to_json(&question.eval_aspects)?)
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        Ok(Question {
            id: result.last_insert_rowid(),
            bench_id: question.bench_id,
            question_number: question.question_number,
            category: question.category,
            turns: question.turns,
            correct_answers: question.correct_answers,
            eval_aspects: question.eval_aspects,
        })
    }

    async fn create_generation_task(
        &self,
        ctx: &RequestContext,
        task: NewGenerationTask,
    ) -> Result<GenerationTask> {
        let result = sqlx::query(
            "INSERT INTO generation_tasks \
             (user_id, bench_id, name, model_name, description, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ctx.user_id())
        .bind(task.bench_id)
        .bind(&task.name)
        .bind(&task.model_name)
        .bind(&task.description)
        .bind(task.status.code())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        self.get_generation_task(ctx, result.last_insert_rowid()).await
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer> {
        let result = sqlx::query(
            "INSERT INTO answers \
             (generation_task_id, question_id, turn_number, text, messages, processing_time, finish_reason, usage) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(answer.generation_task_id)
        .bind(answer.question_id)
        .bind(i64::from(answer.turn_number))
        .bind(&answer.text)
        .bind(to_json(&answer.messages)?)
        .bind(answer.processing_time)
        .bind(&answer.finish_reason)
        .bind(to_json(&answer.usage)?)
        .execute(&self.pool)
        .await
        .map_err(store_err("insert"))?;

        Ok(Answer {
            id: result.last_insert_rowid(),
            generation_task_id: answer.generation_task_id,
            question_id: answer.question_id,
            turn_number: answer.turn_number,
            text: answer.text,
            messages: answer.messages,
            processing_time: answer.processing_time,
            finish_reason: answer.finish_reason,
            usage: answer.usage,
        })
    }
}
