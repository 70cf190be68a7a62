//! Benchmark kinds and judge prompt construction
//!
//! Each benchmark code selects a [`ScoringMode`]. Judge-scored benches pick a
//! [`JudgePrompt`] variant that turns a [`PromptContext`] into chat messages.

use crate::error::{DispatchError, Result};
use benchjudge_core::{Answer, ChatMessage, Question, Role, render_template};
use std::collections::HashMap;

/// Fixed system message opening every judge conversation.
pub const JUDGE_SYSTEM_PROMPT: &str = "評価の点数は必ず[[数字]]の形式で示す。説明は簡潔にする。";

pub const EXACT_MATCH_BENCH: &str = "aiw";
pub const FEW_SHOT_BENCH: &str = "tengu";
pub const TOOL_CALL_BENCH: &str = "bfcl";
pub const MULTI_TURN_BENCH: &str = "jmt-multi";

const EXAMPLE_QUESTION: &str = "「急がば回れ」という言葉について説明してください。";

const EXAMPLE_ANSWER: &str = concat!(
    "「急がば回れ」という言葉は、日本の諺の一つであり、直接的な意味は「急ぐときは、早道や危険な方法を選ばずに、",
    "むしろ回り道で確実で安全な道を通った方が結局は早く着けるものだ」というものです。",
    "この言葉は、物事は慌てずに着実に進めることが結果としてうまくいくという教訓を含んでいます"
);

const EXAMPLE_EVAL_ASPECT: &str = concat!(
    "- 本来の「急ぐときは、早道や危険な方法を選ばずに、むしろ回り道で確実で安全な道を通った方が結局は早く着ける」",
    "という意味について説明している:3点\n",
    "- 一般化した「物事は慌てずに着実に進めることが結果としてうまくいく」という意味について説明している:3点\n",
    "- ことわざであることを示している:2点\n- 説明は具体的でわかりやすい:1点\n- 自然な日本語である:1点"
);

const EXAMPLE_CORRECT_ANSWER: &str = concat!(
    "「急がば回れ」とは、物事を急いで進めるよりも、慎重に計画を立てて行動する方が結果が良くなるという意味のことわざです。",
    "つまり、無駄なミスやトラブルを避けるためには、急いで手を打つのではなく、ゆっくりと計画を練り、",
    "周囲をよく考えて行動することが大切だということを教えています。急いで物事を進めようとして失敗してしまうよりも、",
    "手間と時間をかけてじっくりと準備をする方が結果的に効率的で成功する可能性が高いという教訓を持つ言葉です。"
);

const EXAMPLE_EVALUATION: &str = "[該当する評価項目とその簡潔な理由]
- 一般化した「物事は慌てずに着実に進めることが結果としてうまくいく」という意味について説明している:3点
  - 「物事を急いで進めるよりも、慎重に計画を立てて行動する方が結果が良くなるという意味」と示している。
- ことわざであることを示している:2点
  - 「ことわざです」と書いてある。
- 説明は具体的でわかりやすい:1点
  - 言い換えたりしながら詳しく説明されている。
- 自然な日本語である:1点
  - 日本語の用法が全て正しい。
[計算式]
3+2+1+1=7
[点数]
[[7]]";

/// How the answers of a bench are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Compare the bracketed number in each answer with the reference, no LLM call.
    ExactMatch,
    Judge(JudgePrompt),
}

impl ScoringMode {
    pub fn for_bench(code: &str) -> Self {
        match code {
            EXACT_MATCH_BENCH => ScoringMode::ExactMatch,
            FEW_SHOT_BENCH => ScoringMode::Judge(JudgePrompt::FewShotRubric),
            TOOL_CALL_BENCH => ScoringMode::Judge(JudgePrompt::ToolCall),
            MULTI_TURN_BENCH => ScoringMode::Judge(JudgePrompt::MultiTurn),
            _ => ScoringMode::Judge(JudgePrompt::SingleTurn),
        }
    }
}

/// Judge prompt layout per benchmark kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgePrompt {
    /// `{question}`, `{answer}`, `{correct_answer}`, `{eval_aspect}`
    SingleTurn,
    /// SingleTurn fields preceded by one worked example exchange
    FewShotRubric,
    /// `{question_1}`, `{question_2}`, `{answer_1}`, `{answer_2}`
    MultiTurn,
    /// `{question}`, `{answer}`, `{system}` taken from the generation messages
    ToolCall,
}

/// Inputs for rendering one judge prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub template: &'a str,
    pub question: &'a Question,
    pub answer: &'a Answer,
    /// Turn-2 answer of the same question, required by [`JudgePrompt::MultiTurn`]
    pub second_answer: Option<&'a Answer>,
}

impl JudgePrompt {
    pub fn needs_second_turn(self) -> bool {
        matches!(self, JudgePrompt::MultiTurn)
    }

    pub fn render(self, ctx: &PromptContext<'_>) -> Result<Vec<ChatMessage>> {
        let mut messages = vec![ChatMessage::system(JUDGE_SYSTEM_PROMPT)];

        match self {
            JudgePrompt::SingleTurn => {
                messages.push(ChatMessage::user(render_single_turn(ctx)?));
            }
            JudgePrompt::FewShotRubric => {
                let example = HashMap::from([
                    ("question", EXAMPLE_QUESTION),
                    ("answer", EXAMPLE_ANSWER),
                    ("correct_answer", EXAMPLE_CORRECT_ANSWER),
                    ("eval_aspect", EXAMPLE_EVAL_ASPECT),
                ]);
                messages.push(ChatMessage::user(render_template(ctx.template, &example)));
                messages.push(ChatMessage::assistant(EXAMPLE_EVALUATION));
                messages.push(ChatMessage::user(render_single_turn(ctx)?));
            }
            JudgePrompt::MultiTurn => {
                let second = ctx.second_answer.ok_or_else(|| {
                    DispatchError::NotFound(format!(
                        "turn 2 answer for question {}",
                        ctx.question.question_number
                    ))
                })?;
                let vars = HashMap::from([
                    ("question_1", turn(ctx.question, 0)?),
                    ("question_2", turn(ctx.question, 1)?),
                    ("answer_1", ctx.answer.text.as_str()),
                    ("answer_2", second.text.as_str()),
                ]);
                messages.push(ChatMessage::user(render_template(ctx.template, &vars)));
            }
            JudgePrompt::ToolCall => {
                let last_content = |role: Role| {
                    ctx.answer
                        .messages
                        .iter()
                        .rev()
                        .find(|m| m.role == role)
                        .map(|m| m.content.as_str())
                        .unwrap_or_default()
                };
                let vars = HashMap::from([
                    ("question", last_content(Role::User)),
                    ("answer", ctx.answer.text.as_str()),
                    ("system", last_content(Role::System)),
                ]);
                messages.push(ChatMessage::user(render_template(ctx.template, &vars)));
            }
        }

        Ok(messages)
    }
}

fn turn(question: &Question, index: usize) -> Result<&str> {
    question.turns.get(index).map(String::as_str).ok_or_else(|| {
        DispatchError::NotFound(format!(
            "turn {} of question {}",
            index + 1,
            question.question_number
        ))
    })
}

/// A missing correct answer or eval aspect renders as an empty string.
fn render_single_turn(ctx: &PromptContext<'_>) -> Result<String> {
    let vars = HashMap::from([
        ("question", turn(ctx.question, 0)?),
        ("answer", ctx.answer.text.as_str()),
        ("correct_answer", ctx.question.first_correct_answer().unwrap_or_default()),
        ("eval_aspect", ctx.question.first_eval_aspect().unwrap_or_default()),
    ]);
    Ok(render_template(ctx.template, &vars))
}
