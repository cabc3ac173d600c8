//! 评分
//!
//! 纯函数：比较作答和答案，生成 `TestResult`。持久化由调用方负责。

use chrono::{DateTime, Utc};

use crate::models::{AnswerMap, Question, TestMode, TestResult, TestType};

/// 计算成绩
///
/// 第 i 题正确当且仅当 `answers[i] == questions[i].correct_answer_id`，
/// 未作答按错误计，没有部分得分。
pub fn score_session(
    test_type: TestType,
    test_mode: TestMode,
    questions: &[Question],
    answers: &AnswerMap,
    time_taken: u64,
    finished_at: DateTime<Utc>,
) -> TestResult {
    let total = questions.len();
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(index, q)| q.is_correct(answers.get(index).map(String::as_str)))
        .count();

    let score = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    TestResult {
        id: finished_at.timestamp_millis(),
        test_type,
        test_mode,
        score,
        total_questions: total,
        correct_answers: correct,
        incorrect_answers: total - correct,
        time_taken,
        date: finished_at,
        answers: answers.clone(),
        questions: questions.to_vec(),
    }
}
