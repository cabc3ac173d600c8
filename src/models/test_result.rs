use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::Question;
use super::test_config::{TestMode, TestType};

/// 作答记录：题目下标（从 0 开始）-> 选项 id
pub type AnswerMap = BTreeMap<usize, String>;

/// 一次考试的成绩快照，生成后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// 基于时间戳（毫秒）的标识
    pub id: i64,
    pub test_type: TestType,
    pub test_mode: TestMode,
    /// 百分制得分 [0, 100]
    pub score: f64,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// 用时（秒）
    pub time_taken: u64,
    pub date: DateTime<Utc>,
    pub answers: AnswerMap,
    pub questions: Vec<Question>,
}

/// 成绩档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// >= 70
    Good,
    /// >= 50
    Fair,
    Poor,
}

impl TestResult {
    pub fn score_band(&self) -> ScoreBand {
        if self.score >= 70.0 {
            ScoreBand::Good
        } else if self.score >= 50.0 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }

    /// 一位小数的得分文本，如 "66.7%"
    pub fn score_label(&self) -> String {
        format!("{:.1}%", self.score)
    }

    /// 逐题回顾
    pub fn review(&self) -> Vec<ReviewItem<'_>> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let chosen = self.answers.get(&index).map(String::as_str);
                ReviewItem {
                    question,
                    chosen,
                    is_correct: question.is_correct(chosen),
                }
            })
            .collect()
    }
}

/// 单题回顾
#[derive(Debug, Clone)]
pub struct ReviewItem<'a> {
    pub question: &'a Question,
    pub chosen: Option<&'a str>,
    pub is_correct: bool,
}
