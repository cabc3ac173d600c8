//! 考试会话状态机
//!
//! `NotStarted → InProgress → Finished`，`Finished` 是终态。
//! 越界导航被夹到边界，终态下的修改被忽略，不会返回错误。

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::models::{AnswerMap, Question, TestMode, TestResult, TestType};
use crate::scoring::score_session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finished,
}

/// 单次考试会话（只存在于内存中）
#[derive(Debug)]
pub struct TestSession {
    test_type: TestType,
    test_mode: TestMode,
    questions: Vec<Question>,
    answers: AnswerMap,
    current_index: usize,
    state: SessionState,
    started_at: Option<Instant>,
    time_taken: Option<u64>,
}

impl TestSession {
    pub fn new(test_type: TestType, test_mode: TestMode, questions: Vec<Question>) -> Self {
        Self {
            test_type,
            test_mode,
            questions,
            answers: AnswerMap::new(),
            current_index: 0,
            state: SessionState::NotStarted,
            started_at: None,
            time_taken: None,
        }
    }

    /// 开始计时，只有 `NotStarted` 时有效
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::NotStarted {
            return false;
        }
        self.state = SessionState::InProgress;
        self.started_at = Some(Instant::now());
        info!(
            "▶️ {} - {} 开始，共 {} 道题",
            self.test_type,
            self.test_mode,
            self.questions.len()
        );
        true
    }

    /// 记录（或覆盖）第 `question_index` 题的作答，不判断对错
    pub fn select_answer(&mut self, question_index: usize, option_id: impl Into<String>) -> bool {
        if self.state != SessionState::InProgress || question_index >= self.questions.len() {
            return false;
        }
        let option_id = option_id.into();
        debug!("第 {} 题选择 {}", question_index + 1, option_id);
        self.answers.insert(question_index, option_id);
        true
    }

    /// 下一题，已在最后一题时不动
    pub fn advance(&mut self) -> bool {
        if self.state != SessionState::InProgress || self.current_index + 1 >= self.questions.len() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// 上一题，已在第一题时不动
    pub fn retreat(&mut self) -> bool {
        if self.state != SessionState::InProgress || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// 跳到指定题目，越界时夹到最后一题
    pub fn go_to(&mut self, question_index: usize) -> bool {
        if self.state != SessionState::InProgress || self.questions.is_empty() {
            return false;
        }
        let target = question_index.min(self.questions.len() - 1);
        let moved = target != self.current_index;
        self.current_index = target;
        moved
    }

    /// 自开始以来经过的秒数，结束后固定为交卷用时
    pub fn elapsed_secs(&self) -> u64 {
        if let Some(time_taken) = self.time_taken {
            return time_taken;
        }
        self.started_at
            .map(|start| start.elapsed().as_secs())
            .unwrap_or(0)
    }

    /// 交卷：记录用时，进入终态并评分
    ///
    /// 只有第一次调用返回成绩。
    pub fn finish(&mut self) -> Option<TestResult> {
        if self.state != SessionState::InProgress {
            return None;
        }
        let time_taken = self.elapsed_secs();
        self.time_taken = Some(time_taken);
        self.state = SessionState::Finished;

        info!(
            "⏹️ 交卷: 作答 {}/{}，用时 {} 秒",
            self.answers.len(),
            self.questions.len(),
            time_taken
        );

        Some(score_session(
            self.test_type,
            self.test_mode,
            &self.questions,
            &self.answers,
            time_taken,
            Utc::now(),
        ))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    pub fn test_mode(&self) -> TestMode {
        self.test_mode
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn answer_for(&self, question_index: usize) -> Option<&str> {
        self.answers.get(&question_index).map(String::as_str)
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }

    /// 进度百分比（当前题号 / 总题量）
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current_index + 1) as f64 / self.questions.len() as f64 * 100.0
    }
}
