//! 练习模式的解析延迟显示
//!
//! 选择答案后等待一小段时间再显示解析，显示后该题答案锁定。
//! 同一时间只有当前题目的一个等待中的截止时间，切换题目时清除。

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct ExplanationReveal {
    delay: Duration,
    pending: Option<(usize, Instant)>,
    revealed: HashSet<usize>,
}

impl ExplanationReveal {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            revealed: HashSet::new(),
        }
    }

    /// 为第 `question_index` 题安排显示，已显示过的题目不再安排
    pub fn arm(&mut self, question_index: usize) -> bool {
        if self.revealed.contains(&question_index) {
            return false;
        }
        self.pending = Some((question_index, Instant::now() + self.delay));
        true
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, deadline)| deadline)
    }

    /// 截止时间到达后调用，返回被显示的题目
    pub fn mark_revealed(&mut self) -> Option<usize> {
        let (question_index, _) = self.pending.take()?;
        self.revealed.insert(question_index);
        Some(question_index)
    }

    pub fn is_revealed(&self, question_index: usize) -> bool {
        self.revealed.contains(&question_index)
    }
}
