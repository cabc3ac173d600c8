//! 会话驱动
//!
//! 用 `tokio::select!` 同时等待三类事件：
//! - 用户命令（选择、导航、交卷、放弃）
//! - 倒计时事件（仅模拟考试）
//! - 解析显示截止时间（仅练习模式）
//!
//! 展示交给 `SessionPresenter`，这里不做任何输出。

use std::future::pending;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep_until, Instant, Interval};
use tracing::{debug, info};

use crate::models::{TestMode, TestResult};
use crate::session::reveal::ExplanationReveal;
use crate::session::state_machine::{SessionState, TestSession};
use crate::session::timer::{CountdownTimer, TimerEvent};

/// 用户命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 为当前题目选择答案
    Select { option_id: String },
    /// 为指定题目选择答案
    SelectAt { index: usize, option_id: String },
    Next,
    Previous,
    GoTo(usize),
    Finish,
    Abandon,
}

/// 会话展示
pub trait SessionPresenter {
    fn show_question(&mut self, session: &TestSession);

    fn show_countdown(&mut self, _remaining_secs: u64) {}

    fn show_elapsed(&mut self, _elapsed_secs: u64) {}

    fn show_explanation(&mut self, _session: &TestSession, _question_index: usize) {}

    fn show_time_up(&mut self) {}

    fn show_result(&mut self, _result: &TestResult) {}
}

#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Finished(TestResult),
    Abandoned,
}

impl SessionOutcome {
    pub fn result(&self) -> Option<&TestResult> {
        match self {
            SessionOutcome::Finished(result) => Some(result),
            SessionOutcome::Abandoned => None,
        }
    }
}

pub struct SessionRunner {
    reveal_delay: Duration,
}

impl SessionRunner {
    pub fn new(reveal_delay: Duration) -> Self {
        Self { reveal_delay }
    }

    /// 运行会话直到交卷、超时或放弃
    ///
    /// 命令通道关闭视为放弃。
    pub async fn run<P: SessionPresenter>(
        &self,
        mut session: TestSession,
        duration: Duration,
        commands: &mut mpsc::Receiver<SessionCommand>,
        presenter: &mut P,
    ) -> SessionOutcome {
        if session.state() == SessionState::NotStarted {
            session.start();
        }

        let practice = session.test_mode() == TestMode::Practice;
        let mut timer = (!practice).then(|| CountdownTimer::start(duration));
        let mut elapsed_ticker = practice.then(|| {
            let period = Duration::from_secs(1);
            interval_at(Instant::now() + period, period)
        });
        let mut reveal = ExplanationReveal::new(self.reveal_delay);

        presenter.show_question(&session);

        loop {
            let reveal_at = reveal.pending_deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Finish) => {
                        return conclude(&mut session, &mut timer, presenter);
                    }
                    Some(SessionCommand::Abandon) | None => {
                        if let Some(mut timer) = timer.take() {
                            timer.cancel();
                        }
                        info!("🚪 会话已放弃，不保存成绩");
                        return SessionOutcome::Abandoned;
                    }
                    Some(command) => {
                        apply_command(command, &mut session, &mut reveal, practice, presenter);
                    }
                },
                event = next_timer_event(&mut timer) => match event {
                    Some(TimerEvent::Tick { remaining_secs }) => {
                        presenter.show_countdown(remaining_secs);
                    }
                    Some(TimerEvent::Expired) => {
                        info!("⏰ 时间到，自动交卷");
                        presenter.show_time_up();
                        return conclude(&mut session, &mut timer, presenter);
                    }
                    None => timer = None,
                },
                _ = next_tick(&mut elapsed_ticker) => {
                    presenter.show_elapsed(session.elapsed_secs());
                }
                _ = sleep_until_opt(reveal_at) => {
                    if let Some(question_index) = reveal.mark_revealed() {
                        presenter.show_explanation(&session, question_index);
                    }
                }
            }
        }
    }
}

fn apply_command<P: SessionPresenter>(
    command: SessionCommand,
    session: &mut TestSession,
    reveal: &mut ExplanationReveal,
    practice: bool,
    presenter: &mut P,
) {
    let changed = match command {
        SessionCommand::Select { option_id } => {
            let index = session.current_index();
            select(session, reveal, practice, index, option_id)
        }
        SessionCommand::SelectAt { index, option_id } => {
            select(session, reveal, practice, index, option_id)
        }
        SessionCommand::Next => navigated(session.advance(), reveal),
        SessionCommand::Previous => navigated(session.retreat(), reveal),
        SessionCommand::GoTo(index) => navigated(session.go_to(index), reveal),
        SessionCommand::Finish | SessionCommand::Abandon => false,
    };

    if changed {
        presenter.show_question(session);
    }
}

fn select(
    session: &mut TestSession,
    reveal: &mut ExplanationReveal,
    practice: bool,
    index: usize,
    option_id: String,
) -> bool {
    if practice && reveal.is_revealed(index) {
        debug!("第 {} 题解析已显示，答案已锁定", index + 1);
        return false;
    }
    if !session.select_answer(index, option_id) {
        return false;
    }
    if practice && index == session.current_index() {
        reveal.arm(index);
    }
    true
}

fn navigated(moved: bool, reveal: &mut ExplanationReveal) -> bool {
    if moved {
        reveal.reset();
    }
    moved
}

fn conclude<P: SessionPresenter>(
    session: &mut TestSession,
    timer: &mut Option<CountdownTimer>,
    presenter: &mut P,
) -> SessionOutcome {
    if let Some(mut timer) = timer.take() {
        timer.cancel();
    }
    match session.finish() {
        Some(result) => {
            presenter.show_result(&result);
            SessionOutcome::Finished(result)
        }
        None => SessionOutcome::Abandoned,
    }
}

async fn next_timer_event(timer: &mut Option<CountdownTimer>) -> Option<TimerEvent> {
    match timer {
        Some(timer) => timer.next_event().await,
        None => pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
