//! 考试会话
//!
//! - `state_machine`: 会话状态与作答
//! - `timer`: 模拟考试倒计时
//! - `reveal`: 练习模式的解析显示
//! - `runner`: 把命令、倒计时和解析显示串起来

pub mod reveal;
pub mod runner;
pub mod state_machine;
pub mod timer;

pub use reveal::ExplanationReveal;
pub use runner::{SessionCommand, SessionOutcome, SessionPresenter, SessionRunner};
pub use state_machine::{SessionState, TestSession};
pub use timer::{format_countdown, format_elapsed, CountdownTimer, TimeBand, TimerEvent};
