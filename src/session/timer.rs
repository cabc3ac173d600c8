//! 倒计时
//!
//! 模拟考试使用：每秒发送一次剩余时间，到点发送一次 `Expired`。
//! 计时任务在后台运行，`cancel()` 或 drop 时停止。

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::debug;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// 只用于显示，消费方跟不上时直接丢弃
const TICK_BUFFER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining_secs: u64 },
    Expired,
}

/// 剩余时间的颜色档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBand {
    Green,
    /// 少于 5 分钟
    Yellow,
    /// 少于 1 分钟
    Red,
}

impl TimeBand {
    pub fn for_remaining(remaining_secs: u64) -> Self {
        match remaining_secs {
            0..=59 => TimeBand::Red,
            60..=299 => TimeBand::Yellow,
            _ => TimeBand::Green,
        }
    }
}

pub struct CountdownTimer {
    events: mpsc::Receiver<TimerEvent>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl CountdownTimer {
    /// 启动倒计时，时长为 0 时立即过期
    pub fn start(duration: Duration) -> Self {
        let (tx, events) = mpsc::channel(TICK_BUFFER);
        let started = Instant::now();
        let deadline = started + duration;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(started + TICK_PERIOD, TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;

                    _ = sleep_until(deadline) => {
                        debug!("⏰ 倒计时结束");
                        let _ = tx.send(TimerEvent::Expired).await;
                        break;
                    }
                    now = ticker.tick() => {
                        let remaining = deadline.saturating_duration_since(now);
                        if remaining.is_zero() {
                            continue;
                        }
                        let _ = tx.try_send(TimerEvent::Tick {
                            remaining_secs: remaining.as_secs(),
                        });
                    }
                }
            }
        });

        Self {
            events,
            task,
            cancelled: false,
        }
    }

    /// 下一个事件；过期之后或取消之后返回 None
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        self.events.recv().await
    }

    /// 停止计时，只有第一次调用返回 true
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.task.abort();
        true
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 倒计时显示，`MM:SS`（分钟不封顶）
pub fn format_countdown(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// 正计时显示，`HH:MM:SS`
pub fn format_elapsed(elapsed_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        elapsed_secs / 3600,
        (elapsed_secs % 3600) / 60,
        elapsed_secs % 60
    )
}
