/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{TestMode, TestResult, TestType};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 `debug` 或 `info`。
/// 重复调用是安全的（测试中多次初始化时忽略错误）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(test_type: TestType, test_mode: TestMode, question_source: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试模拟器启动");
    info!("📋 考试: {} - {}", test_type, test_mode);
    info!("🤖 题目来源: {}", question_source);
    info!("{}", "=".repeat(60));
}

/// 记录组卷完成信息
pub fn log_assembly_complete(test_type: TestType, total: usize, requested: usize, rejected: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {} 组卷完成: {}/{} 道题", test_type, total, requested);
    if rejected > 0 {
        info!("⚠️ 校验丢弃: {} 道", rejected);
    }
    info!("{}", "─".repeat(60));
}

/// 打印成绩统计
pub fn log_result_summary(result: &TestResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 考试结果 {} - {}", result.test_type, result.test_mode);
    info!("完成时间: {}", result.date.format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("🎯 得分: {}", result.score_label());
    info!("✅ 正确: {}/{}", result.correct_answers, result.total_questions);
    info!("❌ 错误: {}", result.incorrect_answers);
    info!("⏱️ 用时: {} 秒", result.time_taken);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
