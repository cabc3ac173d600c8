//! 考试应用 - 编排层
//!
//! ## 职责
//!
//! 把组卷、会话和历史记录串起来，是 CLI 和集成测试的入口。
//!
//! ## 核心流程
//!
//! 1. **权限检查**：模拟考试需要高级权限（可在考试配置中关闭）
//! 2. **组卷**：委托 `QuestionSetAssembler`
//! 3. **会话**：委托 `SessionRunner`，直到交卷、超时或放弃
//! 4. **保存**：成绩追加到历史记录，保存失败只记录日志
//!
//! ## 设计特点
//!
//! - 协作方（生成器、历史记录、权限）全部由调用方注入
//! - 不做任何输出，展示交给 `SessionPresenter`

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{TestCatalog, TestConfig, TestMode, TestResult, TestType};
use crate::orchestrator::question_set_assembler::QuestionSetAssembler;
use crate::services::{AccessGate, HistoryStore, QuestionGenerator};
use crate::session::{SessionCommand, SessionOutcome, SessionPresenter, SessionRunner, TestSession};
use crate::utils::logging;

/// 应用主结构
pub struct App<G, H, A> {
    catalog: TestCatalog,
    assembler: QuestionSetAssembler<G>,
    history: H,
    access: A,
    runner: SessionRunner,
}

impl<G, H, A> App<G, H, A>
where
    G: QuestionGenerator,
    H: HistoryStore,
    A: AccessGate,
{
    pub fn new(config: &Config, catalog: TestCatalog, generator: G, history: H, access: A) -> Self {
        Self {
            catalog,
            assembler: QuestionSetAssembler::new(generator, config),
            history,
            access,
            runner: SessionRunner::new(Duration::from_millis(config.reveal_delay_ms)),
        }
    }

    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn test_config(&self, test_type: TestType) -> AppResult<&TestConfig> {
        self.catalog
            .get(test_type)
            .ok_or_else(|| ConfigError::UnknownTestType(test_type.to_string()).into())
    }

    /// 组卷并创建会话（尚未开始计时）
    ///
    /// # 错误
    /// - `AccessDenied`: 模拟考试且没有高级权限
    /// - `Generation` / `EmptyQuestionSet`: 组卷失败
    pub async fn start_test(&self, test_type: TestType, test_mode: TestMode) -> AppResult<TestSession> {
        let test_config = self.test_config(test_type)?;

        if test_mode == TestMode::Simulation
            && test_config.simulation_requires_access
            && !self.access.has_access()
        {
            warn!("🔒 {} 模拟考试需要高级权限", test_type);
            return Err(AppError::AccessDenied { test_type });
        }

        let set = self.assembler.assemble_for(test_type, test_config).await?;
        logging::log_assembly_complete(
            test_type,
            set.report.delivered,
            set.report.requested,
            set.report.rejected,
        );
        for (section, missing) in &set.report.shortfalls {
            warn!("⚠️ 分区 '{}' 缺少 {} 道题", section, missing);
        }

        Ok(TestSession::new(test_type, test_mode, set.questions))
    }

    /// 运行会话，交卷后保存成绩
    pub async fn run_session<P: SessionPresenter>(
        &mut self,
        session: TestSession,
        commands: &mut mpsc::Receiver<SessionCommand>,
        presenter: &mut P,
    ) -> AppResult<SessionOutcome> {
        let duration = Duration::from_secs(self.test_config(session.test_type())?.duration_secs());

        let outcome = self.runner.run(session, duration, commands, presenter).await;

        if let SessionOutcome::Finished(result) = &outcome {
            logging::log_result_summary(result);
            self.record_result(result.clone());
        }

        Ok(outcome)
    }

    /// 保存成绩，失败时不影响本次考试结果
    pub fn record_result(&mut self, result: TestResult) {
        let id = result.id;
        match self.history.append(result) {
            Ok(()) => info!("💾 成绩已保存 (#{})", id),
            Err(e) => error!("❌ 成绩保存失败: {}", e),
        }
    }

    pub fn clear_history(&mut self) -> AppResult<()> {
        self.history.clear_all()?;
        info!("🗑️ 历史记录已清空");
        Ok(())
    }
}
