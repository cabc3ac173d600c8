//! # Exam Simulator
//!
//! 入学考试（PAA / OTIS）模拟器：AI 出题、本地评分、保存历史成绩
//!
//! ## 架构设计
//!
//! ### ① 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionGenerator` - 按分区生成原始题目（LLM / 本地题库）
//! - `HistoryStore` - 成绩历史（追加、读取、清空）
//! - `AccessGate` - 高级权限
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 单道题目的校验与规整
//! - `SectionCtx` - 上下文封装（考试类型 + 分区）
//! - `QuestionNormalizer` - 结构校验、答案校验、打乱选项
//!
//! ### ③ 会话层（Session）
//! - `session/` - 状态机、倒计时、解析显示、命令驱动
//! - `scoring` - 纯函数评分
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/question_set_assembler` - 组卷
//! - `orchestrator/exam_app` - 权限、组卷、会话、保存
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod scoring;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, QuestionSource};
pub use error::{AppError, AppResult, GenerationError};
pub use models::{Question, TestCatalog, TestMode, TestResult, TestType};
pub use orchestrator::{App, QuestionSetAssembler};
pub use scoring::score_session;
pub use session::{SessionCommand, SessionOutcome, SessionPresenter, TestSession};
