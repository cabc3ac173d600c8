//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `question_set_assembler` - 组卷器
//! - 按分区请求题目（可并发）
//! - 校验、补题、编号、整体打乱
//!
//! ### `exam_app` - 考试应用
//! - 权限检查
//! - 组卷后创建会话，运行会话
//! - 保存成绩
//!
//! ## 层次关系
//!
//! ```text
//! exam_app (一次考试)
//!     ↓
//! question_set_assembler (Vec<Question>)
//!     ↓
//! workflow::QuestionNormalizer (单道题目)
//!     ↓
//! services (能力层：generator / history / access)
//! ```

pub mod exam_app;
pub mod question_set_assembler;

// 重新导出主要类型
pub use exam_app::App;
pub use question_set_assembler::{AssemblyReport, QuestionSet, QuestionSetAssembler};
