//! 题目生成能力
//!
//! 组卷层只依赖 `QuestionGenerator`，不关心题目来自 LLM 还是本地题库。

use std::future::Future;

use serde_json::Value as JsonValue;

use crate::error::GenerationError;
use crate::models::TestType;
use crate::services::{FixtureGenerator, LlmService};

/// 题目生成协作方
///
/// 一次调用对应一个分区，返回未经校验的原始题目。
/// 网络失败、非成功状态、无法解析或不是数组时返回 `GenerationError`。
pub trait QuestionGenerator {
    fn request_raw_questions(
        &self,
        test_type: TestType,
        section: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<JsonValue>, GenerationError>> + Send;
}

/// 运行时选择的生成器
pub enum Generator {
    Llm(LlmService),
    Fixture(FixtureGenerator),
}

impl Generator {
    pub fn describe(&self) -> String {
        match self {
            Generator::Llm(service) => format!("LLM ({})", service.model_name()),
            Generator::Fixture(_) => "本地题库".to_string(),
        }
    }
}

impl QuestionGenerator for Generator {
    async fn request_raw_questions(
        &self,
        test_type: TestType,
        section: &str,
        count: usize,
    ) -> Result<Vec<JsonValue>, GenerationError> {
        match self {
            Generator::Llm(service) => {
                service
                    .request_raw_questions(test_type, section, count)
                    .await
            }
            Generator::Fixture(fixture) => {
                fixture
                    .request_raw_questions(test_type, section, count)
                    .await
            }
        }
    }
}
