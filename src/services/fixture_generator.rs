//! 本地题库生成器
//!
//! 离线运行或测试时代替 LLM。每个分区维护一个游标，
//! 补题请求会拿到之前没发过的题目；分区用完后从头开始，
//! 同一个生成器可以反复组卷。

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::loaders::{load_fixture_bank, FixtureBank};
use crate::models::TestType;
use crate::services::QuestionGenerator;

pub struct FixtureGenerator {
    bank: FixtureBank,
    cursors: Mutex<BTreeMap<String, usize>>,
}

impl FixtureGenerator {
    pub fn from_bank(bank: FixtureBank) -> Self {
        Self {
            bank,
            cursors: Mutex::new(BTreeMap::new()),
        }
    }

    /// 从文件加载题库
    pub async fn load(path: &Path) -> Result<Self, GenerationError> {
        Ok(Self::from_bank(load_fixture_bank(path).await?))
    }

    /// 取出下一批题目并推进游标
    fn take(&self, section: &str, count: usize) -> Result<Vec<JsonValue>, GenerationError> {
        let items = self
            .bank
            .get(section)
            .ok_or_else(|| GenerationError::UnknownSection {
                section: section.to_string(),
            })?;

        let mut cursors = match self.cursors.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let cursor = cursors.entry(section.to_string()).or_insert(0);
        if *cursor >= items.len() {
            debug!("题库分区 '{}' 已用完，从头开始", section);
            *cursor = 0;
        }

        let start = *cursor;
        let end = (start + count).min(items.len());
        *cursor = end;

        if end - start < count {
            warn!(
                "题库分区 '{}' 题目不足: 请求 {}，剩余 {}",
                section,
                count,
                end - start
            );
        }

        Ok(items[start..end].to_vec())
    }
}

impl QuestionGenerator for FixtureGenerator {
    async fn request_raw_questions(
        &self,
        test_type: TestType,
        section: &str,
        count: usize,
    ) -> Result<Vec<JsonValue>, GenerationError> {
        debug!("[{} 分区 {}] 从本地题库读取 {} 道题", test_type, section, count);
        self.take(section, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bank() -> FixtureBank {
        let mut bank = FixtureBank::new();
        bank.insert(
            "A".to_string(),
            (0..3).map(|i| json!({ "text": format!("q{}", i) })).collect(),
        );
        bank
    }

    #[tokio::test]
    async fn test_serves_items_in_order() {
        let generator = FixtureGenerator::from_bank(bank());

        let first = generator
            .request_raw_questions(TestType::Paa, "A", 2)
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0]["text"], "q0");

        let second = generator
            .request_raw_questions(TestType::Paa, "A", 2)
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["text"], "q2");

        let third = generator
            .request_raw_questions(TestType::Paa, "A", 2)
            .await
            .unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(third[0]["text"], "q0");
        assert_eq!(third[1]["text"], "q1");
    }

    #[tokio::test]
    async fn test_exhausted_section_starts_over() {
        let generator = FixtureGenerator::from_bank(bank());

        let all = generator
            .request_raw_questions(TestType::Paa, "A", 5)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let again = generator
            .request_raw_questions(TestType::Paa, "A", 3)
            .await
            .unwrap();
        let texts: Vec<&str> = again.iter().filter_map(|v| v["text"].as_str()).collect();
        assert_eq!(texts, vec!["q0", "q1", "q2"]);
    }

    #[tokio::test]
    async fn test_empty_section_yields_nothing() {
        let mut bank = bank();
        bank.insert("E".to_string(), Vec::new());
        let generator = FixtureGenerator::from_bank(bank);

        for _ in 0..2 {
            let items = generator
                .request_raw_questions(TestType::Paa, "E", 2)
                .await
                .unwrap();
            assert!(items.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_section_fails() {
        let generator = FixtureGenerator::from_bank(bank());
        let err = generator
            .request_raw_questions(TestType::Otis, "Z", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnknownSection { .. }));
    }
}
