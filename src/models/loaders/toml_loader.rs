use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as JsonValue;
use tokio::fs;

use crate::error::{ConfigError, GenerationError};
use crate::models::test_config::{TestConfig, TestType};

/// 离线题库：分区名 -> 原始题目列表
pub type FixtureBank = BTreeMap<String, Vec<JsonValue>>;

/// 从 TOML 文件加载考试配置覆盖项
///
/// 文件的顶层键是考试类型（`PAA` / `OTIS`），值是 `TestConfig`。
/// 每个条目都会经过 `TestConfig::validate` 校验。
pub async fn load_catalog_overrides(
    path: &Path,
) -> Result<BTreeMap<TestType, TestConfig>, ConfigError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::ReadFailed {
            path: display.clone(),
            source,
        })?;

    parse_catalog_overrides(&content, &display)
}

fn parse_catalog_overrides(
    content: &str,
    display: &str,
) -> Result<BTreeMap<TestType, TestConfig>, ConfigError> {
    let raw: BTreeMap<String, TestConfig> =
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: display.to_string(),
            source,
        })?;

    let mut overrides = BTreeMap::new();
    for (key, config) in raw {
        let test_type: TestType = key.parse()?;
        config.validate(test_type.name())?;
        tracing::info!(
            "加载考试配置: {} ({} 题, {} 分钟)",
            test_type,
            config.questions,
            config.duration
        );
        overrides.insert(test_type, config);
    }

    Ok(overrides)
}

/// 加载离线题库（`.toml` 或 `.json`）
///
/// 顶层键为分区名，值为原始题目数组，题目不在此处校验。
pub async fn load_fixture_bank(path: &Path) -> Result<FixtureBank, GenerationError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| GenerationError::fixture_load_failed(&display, e))?;

    let bank: FixtureBank = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| GenerationError::fixture_load_failed(&display, e))?,
        _ => toml::from_str(&content)
            .map_err(|e| GenerationError::fixture_load_failed(&display, e))?,
    };

    for (section, items) in &bank {
        tracing::info!("题库分区 '{}': {} 道原始题目", section, items.len());
    }

    Ok(bank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_overrides() {
        let content = r#"
[PAA]
questions = 3
duration = 5
sections = ["A", "B"]

[PAA.questionsPerSection]
A = 2
B = 1
"#;
        let overrides = parse_catalog_overrides(content, "catalog.toml").unwrap();
        let paa = &overrides[&TestType::Paa];
        assert_eq!(paa.questions, 3);
        assert_eq!(paa.count_for("A"), 2);
        assert!(paa.simulation_requires_access);
    }

    #[test]
    fn test_parse_catalog_overrides_rejects_bad_quota() {
        let content = r#"
[OTIS]
questions = 10
duration = 5
sections = ["A"]
simulationRequiresAccess = false

[OTIS.questionsPerSection]
A = 2
"#;
        let err = parse_catalog_overrides(content, "catalog.toml").unwrap_err();
        assert!(matches!(err, ConfigError::QuotaMismatch { .. }));
    }

    #[test]
    fn test_parse_catalog_overrides_rejects_unknown_type() {
        let content = r#"
[SAT]
questions = 1
duration = 5
sections = ["A"]

[SAT.questionsPerSection]
A = 1
"#;
        let err = parse_catalog_overrides(content, "catalog.toml").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTestType(_)));
    }

    #[tokio::test]
    async fn test_load_fixture_bank_toml() {
        let path = std::env::temp_dir().join(format!(
            "exam_sim_bank_{}.toml",
            std::process::id()
        ));
        let content = r#"
[["Razonamiento Verbal"]]
text = "¿Antónimo de alto?"
options = [{ id = "A", text = "bajo" }, { id = "B", text = "grande" }]
correctAnswerId = "A"
explanation = "Bajo es lo contrario de alto."
"#;
        tokio::fs::write(&path, content).await.unwrap();

        let bank = load_fixture_bank(&path).await.unwrap();
        let items = &bank["Razonamiento Verbal"];
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["correctAnswerId"], "A");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_fixture_bank_missing_file() {
        let path = std::env::temp_dir().join("exam_sim_bank_does_not_exist.json");
        let err = load_fixture_bank(&path).await.unwrap_err();
        assert!(matches!(err, GenerationError::FixtureLoadFailed { .. }));
    }
}
