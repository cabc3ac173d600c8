use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 考试类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestType {
    /// Prueba de Aptitud Académica (UFM)
    #[serde(rename = "PAA")]
    Paa,
    /// OTIS 智力测验
    #[serde(rename = "OTIS")]
    Otis,
}

impl TestType {
    pub const ALL: [TestType; 2] = [TestType::Paa, TestType::Otis];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            TestType::Paa => "PAA",
            TestType::Otis => "OTIS",
        }
    }
}

impl FromStr for TestType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PAA" => Ok(TestType::Paa),
            "OTIS" => Ok(TestType::Otis),
            _ => Err(ConfigError::UnknownTestType(s.to_string())),
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 考试模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMode {
    /// 模拟考：倒计时，到时强制交卷，交卷后才有反馈
    #[serde(rename = "Simulacro")]
    Simulation,
    /// 练习：正计时，每题作答后显示解析
    #[serde(rename = "Práctica")]
    Practice,
}

impl TestMode {
    pub fn name(self) -> &'static str {
        match self {
            TestMode::Simulation => "Simulacro",
            TestMode::Practice => "Práctica",
        }
    }
}

impl FromStr for TestMode {
    type Err = ConfigError;

    /// 支持西语名称及常见的无重音写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulacro" | "simulation" | "sim" => Ok(TestMode::Simulation),
            "práctica" | "practica" | "practice" => Ok(TestMode::Practice),
            _ => Err(ConfigError::UnknownTestMode(s.to_string())),
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单种考试的静态配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    /// 总题量
    pub questions: usize,
    /// 时长（分钟）
    pub duration: u64,
    /// 分区顺序
    pub sections: Vec<String>,
    /// 分区 -> 题量
    pub questions_per_section: BTreeMap<String, usize>,
    /// 模拟考模式是否需要付费权限
    #[serde(default = "default_requires_access")]
    pub simulation_requires_access: bool,
}

fn default_requires_access() -> bool {
    true
}

impl TestConfig {
    /// `duration` 单位为分钟，总题量由分区题量相加得出
    pub fn new(duration: u64, sections: &[(&str, usize)]) -> Self {
        Self {
            questions: sections.iter().map(|(_, n)| n).sum(),
            duration,
            sections: sections.iter().map(|(s, _)| s.to_string()).collect(),
            questions_per_section: sections.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
            simulation_requires_access: true,
        }
    }

    /// 时长（秒）
    pub fn duration_secs(&self) -> u64 {
        self.duration * 60
    }

    pub fn count_for(&self, section: &str) -> usize {
        self.questions_per_section.get(section).copied().unwrap_or(0)
    }

    /// 校验：分区不重复且与题量表一一对应，题量之和等于总题量，时长大于 0
    pub fn validate(&self, test_type: &str) -> Result<(), ConfigError> {
        if self.duration == 0 {
            return Err(ConfigError::ZeroDuration {
                test_type: test_type.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.as_str()) {
                return Err(ConfigError::DuplicateSection {
                    test_type: test_type.to_string(),
                    section: section.clone(),
                });
            }
            if !self.questions_per_section.contains_key(section) {
                return Err(ConfigError::MissingSectionCount {
                    test_type: test_type.to_string(),
                    section: section.clone(),
                });
            }
        }

        if let Some(section) = self
            .questions_per_section
            .keys()
            .find(|s| !seen.contains(s.as_str()))
        {
            return Err(ConfigError::UnlistedSection {
                test_type: test_type.to_string(),
                section: section.clone(),
            });
        }

        let sum: usize = self.questions_per_section.values().sum();
        if sum != self.questions {
            return Err(ConfigError::QuotaMismatch {
                test_type: test_type.to_string(),
                sum,
                total: self.questions,
            });
        }

        Ok(())
    }
}

/// 考试目录：考试类型 -> 配置
#[derive(Debug, Clone)]
pub struct TestCatalog {
    configs: BTreeMap<TestType, TestConfig>,
}

impl TestCatalog {
    /// 内置目录
    pub fn builtin() -> Self {
        let mut configs = BTreeMap::new();
        configs.insert(
            TestType::Paa,
            TestConfig::new(
                75,
                &[
                    ("Razonamiento Verbal", 20),
                    ("Razonamiento Matemático", 20),
                    ("Redacción Indirecta", 20),
                ],
            ),
        );
        configs.insert(
            TestType::Otis,
            TestConfig::new(
                30,
                &[
                    ("Razonamiento Deductivo/Inductivo", 25),
                    ("Léxico y Comprensión Verbal", 25),
                    ("Rapidez y Precisión Perceptiva", 25),
                ],
            ),
        );
        Self { configs }
    }

    /// 用校验过的配置覆盖内置目录中的条目
    pub fn with_overrides(
        mut self,
        overrides: BTreeMap<TestType, TestConfig>,
    ) -> Result<Self, ConfigError> {
        for (test_type, config) in overrides {
            config.validate(test_type.name())?;
            self.configs.insert(test_type, config);
        }
        Ok(self)
    }

    pub fn get(&self, test_type: TestType) -> Option<&TestConfig> {
        self.configs.get(&test_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TestType, &TestConfig)> {
        self.configs.iter()
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
