use std::str::FromStr;

/// 题目来源
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionSource {
    /// 调用兼容 OpenAI 的 LLM 接口生成
    Llm,
    /// 从本地题库文件读取
    Fixture,
}

impl FromStr for QuestionSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm" | "ai" => Ok(QuestionSource::Llm),
            "fixture" | "file" => Ok(QuestionSource::Fixture),
            _ => Err(()),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 题目来源 ---
    pub question_source: QuestionSource,
    /// 离线题库文件（`.toml` / `.json`）
    pub fixture_file: String,
    /// 考试配置覆盖文件，为空时使用内置配置
    pub test_catalog_file: Option<String>,
    // --- 本地存储 ---
    /// 历史记录文件，为空时只保存在内存中
    pub history_file: Option<String>,
    /// 高级权限标记文件
    pub access_file: String,
    // --- 组卷策略 ---
    /// 各分区是否并发请求
    pub concurrent_sections: bool,
    /// 正确答案必须对应某个选项，否则丢弃该题
    pub strict_answer_key: bool,
    /// 分区校验后题量不足时的补题次数
    pub section_top_up_attempts: usize,
    // --- 界面 ---
    /// 练习模式下作答后显示解析的延迟（毫秒）
    pub reveal_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.75,
            llm_max_tokens: 8192,
            question_source: QuestionSource::Llm,
            fixture_file: "question_bank.toml".to_string(),
            test_catalog_file: None,
            history_file: Some("exam_history.json".to_string()),
            access_file: ".premium_access".to_string(),
            concurrent_sections: true,
            strict_answer_key: true,
            section_top_up_attempts: 1,
            reveal_delay_ms: 300,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: parse_env("LLM_TEMPERATURE").unwrap_or(default.llm_temperature),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS").unwrap_or(default.llm_max_tokens),
            question_source: parse_env("QUESTION_SOURCE").unwrap_or(default.question_source),
            fixture_file: std::env::var("FIXTURE_FILE").unwrap_or(default.fixture_file),
            test_catalog_file: optional_env("TEST_CATALOG_FILE").or(default.test_catalog_file),
            history_file: match std::env::var("HISTORY_FILE") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v),
                Err(_) => default.history_file,
            },
            access_file: std::env::var("ACCESS_FILE").unwrap_or(default.access_file),
            concurrent_sections: parse_env("CONCURRENT_SECTIONS").unwrap_or(default.concurrent_sections),
            strict_answer_key: parse_env("STRICT_ANSWER_KEY").unwrap_or(default.strict_answer_key),
            section_top_up_attempts: parse_env("SECTION_TOP_UP_ATTEMPTS").unwrap_or(default.section_top_up_attempts),
            reveal_delay_ms: parse_env("REVEAL_DELAY_MS").unwrap_or(default.reveal_delay_ms),
            verbose_logging: parse_env("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
