use thiserror::Error;

use crate::models::TestType;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 题目生成失败（整个组卷失败）
    #[error("题目生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 所有分区校验后没有任何有效题目
    #[error("AI 未能生成有效题目 ({test_type})，请重试")]
    EmptyQuestionSet { test_type: TestType },
    /// 模拟考模式需要付费权限
    #[error("{test_type} 的模拟考模式需要高级权限")]
    AccessDenied { test_type: TestType },
    /// 历史记录读写错误
    #[error("历史记录错误: {0}")]
    History(#[from] HistoryError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 题目生成协作方错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 未配置 API 密钥
    #[error("未配置 LLM API 密钥 (LLM_API_KEY)")]
    MissingCredential,
    /// API 密钥无效
    #[error("LLM API 密钥无效或未授权: {message}")]
    InvalidCredential { message: String },
    /// API 调用失败（网络错误、非成功状态码等）
    #[error("LLM API 调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM 返回内容为空 (分区: {section})")]
    EmptyContent { section: String },
    /// 返回内容无法解析为 JSON
    #[error("无法解析 LLM 返回的 JSON (分区: {section}): {source}")]
    UnparseablePayload {
        section: String,
        source: serde_json::Error,
    },
    /// 返回的 JSON 不是数组
    #[error("LLM 返回的不是题目数组 (分区: {section})")]
    NotAnArray { section: String },
    /// 题库文件中没有该分区
    #[error("题库中不存在分区: {section}")]
    UnknownSection { section: String },
    /// 题库文件读取失败
    #[error("题库文件加载失败 ({path}): {source}")]
    FixtureLoadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 历史记录错误
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("写入历史记录失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
    #[error("历史记录序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 分区题量之和与总题量不一致
    #[error("{test_type} 配置无效: 分区题量之和 {sum} 不等于总题量 {total}")]
    QuotaMismatch {
        test_type: String,
        sum: usize,
        total: usize,
    },
    /// 分区缺少题量配置
    #[error("{test_type} 配置无效: 分区 '{section}' 没有题量")]
    MissingSectionCount { test_type: String, section: String },
    /// 分区重复出现
    #[error("{test_type} 配置无效: 分区 '{section}' 重复")]
    DuplicateSection { test_type: String, section: String },
    /// 题量表中有未列出的分区
    #[error("{test_type} 配置无效: 题量表中的分区 '{section}' 不在分区列表中")]
    UnlistedSection { test_type: String, section: String },
    /// 时长为 0
    #[error("{test_type} 配置无效: 时长必须大于 0")]
    ZeroDuration { test_type: String },
    /// 未知的考试类型
    #[error("未知的考试类型: {0}")]
    UnknownTestType(String),
    /// 未知的考试模式
    #[error("未知的考试模式: {0}")]
    UnknownTestMode(String),
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        source: toml::de::Error,
    },
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<async_openai::error::OpenAIError> for GenerationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        let message = err.to_string();
        if message.contains("API key") || message.contains("401") || message.contains("Unauthorized") {
            GenerationError::InvalidCredential { message }
        } else {
            GenerationError::ApiCallFailed {
                model: String::new(),
                source: Box::new(err),
            }
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 是否应提示用户重试（生成失败和空题集同样处理）
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Generation(_) | AppError::EmptyQuestionSet { .. })
    }
}

impl GenerationError {
    /// 创建题库加载失败错误
    pub fn fixture_load_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GenerationError::FixtureLoadFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
