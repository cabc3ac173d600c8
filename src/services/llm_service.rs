//! LLM 服务 - 业务能力层
//!
//! 只负责"为一个分区生成 N 道原始题目"，不做校验，不关心组卷流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use std::sync::OnceLock;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::TestType;
use crate::services::QuestionGenerator;

/// 题目 JSON 结构说明，放在系统消息中
const QUESTION_SCHEMA_PROMPT: &str = r#"Responde únicamente con un arreglo JSON. Cada elemento debe tener exactamente esta forma:
{
  "text": "El texto de la pregunta.",
  "options": [
    { "id": "A", "text": "El texto de la opción." }
  ],
  "correctAnswerId": "La letra ID de la respuesta correcta.",
  "explanation": "Una explicación clara y concisa de por qué la respuesta es correcta."
}
Reglas:
- "options" debe tener de 4 a 5 posibles respuestas con ids A, B, C, D, E.
- "correctAnswerId" debe coincidir con el id de una de las opciones.
- No incluyas texto fuera del arreglo JSON."#;

/// LLM 服务
///
/// 职责：
/// - 按考试类型和分区构建西语提示词
/// - 调用 LLM API 并把返回内容解析为 JSON 数组
/// - 不校验单道题目（交给 `QuestionNormalizer`）
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
    has_credential: bool,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
            has_credential: !config.llm_api_key.trim().is_empty(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, GenerationError> {
        if !self.has_credential {
            return Err(GenerationError::MissingCredential);
        }

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            match GenerationError::from(e) {
                GenerationError::ApiCallFailed { source, .. } => GenerationError::ApiCallFailed {
                    model: self.model_name.clone(),
                    source,
                },
                other => other,
            }
        })?;

        debug!("LLM API 调用成功");

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}

impl QuestionGenerator for LlmService {
    async fn request_raw_questions(
        &self,
        test_type: TestType,
        section: &str,
        count: usize,
    ) -> Result<Vec<JsonValue>, GenerationError> {
        info!("[{} 分区 {}] 🤖 请求 {} 道题目", test_type, section, count);

        let prompt = build_prompt(test_type, section, count);
        let system_message = format!(
            "Eres un generador de exámenes de admisión. Devuelve un arreglo JSON de exactamente {} preguntas.\n{}",
            count, QUESTION_SCHEMA_PROMPT
        );

        let content = self.send_to_llm(&prompt, Some(&system_message)).await?;
        let items = parse_question_payload(&content, section)?;

        info!(
            "[{} 分区 {}] ✓ 收到 {} 道原始题目",
            test_type,
            section,
            items.len()
        );
        Ok(items)
    }
}

/// 构建分区提示词
fn build_prompt(test_type: TestType, section: &str, count: usize) -> String {
    let base = match test_type {
        TestType::Paa => format!(
            "Genera {} preguntas de opción múltiple para la sección \"{}\" de la prueba PAA (Prueba de Aptitud Académica) de la UFM.",
            count, section
        ),
        TestType::Otis => format!(
            "Genera {} preguntas de opción múltiple para un examen tipo OTIS, enfocado en \"{}\".",
            count, section
        ),
    };
    format!(
        "{} Las preguntas deben ser de dificultad universitaria y variada. No repitas preguntas.",
        base
    )
}

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("代码块正则无效")
    })
}

/// 解析 LLM 返回内容
///
/// 去掉 markdown 代码块后必须是 JSON 数组，否则整个分区失败。
fn parse_question_payload(content: &str, section: &str) -> Result<Vec<JsonValue>, GenerationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(GenerationError::EmptyContent {
            section: section.to_string(),
        });
    }

    let json_text = code_fence_regex()
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    let value: JsonValue =
        serde_json::from_str(json_text).map_err(|source| GenerationError::UnparseablePayload {
            section: section.to_string(),
            source,
        })?;

    match value {
        JsonValue::Array(items) => Ok(items),
        _ => Err(GenerationError::NotAnArray {
            section: section.to_string(),
        }),
    }
}
