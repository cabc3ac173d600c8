//! 题目校验与规整 - 流程层
//!
//! 核心职责：把生成协作方返回的不可信数据变成 `Question`
//!
//! 流程顺序：
//! 1. 结构校验（字段存在且非空，选项 id 唯一）
//! 2. 答案校验（`correctAnswerId` 必须对应某个选项，严格模式）
//! 3. 注入 id / 分区，打乱选项顺序
//!
//! 不合格的题目只会被丢弃并计数，不会向上抛错。

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::models::{Question, QuestionOption, RawQuestion};
use crate::utils::{shuffled_with, truncate_text};
use crate::workflow::SectionCtx;

/// 丢弃原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// 不是对象或字段类型错误
    MalformedShape(String),
    MissingText,
    MissingOptions,
    /// 第 n 个选项缺少 id 或文本
    InvalidOption { index: usize },
    DuplicateOptionId(String),
    MissingCorrectAnswer,
    /// 正确答案不对应任何选项
    AnswerKeyMismatch(String),
    MissingExplanation,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MalformedShape(msg) => write!(f, "结构错误: {}", msg),
            RejectionReason::MissingText => write!(f, "缺少题干"),
            RejectionReason::MissingOptions => write!(f, "缺少选项"),
            RejectionReason::InvalidOption { index } => {
                write!(f, "第 {} 个选项缺少 id 或文本", index + 1)
            }
            RejectionReason::DuplicateOptionId(id) => write!(f, "选项 id 重复: {}", id),
            RejectionReason::MissingCorrectAnswer => write!(f, "缺少正确答案"),
            RejectionReason::AnswerKeyMismatch(id) => {
                write!(f, "正确答案 '{}' 不对应任何选项", id)
            }
            RejectionReason::MissingExplanation => write!(f, "缺少解析"),
        }
    }
}

/// 通过校验、尚未分配 id 的题目
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuestion {
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer_id: String,
    pub explanation: String,
}

impl ValidatedQuestion {
    /// 注入 id 和分区，并打乱选项
    pub fn into_question<R: Rng + ?Sized>(self, id: u32, section: &str, rng: &mut R) -> Question {
        Question {
            id,
            section: section.to_string(),
            text: self.text,
            options: shuffled_with(&self.options, rng),
            correct_answer_id: self.correct_answer_id,
            explanation: self.explanation,
        }
    }
}

/// 一批原始题目的校验结果
#[derive(Debug, Default)]
pub struct NormalizeReport {
    pub valid: Vec<ValidatedQuestion>,
    pub rejected: usize,
}

/// 题目校验器
///
/// - 只处理单道题目
/// - 不持有随机源，打乱时由调用方传入
#[derive(Debug, Clone, Copy)]
pub struct QuestionNormalizer {
    strict_answer_key: bool,
}

impl QuestionNormalizer {
    /// # 参数
    /// - `strict_answer_key`: 为 true 时丢弃答案对不上选项的题目，否则只警告
    pub fn new(strict_answer_key: bool) -> Self {
        Self { strict_answer_key }
    }

    /// 校验单道原始题目
    pub fn validate(&self, raw: &JsonValue) -> Result<ValidatedQuestion, RejectionReason> {
        if !raw.is_object() {
            return Err(RejectionReason::MalformedShape(format!(
                "期望对象，实际为 {}",
                json_kind(raw)
            )));
        }

        let raw: RawQuestion = serde_json::from_value(raw.clone())
            .map_err(|e| RejectionReason::MalformedShape(e.to_string()))?;

        let text = non_empty(raw.text).ok_or(RejectionReason::MissingText)?;

        let raw_options = raw
            .options
            .filter(|o| !o.is_empty())
            .ok_or(RejectionReason::MissingOptions)?;

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(raw_options.len());
        for (index, option) in raw_options.into_iter().enumerate() {
            let (Some(id), Some(text)) = (non_empty(option.id), non_empty(option.text)) else {
                return Err(RejectionReason::InvalidOption { index });
            };
            if !seen.insert(id.clone()) {
                return Err(RejectionReason::DuplicateOptionId(id));
            }
            options.push(QuestionOption { id, text });
        }

        let correct_answer_id =
            non_empty(raw.correct_answer_id).ok_or(RejectionReason::MissingCorrectAnswer)?;

        if !seen.contains(&correct_answer_id) {
            if self.strict_answer_key {
                return Err(RejectionReason::AnswerKeyMismatch(correct_answer_id));
            }
            warn!(
                "⚠️ 正确答案 '{}' 不对应任何选项，非严格模式下保留",
                correct_answer_id
            );
        }

        let explanation = non_empty(raw.explanation).ok_or(RejectionReason::MissingExplanation)?;

        if !(4..=5).contains(&options.len()) {
            debug!("题目选项数量为 {}（期望 4-5 个）", options.len());
        }

        Ok(ValidatedQuestion {
            text,
            options,
            correct_answer_id,
            explanation,
        })
    }

    /// 校验并生成最终题目
    pub fn normalize<R: Rng + ?Sized>(
        &self,
        raw: &JsonValue,
        id: u32,
        section: &str,
        rng: &mut R,
    ) -> Result<Question, RejectionReason> {
        Ok(self.validate(raw)?.into_question(id, section, rng))
    }

    /// 校验一个分区返回的全部题目，丢弃不合格的并记录日志
    pub fn validate_batch(&self, ctx: &SectionCtx, raws: &[JsonValue]) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        for (index, raw) in raws.iter().enumerate() {
            match self.validate(raw) {
                Ok(question) => report.valid.push(question),
                Err(reason) => {
                    report.rejected += 1;
                    warn!(
                        "{} ⚠️ 丢弃第 {} 道题 ({}): {}",
                        ctx,
                        index + 1,
                        reason,
                        truncate_text(&raw.to_string(), 80)
                    );
                }
            }
        }

        report
    }
}

impl Default for QuestionNormalizer {
    fn default() -> Self {
        Self::new(true)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn well_formed() -> JsonValue {
        json!({
            "text": "¿Cuánto es 2 + 2?",
            "options": [
                { "id": "A", "text": "3" },
                { "id": "B", "text": "4" },
                { "id": "C", "text": "5" },
                { "id": "D", "text": "22" }
            ],
            "correctAnswerId": "B",
            "explanation": "2 + 2 = 4"
        })
    }

    fn with(mut raw: JsonValue, key: &str, value: JsonValue) -> JsonValue {
        raw[key] = value;
        raw
    }

    #[test]
    fn test_normalize_injects_id_and_section() {
        let normalizer = QuestionNormalizer::default();
        let mut rng = StdRng::seed_from_u64(3);

        let q = normalizer
            .normalize(&well_formed(), 7, "Razonamiento Matemático", &mut rng)
            .unwrap();

        assert_eq!(q.id, 7);
        assert_eq!(q.section, "Razonamiento Matemático");
        assert_eq!(q.options.len(), 4);
        assert_eq!(
            q.options.iter().filter(|o| o.id == q.correct_answer_id).count(),
            1
        );
        assert_eq!(q.correct_option().unwrap().text, "4");
    }

    #[test]
    fn test_options_are_a_permutation() {
        let normalizer = QuestionNormalizer::default();
        let mut rng = StdRng::seed_from_u64(11);
        let q = normalizer.normalize(&well_formed(), 1, "S", &mut rng).unwrap();

        let mut ids: Vec<&str> = q.options.iter().map(|o| o.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_rejects_missing_fields() {
        let normalizer = QuestionNormalizer::default();

        assert_eq!(
            normalizer.validate(&with(well_formed(), "text", json!("  "))),
            Err(RejectionReason::MissingText)
        );
        assert_eq!(
            normalizer.validate(&with(well_formed(), "options", json!([]))),
            Err(RejectionReason::MissingOptions)
        );
        assert_eq!(
            normalizer.validate(&with(well_formed(), "correctAnswerId", json!(""))),
            Err(RejectionReason::MissingCorrectAnswer)
        );
        assert_eq!(
            normalizer.validate(&with(well_formed(), "explanation", JsonValue::Null)),
            Err(RejectionReason::MissingExplanation)
        );
    }

    #[test]
    fn test_rejects_bad_options() {
        let normalizer = QuestionNormalizer::default();

        let missing_text = with(
            well_formed(),
            "options",
            json!([{ "id": "A", "text": "x" }, { "id": "B" }]),
        );
        assert_eq!(
            normalizer.validate(&missing_text),
            Err(RejectionReason::InvalidOption { index: 1 })
        );

        let duplicated = with(
            well_formed(),
            "options",
            json!([{ "id": "B", "text": "x" }, { "id": "B", "text": "y" }]),
        );
        assert_eq!(
            normalizer.validate(&duplicated),
            Err(RejectionReason::DuplicateOptionId("B".to_string()))
        );
    }

    #[test]
    fn test_rejects_malformed_shape() {
        let normalizer = QuestionNormalizer::default();
        assert!(matches!(
            normalizer.validate(&json!("texto suelto")),
            Err(RejectionReason::MalformedShape(_))
        ));
        assert!(matches!(
            normalizer.validate(&with(well_formed(), "text", json!(42))),
            Err(RejectionReason::MalformedShape(_))
        ));
        assert!(matches!(
            normalizer.validate(&JsonValue::Null),
            Err(RejectionReason::MalformedShape(_))
        ));
    }

    #[test]
    fn test_answer_key_mismatch_strict_vs_lenient() {
        let raw = with(well_formed(), "correctAnswerId", json!("E"));

        assert_eq!(
            QuestionNormalizer::new(true).validate(&raw),
            Err(RejectionReason::AnswerKeyMismatch("E".to_string()))
        );

        let kept = QuestionNormalizer::new(false).validate(&raw).unwrap();
        assert_eq!(kept.correct_answer_id, "E");
    }

    #[test]
    fn test_trims_whitespace() {
        let raw = json!({
            "text": "  Pregunta  ",
            "options": [{ "id": " A ", "text": " uno " }],
            "correctAnswerId": "A ",
            "explanation": " porque "
        });
        let q = QuestionNormalizer::default().validate(&raw).unwrap();
        assert_eq!(q.text, "Pregunta");
        assert_eq!(q.options[0].id, "A");
        assert_eq!(q.correct_answer_id, "A");
    }

    #[test]
    fn test_validate_batch_counts_rejections() {
        let normalizer = QuestionNormalizer::default();
        let ctx = SectionCtx::new(TestType::Paa, "Razonamiento Verbal", 0, 3);
        let raws = vec![
            well_formed(),
            json!({ "text": "sin opciones" }),
            well_formed(),
        ];

        let report = normalizer.validate_batch(&ctx, &raws);
        assert_eq!(report.valid.len(), 2);
        assert_eq!(report.rejected, 1);
    }
}
