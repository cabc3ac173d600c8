use serde::{Deserialize, Serialize};

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// 选项标识，如 "A"、"B"
    pub id: String,
    pub text: String,
}

/// 经过校验的题目
///
/// `correct_answer_id` 必定等于 `options` 中恰好一个选项的 `id`（严格模式下）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// 组卷时分配的全局序号，从 1 开始
    pub id: u32,
    pub section: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer_id: String,
    pub explanation: String,
}

impl Question {
    /// 查找选项
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// 正确选项
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.option(&self.correct_answer_id)
    }

    pub fn is_correct(&self, option_id: Option<&str>) -> bool {
        option_id == Some(self.correct_answer_id.as_str())
    }
}

/// 生成协作方返回的原始题目（未校验）
///
/// 所有字段都可能缺失或类型错误，因此全部是 `Option`，
/// 由 `QuestionNormalizer` 负责判断是否可用。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<RawOption>>,
    #[serde(default)]
    pub correct_answer_id: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOption {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_serializes_camel_case() {
        let q = Question {
            id: 1,
            section: "Razonamiento Verbal".to_string(),
            text: "¿Sinónimo de rápido?".to_string(),
            options: vec![
                QuestionOption { id: "A".to_string(), text: "veloz".to_string() },
                QuestionOption { id: "B".to_string(), text: "lento".to_string() },
            ],
            correct_answer_id: "A".to_string(),
            explanation: "Veloz significa rápido.".to_string(),
        };

        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswerId"], "A");
        assert_eq!(json["section"], "Razonamiento Verbal");
        assert_eq!(q.correct_option().unwrap().text, "veloz");
        assert!(q.is_correct(Some("A")));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn test_raw_question_tolerates_missing_fields() {
        let raw: RawQuestion = serde_json::from_str(r#"{"text": "hola"}"#).unwrap();
        assert_eq!(raw.text.as_deref(), Some("hola"));
        assert!(raw.options.is_none());
        assert!(raw.correct_answer_id.is_none());
    }
}
