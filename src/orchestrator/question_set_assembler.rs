//! 组卷器 - 编排层
//!
//! ## 职责
//!
//! 按考试配置逐个分区请求题目，校验、补题、编号，最后整体打乱。
//!
//! ## 核心流程
//!
//! 1. **分区请求**：每个分区一次请求（题量为 0 的分区跳过），可并发
//! 2. **校验**：委托 `QuestionNormalizer`，不合格的题目丢弃并计数
//! 3. **补题**：分区题量不足时按配置重新请求缺口
//! 4. **编号**：按分区顺序从 1 开始分配全局 id
//! 5. **打乱**：整体打乱题目顺序
//!
//! ## 失败策略
//!
//! - 任一分区请求失败，整个组卷失败（并发时其余请求被丢弃）
//! - 全部分区处理完后没有任何有效题目，同样失败

use std::collections::BTreeMap;

use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};
use crate::models::{Question, TestConfig, TestType};
use crate::services::QuestionGenerator;
use crate::utils::shuffled_with;
use crate::workflow::{QuestionNormalizer, SectionCtx, ValidatedQuestion};

/// 组卷结果
#[derive(Debug, Clone)]
pub struct QuestionSet {
    /// 已打乱的题目
    pub questions: Vec<Question>,
    pub report: AssemblyReport,
}

/// 组卷统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    /// 配置要求的总题量
    pub requested: usize,
    /// 实际交付的题量
    pub delivered: usize,
    /// 校验丢弃的题量
    pub rejected: usize,
    /// 题量不足的分区及缺口
    pub shortfalls: Vec<(String, usize)>,
}

/// 单个分区的校验结果
#[derive(Debug)]
struct SectionBatch {
    ctx: SectionCtx,
    questions: Vec<ValidatedQuestion>,
    rejected: usize,
}

/// 组卷器
pub struct QuestionSetAssembler<G> {
    generator: G,
    normalizer: QuestionNormalizer,
    concurrent_sections: bool,
    top_up_attempts: usize,
}

impl<G: QuestionGenerator> QuestionSetAssembler<G> {
    pub fn new(generator: G, config: &Config) -> Self {
        Self {
            generator,
            normalizer: QuestionNormalizer::new(config.strict_answer_key),
            concurrent_sections: config.concurrent_sections,
            top_up_attempts: config.section_top_up_attempts,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// 按考试配置组卷
    pub async fn assemble_for(&self, test_type: TestType, config: &TestConfig) -> AppResult<QuestionSet> {
        self.assemble(test_type, &config.sections, &config.questions_per_section)
            .await
    }

    /// 组卷
    ///
    /// # 参数
    /// - `test_type`: 考试类型
    /// - `sections`: 分区顺序
    /// - `per_section`: 分区 -> 题量，缺失按 0 处理
    pub async fn assemble(
        &self,
        test_type: TestType,
        sections: &[String],
        per_section: &BTreeMap<String, usize>,
    ) -> AppResult<QuestionSet> {
        let batches = self.collect_sections(test_type, sections, per_section).await?;
        build_question_set(test_type, batches, &mut rand::thread_rng())
    }

    /// 使用固定种子组卷，结果可复现
    pub async fn assemble_seeded(
        &self,
        test_type: TestType,
        sections: &[String],
        per_section: &BTreeMap<String, usize>,
        seed: u64,
    ) -> AppResult<QuestionSet> {
        let batches = self.collect_sections(test_type, sections, per_section).await?;
        build_question_set(test_type, batches, &mut StdRng::seed_from_u64(seed))
    }

    /// 请求并校验所有分区，结果保持分区顺序
    async fn collect_sections(
        &self,
        test_type: TestType,
        sections: &[String],
        per_section: &BTreeMap<String, usize>,
    ) -> Result<Vec<SectionBatch>, GenerationError> {
        let contexts: Vec<SectionCtx> = sections
            .iter()
            .enumerate()
            .filter_map(|(index, section)| {
                let quota = per_section.get(section).copied().unwrap_or(0);
                (quota > 0).then(|| SectionCtx::new(test_type, section.clone(), index, quota))
            })
            .collect();

        info!(
            "[{}] 📦 开始组卷: {} 个分区 ({})",
            test_type,
            contexts.len(),
            if self.concurrent_sections { "并发" } else { "顺序" }
        );

        if self.concurrent_sections {
            // try_join_all 保持输入顺序，任一失败即丢弃其余请求
            try_join_all(contexts.into_iter().map(|ctx| self.fill_section(ctx))).await
        } else {
            let mut batches = Vec::with_capacity(contexts.len());
            for ctx in contexts {
                batches.push(self.fill_section(ctx).await?);
            }
            Ok(batches)
        }
    }

    /// 请求一个分区，题量不足时补题
    async fn fill_section(&self, ctx: SectionCtx) -> Result<SectionBatch, GenerationError> {
        let mut questions: Vec<ValidatedQuestion> = Vec::with_capacity(ctx.quota);
        let mut rejected = 0;
        let mut attempt = 0;

        loop {
            let missing = ctx.quota - questions.len();
            let raws = self
                .generator
                .request_raw_questions(ctx.test_type, &ctx.section, missing)
                .await
                .map_err(|e| {
                    warn!("{} ❌ 请求失败: {}", ctx, e);
                    e
                })?;

            let report = self.normalizer.validate_batch(&ctx, &raws);
            rejected += report.rejected;
            questions.extend(report.valid);

            if questions.len() >= ctx.quota {
                // 多给的题目截断到配额
                questions.truncate(ctx.quota);
                break;
            }
            if raws.is_empty() || attempt >= self.top_up_attempts {
                break;
            }

            attempt += 1;
            info!(
                "{} 🔁 有效题目 {}/{}，第 {} 次补题",
                ctx,
                questions.len(),
                ctx.quota,
                attempt
            );
        }

        if questions.len() < ctx.quota {
            warn!(
                "{} ⚠️ 题量不足: {}/{}（丢弃 {} 道）",
                ctx,
                questions.len(),
                ctx.quota,
                rejected
            );
        } else {
            info!("{} ✓ 分区完成（丢弃 {} 道）", ctx, rejected);
        }

        Ok(SectionBatch {
            ctx,
            questions,
            rejected,
        })
    }
}

/// 按分区顺序编号并整体打乱
fn build_question_set<R: Rng + ?Sized>(
    test_type: TestType,
    batches: Vec<SectionBatch>,
    rng: &mut R,
) -> AppResult<QuestionSet> {
    let mut report = AssemblyReport::default();
    let mut ordered = Vec::new();
    let mut next_id: u32 = 1;

    for batch in batches {
        report.requested += batch.ctx.quota;
        report.rejected += batch.rejected;
        if batch.questions.len() < batch.ctx.quota {
            report
                .shortfalls
                .push((batch.ctx.section.clone(), batch.ctx.quota - batch.questions.len()));
        }

        for validated in batch.questions {
            ordered.push(validated.into_question(next_id, &batch.ctx.section, rng));
            next_id += 1;
        }
    }

    if ordered.is_empty() {
        return Err(AppError::EmptyQuestionSet { test_type });
    }

    report.delivered = ordered.len();
    info!("[{}] ✓ 共生成 {} 道题目", test_type, report.delivered);

    Ok(QuestionSet {
        questions: shuffled_with(&ordered, rng),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JsonValue};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    fn raw(section: &str, n: usize) -> JsonValue {
        json!({
            "text": format!("{} pregunta {}", section, n),
            "options": [
                { "id": "A", "text": "uno" },
                { "id": "B", "text": "dos" },
                { "id": "C", "text": "tres" },
                { "id": "D", "text": "cuatro" }
            ],
            "correctAnswerId": "C",
            "explanation": "Porque sí."
        })
    }

    fn malformed() -> JsonValue {
        json!({ "text": "sin respuesta", "options": [{ "id": "A", "text": "x" }] })
    }

    /// 按分区返回预设题目的桩，记录每次请求的题量
    #[derive(Default)]
    struct StubGenerator {
        responses: Mutex<HashMap<String, Vec<Vec<JsonValue>>>>,
        failing: Option<String>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl StubGenerator {
        fn well_formed(counts: &[(&str, usize)]) -> Self {
            let stub = Self::default();
            for (section, n) in counts {
                stub.push(section, (0..*n).map(|i| raw(section, i)).collect());
            }
            stub
        }

        fn push(&self, section: &str, batch: Vec<JsonValue>) {
            self.responses
                .lock()
                .unwrap()
                .entry(section.to_string())
                .or_default()
                .push(batch);
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl QuestionGenerator for StubGenerator {
        async fn request_raw_questions(
            &self,
            _test_type: TestType,
            section: &str,
            count: usize,
        ) -> Result<Vec<JsonValue>, GenerationError> {
            self.calls.lock().unwrap().push((section.to_string(), count));
            if self.failing.as_deref() == Some(section) {
                return Err(GenerationError::NotAnArray {
                    section: section.to_string(),
                });
            }
            let mut responses = self.responses.lock().unwrap();
            let queue = responses.entry(section.to_string()).or_default();
            Ok(if queue.is_empty() { Vec::new() } else { queue.remove(0) })
        }
    }

    fn assembler(stub: StubGenerator, top_up_attempts: usize, concurrent: bool) -> QuestionSetAssembler<StubGenerator> {
        let config = Config {
            section_top_up_attempts: top_up_attempts,
            concurrent_sections: concurrent,
            ..Config::default()
        };
        QuestionSetAssembler::new(stub, &config)
    }

    fn plan(counts: &[(&str, usize)]) -> (Vec<String>, BTreeMap<String, usize>) {
        (
            counts.iter().map(|(s, _)| s.to_string()).collect(),
            counts.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
        )
    }

    #[tokio::test]
    async fn test_two_sections_example() {
        let counts = [("A", 2), ("B", 1)];
        let (sections, per_section) = plan(&counts);
        let assembler = assembler(StubGenerator::well_formed(&counts), 0, true);

        let set = assert_ok!(
            assembler
                .assemble_seeded(TestType::Paa, &sections, &per_section, 5)
                .await
        );

        assert_eq!(set.questions.len(), 3);
        let mut by_id = set.questions.clone();
        by_id.sort_by_key(|q| q.id);
        let ids: Vec<u32> = by_id.iter().map(|q| q.id).collect();
        let labels: Vec<&str> = by_id.iter().map(|q| q.section.as_str()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(labels, vec!["A", "A", "B"]);
        assert_eq!(set.report.delivered, 3);
        assert!(set.report.shortfalls.is_empty());
    }

    #[tokio::test]
    async fn test_quota_law_for_each_section() {
        let counts = [("Verbal", 4), ("Matemático", 3), ("Redacción", 5)];
        let (sections, per_section) = plan(&counts);

        for concurrent in [true, false] {
            let assembler = assembler(StubGenerator::well_formed(&counts), 1, concurrent);
            let set = assembler
                .assemble(TestType::Paa, &sections, &per_section)
                .await
                .unwrap();

            assert_eq!(set.questions.len(), 12);
            for (section, n) in counts {
                assert_eq!(
                    set.questions.iter().filter(|q| q.section == section).count(),
                    n
                );
            }
            for q in &set.questions {
                assert_eq!(
                    q.options.iter().filter(|o| o.id == q.correct_answer_id).count(),
                    1
                );
            }
        }
    }

    #[tokio::test]
    async fn test_zero_count_section_is_skipped() {
        let (sections, per_section) = plan(&[("A", 1), ("B", 0)]);
        let stub = StubGenerator::well_formed(&[("A", 1)]);
        let assembler = assembler(stub, 0, false);

        let set = assembler
            .assemble(TestType::Otis, &sections, &per_section)
            .await
            .unwrap();
        assert_eq!(set.questions.len(), 1);
        assert_eq!(assembler.generator().calls(), vec![("A".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_section_failure_fails_whole_assembly() {
        let counts = [("A", 2), ("B", 2)];
        let (sections, per_section) = plan(&counts);
        let mut stub = StubGenerator::well_formed(&counts);
        stub.failing = Some("B".to_string());
        let assembler = assembler(stub, 0, true);

        let err = assert_err!(
            assembler
                .assemble(TestType::Paa, &sections, &per_section)
                .await
        );
        assert!(matches!(err, AppError::Generation(GenerationError::NotAnArray { .. })));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_all_rejected_is_empty_failure() {
        let (sections, per_section) = plan(&[("A", 2)]);
        let stub = StubGenerator::default();
        stub.push("A", vec![malformed(), malformed()]);
        let assembler = assembler(stub, 0, true);

        let err = assembler
            .assemble(TestType::Paa, &sections, &per_section)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyQuestionSet { test_type: TestType::Paa }));
    }

    #[tokio::test]
    async fn test_top_up_fills_shortfall() {
        let (sections, per_section) = plan(&[("A", 3)]);
        let stub = StubGenerator::default();
        stub.push("A", vec![raw("A", 0), malformed(), raw("A", 1)]);
        stub.push("A", vec![raw("A", 2)]);
        let assembler = assembler(stub, 1, true);

        let set = assembler
            .assemble(TestType::Paa, &sections, &per_section)
            .await
            .unwrap();

        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.report.rejected, 1);
        assert_eq!(
            assembler.generator().calls(),
            vec![("A".to_string(), 3), ("A".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_partial_loss_tolerated_without_top_up() {
        let (sections, per_section) = plan(&[("A", 3)]);
        let stub = StubGenerator::default();
        stub.push("A", vec![raw("A", 0), malformed(), malformed()]);
        let assembler = assembler(stub, 0, true);

        let set = assembler
            .assemble(TestType::Paa, &sections, &per_section)
            .await
            .unwrap();

        assert_eq!(set.questions.len(), 1);
        assert_eq!(set.report.shortfalls, vec![("A".to_string(), 2)]);
        assert_eq!(set.report.rejected, 2);
    }

    #[tokio::test]
    async fn test_over_delivery_is_truncated() {
        let (sections, per_section) = plan(&[("A", 2)]);
        let stub = StubGenerator::well_formed(&[("A", 5)]);
        let assembler = assembler(stub, 0, true);

        let set = assembler
            .assemble(TestType::Paa, &sections, &per_section)
            .await
            .unwrap();
        assert_eq!(set.questions.len(), 2);
    }

    #[tokio::test]
    async fn test_seeded_assembly_is_reproducible() {
        let counts = [("A", 3), ("B", 3)];
        let (sections, per_section) = plan(&counts);

        let first = assembler(StubGenerator::well_formed(&counts), 0, true)
            .assemble_seeded(TestType::Paa, &sections, &per_section, 42)
            .await
            .unwrap();
        let second = assembler(StubGenerator::well_formed(&counts), 0, true)
            .assemble_seeded(TestType::Paa, &sections, &per_section, 42)
            .await
            .unwrap();

        assert_eq!(first.questions, second.questions);
    }
}
