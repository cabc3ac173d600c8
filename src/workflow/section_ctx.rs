//! 分区处理上下文
//!
//! 封装"我正在为哪种考试的哪个分区出题"这一信息

use std::fmt::Display;

use crate::models::TestType;

/// 分区处理上下文
#[derive(Debug, Clone)]
pub struct SectionCtx {
    pub test_type: TestType,

    /// 分区名
    pub section: String,

    /// 分区在考试配置中的顺序（从 0 开始，仅用于日志和排序）
    pub section_index: usize,

    /// 配置要求的题量
    pub quota: usize,
}

impl SectionCtx {
    pub fn new(test_type: TestType, section: impl Into<String>, section_index: usize, quota: usize) -> Self {
        Self {
            test_type,
            section: section.into(),
            section_index,
            quota,
        }
    }
}

impl Display for SectionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} 分区#{} {} 配额#{}]",
            self.test_type,
            self.section_index + 1,
            self.section,
            self.quota
        )
    }
}
