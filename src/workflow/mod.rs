pub mod question_normalizer;
pub mod section_ctx;

pub use question_normalizer::{
    NormalizeReport, QuestionNormalizer, RejectionReason, ValidatedQuestion,
};
pub use section_ctx::SectionCtx;
