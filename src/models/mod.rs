pub mod loaders;
pub mod question;
pub mod test_config;
pub mod test_result;

pub use loaders::{load_catalog_overrides, load_fixture_bank};
pub use question::{Question, QuestionOption, RawOption, RawQuestion};
pub use test_config::{TestCatalog, TestConfig, TestMode, TestType};
pub use test_result::{AnswerMap, ReviewItem, ScoreBand, TestResult};
