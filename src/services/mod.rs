pub mod access_gate;
pub mod fixture_generator;
pub mod history_store;
pub mod llm_service;
pub mod question_generator;

pub use access_gate::{AccessGate, FileAccessGate, StaticAccess};
pub use fixture_generator::FixtureGenerator;
pub use history_store::{HistoryStore, JsonFileHistory, MemoryHistory};
pub use llm_service::LlmService;
pub use question_generator::{Generator, QuestionGenerator};
