pub mod logging;
pub mod shuffle;

pub use logging::truncate_text;
pub use shuffle::{shuffled, shuffled_with};
