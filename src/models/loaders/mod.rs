pub mod toml_loader;

pub use toml_loader::{load_catalog_overrides, load_fixture_bank, FixtureBank};
