#[cfg(feature = "cli")]
pub mod cli;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, YearList};
pub use storage::LocalStorage;
pub use toml_config::TomlConfig;

pub const API_KEY_ENV_VAR: &str = "BALLDONTLIE_API_KEY";
