pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{JsonFileSource, SuiteQlSource};
pub use crate::config::toml_config::AppConfig;
pub use crate::config::EngineConfig;
pub use crate::core::{brief::compose_brief, engine::ArEngine, tools::ToolCall, tools::ToolName};
pub use crate::utils::error::{ArError, Result};
