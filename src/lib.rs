pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{anthropic::AnthropicClient, fs_source::DirectorySource};
pub use crate::config::{toml_config::AppConfig, CliConfig};
pub use crate::core::{
    processor::OcrProcessor, prompt::PromptBuilder, registry::DocumentTypeRegistry, DuplicatePolicy,
};
pub use crate::utils::error::{Result, ScanError};
