pub mod toml_config;

use crate::utils::error::{Result, ScanError};
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;
use toml_config::AppConfig;

pub const ENV_FILE: &str = ".env";

/// Loads `KEY=value` pairs from `path` into the process environment so the
/// config file's `${VAR}` references and the API key fallback can see them.
/// Variables that are already set win. Returns whether the file existed.
pub fn load_env_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    match dotenvy::from_path(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ScanError::ConfigValidationError {
            field: path.as_ref().display().to_string(),
            message: e.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "idscan")]
#[command(about = "Extracts identity document fields from photos with a vision model")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "idscan.toml")]
    pub config: String,

    /// Address to listen on, overrides [server] bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Document type definitions directory, overrides [registry] root
    #[arg(long)]
    pub document_types_dir: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Reads the config file (defaults when absent), applies the command line
    /// overrides and validates the result.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::from_file_or_default(&self.config)?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(dir) = &self.document_types_dir {
            config.registry.root = dir.clone();
        }
    }
}
