use anyhow::Context;
use clap::Parser;
use idscan::adapters::http;
use idscan::config::{load_env_file, toml_config::LogFormat, ENV_FILE};
use idscan::utils::logger;
use idscan::{AnthropicClient, CliConfig, DirectorySource, DocumentTypeRegistry, OcrProcessor, ScanError};
use std::sync::Arc;

fn exit_with(e: &ScanError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let env_file_loaded = load_env_file(ENV_FILE).unwrap_or_else(|e| exit_with(&e));
    let config = cli.load().unwrap_or_else(|e| exit_with(&e));

    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::info!("🚀 Starting idscan");
    if env_file_loaded {
        tracing::debug!("Loaded environment from {}", ENV_FILE);
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let api_key = config.api_key().unwrap_or_else(|e| {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e)
    });

    let registry = DocumentTypeRegistry::load(
        DirectorySource::new(&config.registry.root),
        config.registry.duplicate_policy,
    )
    .with_context(|| format!("loading document types from {}", config.registry.root))?;
    if registry.is_empty() {
        tracing::warn!("No document types loaded, every upload will be rejected");
    }

    let client = AnthropicClient::new(&config.model, api_key)?;
    tracing::info!(
        model = client.model(),
        document_types = registry.len(),
        sniff_content = config.media.sniff_content,
        "Extraction service ready"
    );

    let processor = Arc::new(
        OcrProcessor::new(Arc::new(registry), client).with_content_sniffing(config.media.sniff_content),
    );
    let app = http::router(processor, config.server.max_upload_bytes);

    http::serve(app, config.bind_addr()?).await?;
    Ok(())
}
