use anyhow::Context;
use clap::Parser;
use idscan::config::{load_env_file, ENV_FILE};
use idscan::utils::logger;
use idscan::utils::validation::Validate;
use idscan::{AnthropicClient, AppConfig, DirectorySource, DocumentTypeRegistry, OcrProcessor};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "extract")]
#[command(about = "Run a single extraction on a local image and print the result")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "idscan.toml")]
    config: String,

    /// Image to read
    #[arg(long, required_unless_present = "list")]
    image: Option<PathBuf>,

    /// Document type id
    #[arg(long, required_unless_present = "list")]
    doc_type: Option<String>,

    /// Declared MIME type, guessed from the file extension when omitted
    #[arg(long)]
    mime: Option<String>,

    /// Print the enabled document types and exit
    #[arg(long)]
    list: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);
    load_env_file(ENV_FILE)?;

    let config = AppConfig::from_file_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    config.validate()?;

    let registry = DocumentTypeRegistry::load(
        DirectorySource::new(&config.registry.root),
        config.registry.duplicate_policy,
    )?;

    if args.list {
        for doc in registry.list(true) {
            println!("{:<20} {:<4} {:<16} {}", doc.id, doc.country, doc.category, doc.name);
        }
        return Ok(());
    }

    let (Some(image), Some(doc_type)) = (args.image, args.doc_type) else {
        anyhow::bail!("--image and --doc-type are required");
    };

    let mime = args.mime.unwrap_or_else(|| {
        mime_guess::from_path(&image)
            .first_or_octet_stream()
            .to_string()
    });
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;

    let client = AnthropicClient::new(&config.model, config.api_key()?)?;
    let processor = OcrProcessor::new(Arc::new(registry), client)
        .with_content_sniffing(config.media.sniff_content);

    match processor.process(&bytes, &doc_type, &mime).await {
        Ok(details) => {
            println!("{}", details);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Extraction failed: {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    }
}
