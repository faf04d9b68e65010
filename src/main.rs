use anyhow::{bail, Context, Result};
use clap::Parser;
use doctriage::ai::{AnthropicClient, LanguageModel, RateLimiter};
use doctriage::classify::batch::{BatchClassifier, BatchDocument, DocumentInput};
use doctriage::classify::Classifier;
use doctriage::extract::{OcrMethod, TextAcquisition};
use doctriage::organize::{DocumentSource, Organizer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Classify scanned office PDF forms and file them into category folders.
#[derive(Parser)]
#[command(name = "doctriage", version)]
struct Cli {
    /// Directory containing the PDF documents to triage
    input: PathBuf,

    /// Base directory for the organized folder tree
    #[arg(short, long, default_value = "organized")]
    output: PathBuf,

    /// What to send to the model: extracted "text" or the raw "document"
    #[arg(long, default_value = "text")]
    mode: String,

    /// OCR fallback strategy for scanned documents: tesseract or vision
    #[arg(long, default_value = "tesseract")]
    ocr: String,

    /// Minimum delay between model calls, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Model identifier override
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("doctriage=info")),
        )
        .init();

    let cli = Cli::parse();

    let ocr = OcrMethod::parse(&cli.ocr).map_err(|e| anyhow::anyhow!(e))?;
    let direct_document = match cli.mode.as_str() {
        "text" => false,
        "document" => true,
        other => bail!("unknown mode '{}', expected 'text' or 'document'", other),
    };

    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .context("ANTHROPIC_API_KEY is not set (load it via .env or the environment)")?;
    let mut client = AnthropicClient::new(api_key).map_err(|e| anyhow::anyhow!(e))?;
    if let Some(model) = &cli.model {
        client = client.with_model(model.clone());
    }
    let model: Arc<dyn LanguageModel> = Arc::new(client);

    let mut files: Vec<PathBuf> = WalkDir::new(&cli.input)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("no PDF documents found under {}", cli.input.display());
    }
    tracing::info!("[Main] Found {} PDF documents", files.len());

    let mut documents = Vec::with_capacity(files.len());
    let mut sources: HashMap<String, DocumentSource> = HashMap::new();
    for path in &files {
        let filename = display_name(&cli.input, path);
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        let input = if direct_document {
            DocumentInput::DirectDocument(bytes)
        } else {
            DocumentInput::Pdf { bytes, ocr }
        };
        documents.push(BatchDocument {
            filename: filename.clone(),
            input,
        });
        sources.insert(filename, DocumentSource::Path(path.clone()));
    }

    let batch = BatchClassifier::new(
        Classifier::new(Arc::clone(&model)),
        TextAcquisition::new(Arc::clone(&model)),
        Arc::new(RateLimiter::new(1, Duration::from_millis(cli.delay_ms))),
    );

    let results = batch.classify_batch(documents).await;

    let organizer = Organizer::new(&cli.output);
    let report = organizer.organize(&results, &sources, None)?;

    tracing::info!(
        "[Main] Organized {} of {} documents into {}",
        report.summary.organized_count,
        report.summary.total,
        cli.output.display()
    );

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Unique display name for a discovered file: its path relative to the
/// input root, so same-named PDFs in different subdirectories never share
/// a key in the source map.
fn display_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative.as_os_str().is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    } else {
        relative.to_string_lossy().to_string()
    }
}
