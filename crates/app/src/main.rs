use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{
    ChunkingConfig, GeminiGenerator, IndexStore, IngestStatus, QueryEngine, DEFAULT_CHUNK_SIZE,
    DEFAULT_OVERLAP, DEFAULT_TOP_K,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the persisted index artifacts.
    #[arg(long, env = "VECTOR_INDEX_PATH", default_value = "./vector_index")]
    index_dir: PathBuf,

    /// Directory the PDFs are ingested from.
    #[arg(long, env = "PDF_DATA_DIR", default_value = "./data/documents")]
    pdf_dir: PathBuf,

    /// Answer generation endpoint.
    #[arg(
        long,
        env = "GEMINI_ENDPOINT",
        default_value = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
    )]
    gemini_endpoint: String,

    /// Answer generation API key.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    gemini_api_key: String,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the index from the PDF directory's current contents.
    Ingest {
        /// Words per chunk.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Words shared between adjacent chunks.
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },
    /// Ask a question over the indexed documents.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Number of context passages to retrieve.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Print the retrieved context passages as well.
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },
    /// Drop the index and its persisted artifacts.
    Clear,
    /// Show chunk and document counts for the current index.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = Arc::new(
        IndexStore::open(&cli.index_dir)
            .map_err(|error| anyhow::anyhow!("unable to open index: {error}"))?,
    );

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        index_dir = %cli.index_dir.display(),
        "pdf-qa boot"
    );

    match cli.command {
        Command::Ingest {
            chunk_size,
            overlap,
        } => {
            let config = ChunkingConfig {
                chunk_size,
                overlap,
            };
            let report = store.ingest_dir(&cli.pdf_dir, config);

            match report.status {
                IngestStatus::Success => {
                    println!("{} ({} chunks)", report.message, report.count);
                }
                IngestStatus::Warning => {
                    warn!(message = %report.message, "ingestion warning");
                    println!("warning: {}", report.message);
                }
                IngestStatus::Error => {
                    anyhow::bail!("ingestion failed: {}", report.message);
                }
            }
        }
        Command::Ask {
            question,
            top_k,
            show_context,
        } => {
            if question.trim().is_empty() {
                anyhow::bail!("question cannot be empty");
            }
            if cli.gemini_api_key.is_empty() {
                warn!("GEMINI_API_KEY is not set; generation requests will be rejected upstream");
            }

            let generator = GeminiGenerator::new(&cli.gemini_endpoint, &cli.gemini_api_key);
            let engine = QueryEngine::new(Arc::clone(&store), generator).with_top_k(top_k);

            let outcome = engine.query(&question).await;

            println!("{}", outcome.answer);
            if !outcome.sources.is_empty() {
                println!();
                println!(
                    "sources: {}",
                    outcome.sources.iter().cloned().collect::<Vec<_>>().join(", ")
                );
            }
            if show_context {
                for (index, passage) in outcome.context.iter().enumerate() {
                    println!();
                    println!("[context {}]\n{passage}", index + 1);
                }
            }
        }
        Command::Clear => {
            store
                .clear()
                .map_err(|error| anyhow::anyhow!("clear failed: {error}"))?;
            println!("Index cleared. Run `pdf-qa ingest` to rebuild.");
        }
        Command::Stats => {
            let stats = store.stats();
            println!(
                "total_chunks={} document_count={}",
                stats.total_chunks, stats.document_count
            );
            for document in store.documents() {
                println!(
                    "  {} chunks={} pages={} checksum={} ingested_at={}",
                    document.source,
                    document.chunk_count,
                    document.page_count,
                    &document.checksum[..12.min(document.checksum.len())],
                    document.ingested_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
