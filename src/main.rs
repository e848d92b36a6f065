use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ragline_core::TenantId;
use ragline_openai::{OpenAiCompletions, OpenAiConfig, OpenAiEmbeddings};
use ragline_pipeline::RagPipeline;
use ragline_store::MemoryVectorStore;

#[derive(Parser)]
#[command(name = "ragline")]
#[command(about = "Tenant-isolated retrieval-augmented question answering", long_about = None)]
struct Cli {
    /// Path to the vector store snapshot file
    #[arg(long, default_value = "ragline-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a tenant so documents can be ingested for it
    RegisterTenant {
        #[arg(long)]
        tenant: String,
    },
    /// Ingest a plain-text document for a tenant
    Ingest {
        #[arg(long)]
        tenant: String,
        /// Path to the text file to ingest
        file: PathBuf,
        /// Source name stored with each chunk; defaults to the file name
        #[arg(long)]
        source: Option<String>,
    },
    /// Ask a question against a tenant's ingested documents
    Ask {
        #[arg(long)]
        tenant: String,
        question: String,
        /// Number of context chunks to retrieve
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Delete every document and chunk owned by a tenant
    DeleteTenant {
        #[arg(long)]
        tenant: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let config = OpenAiConfig::from_env()?;
    let store = Arc::new(MemoryVectorStore::open(&cli.store, config.dimension)?);
    let embedder = Arc::new(OpenAiEmbeddings::new(config.clone())?);
    let generator = Arc::new(OpenAiCompletions::new(config)?);
    let pipeline = RagPipeline::new(embedder, generator, store);

    match cli.command {
        Command::RegisterTenant { tenant } => {
            let tenant = TenantId::new(tenant);
            pipeline.register_tenant(&tenant).await?;
            println!("{} Tenant {} registered", "✅".green(), tenant.to_string().bold());
        }
        Command::Ingest {
            tenant,
            file,
            source,
        } => {
            let tenant = TenantId::new(tenant);
            let source_name = source.unwrap_or_else(|| {
                file.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string())
            });
            let raw_text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;

            let result = pipeline.ingest(&tenant, &source_name, &raw_text).await?;
            println!(
                "{} Ingested {} as {} ({} chunks)",
                "✅".green(),
                source_name.bold(),
                result.doc_id,
                result.chunk_count
            );
        }
        Command::Ask {
            tenant,
            question,
            top_k,
        } => {
            let tenant = TenantId::new(tenant);
            let result = pipeline.ask_with_top_k(&tenant, &question, top_k).await?;

            println!("{}", result.answer);
            println!();
            if result.sources.is_empty() {
                println!("{}", "No sources were retrieved.".yellow());
            } else {
                println!("{} (confidence {:.2}):", "Sources".bold(), result.confidence);
                for (i, source) in result.sources.iter().enumerate() {
                    println!("  {}. {}", i + 1, source);
                }
            }
        }
        Command::DeleteTenant { tenant } => {
            let tenant = TenantId::new(tenant);
            pipeline.delete_tenant(&tenant).await?;
            println!("{} Tenant {} data deleted", "🗑️".red(), tenant.to_string().bold());
        }
    }

    Ok(())
}
