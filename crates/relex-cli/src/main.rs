//! Relex CLI - Command-line interface
//!
//! Usage:
//!   relex extract <sentence> [--link] [--json]
//!   relex batch [--input-dir <dir>] [--link] [--dry-run]
//!   relex evaluate <input> <output>
//!
//! Every command accepts `--config <file>`; environment variables override
//! file values.

mod batch;
mod evaluate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relex_core::{
    AppConfig, DependencyParser, EntityLinker, LoggingConfig, MemoryRelationStore,
    MemoryTaskQueue, PgRelationStore, PgTaskQueue, RelationStore, TaskQueue,
};
use relex_extractor::{attach_entity_links, extract_relations, HttpEntityLinker};
use relex_parser::CoreNlpClient;

use crate::batch::BatchRunner;

#[derive(Parser)]
#[command(name = "relex")]
#[command(about = "Subject-predicate-object relation extraction")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract relations from one sentence
    Extract {
        /// Sentence to analyze
        sentence: String,
        /// Attach entity links
        #[arg(long)]
        link: bool,
        /// Print persistence records as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Extract relations from every file of a directory
    Batch {
        /// Directory of sentence files (overrides batch.input_dir)
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Attach entity links
        #[arg(long)]
        link: bool,
        /// Use in-memory storage and print records instead of persisting
        #[arg(long)]
        dry_run: bool,
    },
    /// Write canonical forms of all relations for evaluation
    Evaluate {
        /// One sentence per line
        input: PathBuf,
        /// `<sentence number>\t<canonical form>` lines
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parsers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn DependencyParser>>> {
    Ok(CoreNlpClient::from_config(&config.parser)?
        .into_iter()
        .map(|client| Arc::new(client) as Arc<dyn DependencyParser>)
        .collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract {
            sentence,
            link,
            json,
        } => {
            let parsers = parsers(&config)?;
            let parser = parsers
                .first()
                .context("no parser endpoint configured")?;

            let mut relations =
                extract_relations(&sentence, parser.as_ref(), &config.extraction).await?;
            if link || config.linking.enabled {
                let linker = HttpEntityLinker::from_config(&config.linking)?;
                attach_entity_links(&mut relations, &linker).await;
            }

            for relation in &relations {
                if json {
                    println!("{}", serde_json::to_string(&relation.to_record(&sentence))?);
                } else {
                    println!("{}\t{}", relation, relation.canonical_form());
                }
            }
        }
        Commands::Batch {
            input_dir,
            link,
            dry_run,
        } => {
            let input_dir = input_dir.unwrap_or_else(|| config.batch.input_dir.clone());
            let parsers = parsers(&config)?;

            let memory_store = Arc::new(MemoryRelationStore::new());
            let (queue, store): (Arc<dyn TaskQueue>, Arc<dyn RelationStore>) = if dry_run {
                (Arc::new(MemoryTaskQueue::new()), memory_store.clone())
            } else {
                let db = &config.database;
                let store =
                    PgRelationStore::new(&db.postgres_url, db.pool_size, &db.relation_table)
                        .await?;
                store.ensure_schema().await?;
                let queue = PgTaskQueue::from_pool(store.pool().clone(), &db.task_table)?;
                queue.ensure_schema().await?;
                (Arc::new(queue), Arc::new(store))
            };

            let mut runner = BatchRunner::new(parsers, queue, store, config.extraction.clone())
                .with_stale_after(Duration::from_secs(config.batch.stale_task_secs));
            if link || config.linking.enabled {
                let linker: Arc<dyn EntityLinker> =
                    Arc::new(HttpEntityLinker::from_config(&config.linking)?);
                runner = runner.with_linker(linker);
            }

            runner
                .enqueue_dir(&input_dir, &config.batch.file_extension)
                .await?;
            let summary = runner.run().await?;

            if dry_run {
                for record in memory_store.records().await {
                    println!("{}", serde_json::to_string(&record)?);
                }
            }
            println!("{summary}");
        }
        Commands::Evaluate { input, output } => {
            let parsers = parsers(&config)?;
            let parser = parsers
                .first()
                .context("no parser endpoint configured")?;

            let written =
                evaluate::evaluate_file(&input, &output, parser.as_ref(), &config.extraction)
                    .await?;
            tracing::info!(written, output = %output.display(), "Evaluation dump written");
        }
    }

    Ok(())
}
