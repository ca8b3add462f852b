//! Dictionary Feeder
//!
//! Reads data-dictionary documents from a directory or a GCS bucket, embeds
//! one text block per column and loads them into a new Milvus collection.

use clap::{Args, Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vector::models::DEFAULT_NPROBE;
use domain_vector::{IndexType, MetricType, SearchQuery};
use eyre::Result;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod config;

use commands::{IngestPlan, Source};
use config::Config;

const SMOKE_TOP_K: u32 = 5;
const SMOKE_NPROBE: u32 = 50;

#[derive(Parser)]
#[command(name = "dictionary-feeder")]
#[command(about = "Load data-dictionary columns into a Milvus collection for semantic search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed every column and load a new collection
    Ingest(IngestArgs),

    /// Run one semantic search against an existing collection
    Search {
        /// Free text to search for
        query: String,

        /// Collection to search. Defaults to MILVUS_CLIENT_COLLECTION.
        #[arg(short, long)]
        collection: Option<String>,

        /// Number of matches (1-10)
        #[arg(short = 'k', long, default_value_t = SMOKE_TOP_K)]
        top_k: u32,

        /// IVF partitions to probe
        #[arg(long, default_value_t = DEFAULT_NPROBE)]
        nprobe: u32,
    },
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["dir", "gcs_bucket"])))]
struct IngestArgs {
    /// Directory holding *.json data dictionaries
    #[arg(long)]
    dir: Option<PathBuf>,

    /// GCS bucket holding the data dictionaries
    #[arg(long)]
    gcs_bucket: Option<String>,

    /// Object prefix inside the bucket
    #[arg(long)]
    gcs_prefix: Option<String>,

    /// Collection to create; must not exist. Defaults to MILVUS_CLIENT_COLLECTION.
    #[arg(short, long)]
    collection: Option<String>,

    /// COSINE, IP or L2. Defaults to MILVUS_METRIC_TYPE.
    #[arg(long)]
    metric: Option<MetricType>,

    /// IVF_FLAT, FLAT or HNSW
    #[arg(long, default_value = "IVF_FLAT")]
    index_type: IndexType,

    /// IVF cluster count (IVF_FLAT only)
    #[arg(long)]
    nlist: Option<u32>,

    /// Blocks per embedding and insert request
    #[arg(long, default_value_t = domain_vector::ingest::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Query searched once the collection is loaded
    #[arg(long, default_value = "OrderNbr")]
    smoke_query: String,

    /// Skip the post-load search
    #[arg(long)]
    no_smoke: bool,

    /// Load into an in-memory index instead of Milvus
    #[arg(long)]
    dry_run: bool,
}

impl IngestArgs {
    fn into_plan(self, config: &Config) -> Result<IngestPlan> {
        let source = match (self.dir, self.gcs_bucket) {
            (Some(dir), _) => Source::Dir(dir),
            (None, Some(bucket)) => Source::Gcs {
                bucket,
                prefix: self.gcs_prefix.unwrap_or_default(),
            },
            (None, None) => eyre::bail!("either --dir or --gcs-bucket is required"),
        };

        if self.nlist.is_some() && self.index_type != IndexType::IvfFlat {
            eyre::bail!("--nlist only applies to IVF_FLAT indexes");
        }

        let smoke_query = (!self.no_smoke).then(|| {
            SearchQuery::new(self.smoke_query)
                .with_top_k(SMOKE_TOP_K)
                .with_nprobe(SMOKE_NPROBE)
        });

        Ok(IngestPlan {
            source,
            collection: self
                .collection
                .unwrap_or_else(|| config.vectordb.collection.clone()),
            metric: self.metric.unwrap_or(config.vectordb.metric),
            index_type: self.index_type,
            nlist: self.nlist,
            batch_size: self.batch_size.max(1),
            smoke_query,
            dry_run: self.dry_run,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_tracing(&config.environment, config.log_level.as_deref());

    match cli.command {
        Commands::Ingest(args) => {
            let plan = args.into_plan(&config)?;
            info!(
                collection = %plan.collection,
                metric = %plan.metric,
                index_type = %plan.index_type,
                dry_run = plan.dry_run,
                "Starting ingestion"
            );

            let report = commands::ingest(&config, &plan).await?;
            info!(
                "Ingestion complete: {} entities written to {}",
                report.entities_written, report.collection
            );
        }

        Commands::Search {
            query,
            collection,
            top_k,
            nprobe,
        } => {
            let collection = collection.unwrap_or_else(|| config.vectordb.collection.clone());
            let query = SearchQuery::new(query).with_top_k(top_k).with_nprobe(nprobe);
            commands::search(&config, &collection, &query).await?;
        }
    }

    Ok(())
}
