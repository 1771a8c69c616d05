use anyhow::anyhow;
use clap::{Args as ClapArgs, Parser, Subcommand};
use simrec_api::RestApi;
use simrec_core::{Error, ItemId, RecommendOptions, SharedEngine};
use simrec_storage::{load_catalog_and_similarity, DataSource, LoaderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Item-to-item recommendations from a precomputed similarity matrix
#[derive(Parser, Debug)]
#[command(name = "simrec")]
#[command(about = "Serve recommendations from a precomputed similarity matrix", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// HTTP API port
        #[arg(long, default_value_t = 6380)]
        http_port: u16,
    },
    /// Print recommendations for one item and exit
    Query {
        #[command(flatten)]
        data: DataArgs,

        /// Item id to recommend for
        #[arg(long)]
        id: ItemId,

        #[arg(long, default_value_t = 10)]
        top_n: usize,

        #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
        min_similarity: f32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct DataArgs {
    /// Dataset file or http(s) URL
    #[arg(short, long)]
    data: String,

    /// Download cache for URL datasets
    #[arg(long, default_value = "./data")]
    cache_dir: PathBuf,

    /// Expected SHA-256 of the dataset file
    #[arg(long)]
    checksum: Option<String>,
}

impl DataArgs {
    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            cache_dir: self.cache_dir.clone(),
            expected_sha256: self.checksum.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Serve { data, http_port } => serve(data, http_port).await,
        Command::Query {
            data,
            id,
            top_n,
            min_similarity,
            json,
        } => query(data, id, RecommendOptions::new(top_n, min_similarity), json).await,
    }
}

async fn serve(data: DataArgs, http_port: u16) -> anyhow::Result<()> {
    info!("Starting SimRec v{}", env!("CARGO_PKG_VERSION"));
    info!("Dataset: {}", data.data);
    info!("HTTP API port: {}", http_port);

    let shared = Arc::new(SharedEngine::new());

    // HTTP answers 503 until the dataset is installed below
    let shared_http = shared.clone();
    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(RestApi::start(shared_http, http_port))
    });
    let mut http_task = tokio::task::spawn_blocking(move || http_handle.join());

    let source = DataSource::parse(&data.data);
    let config = data.loader_config();
    let dataset = tokio::select! {
        loaded = load_catalog_and_similarity(&source, &config) => match loaded {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("Failed to load dataset from {}: {}", source, e);
                return Err(e.into());
            }
        },
        joined = &mut http_task => {
            http_exit(joined)?;
            anyhow::bail!("HTTP server stopped before the dataset was loaded");
        }
    };
    shared.install(dataset.engine()?)?;

    info!("SimRec started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        joined = &mut http_task => {
            http_exit(joined)?;
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}

/// Outcome of the HTTP server thread; bind failures and panics are fatal
fn http_exit(
    joined: Result<std::thread::Result<std::io::Result<()>>, tokio::task::JoinError>,
) -> anyhow::Result<()> {
    match joined {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => {
            error!("HTTP server error: {}", e);
            Err(anyhow!("HTTP server error: {}", e))
        }
        Ok(Err(_)) => Err(anyhow!("HTTP server thread panicked")),
        Err(e) => Err(e.into()),
    }
}

async fn query(
    data: DataArgs,
    item_id: ItemId,
    options: RecommendOptions,
    json: bool,
) -> anyhow::Result<()> {
    let source = DataSource::parse(&data.data);
    let dataset = load_catalog_and_similarity(&source, &data.loader_config()).await?;
    let engine = dataset.engine()?;

    match engine.recommend_with(item_id, &options) {
        Ok(results) if json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Ok(results) if results.is_empty() => {
            println!(
                "No items with similarity >= {} to {}.",
                options.min_similarity, item_id
            );
        }
        Ok(results) => {
            if let Some(entry) = engine.catalog().get(item_id) {
                println!("Recommended for {}:", entry.name);
            }
            for r in results {
                println!("  {} (Similarity: {:.3})", r.name, r.score);
            }
        }
        Err(Error::UnknownItem(id)) => {
            println!("Item {} is not in the catalog. Please try another id.", id);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
