//! Vector layer API service.
//!
//! Serves GeoPackage layers from a data directory as GeoJSON.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vector_api::state::AppState;
use vector_catalog::EngineConfig;

#[derive(Parser, Debug)]
#[command(name = "vector-api")]
#[command(about = "Vector layer GeoJSON server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long)]
    worker_threads: Option<usize>,

    /// YAML configuration file; environment variables override it
    #[arg(short, long, env = "VECTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory (overrides configuration and VECTOR_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    } else if let Some(threads) = env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env(|key| env::var(key).ok());
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

async fn async_main(args: Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let config = load_config(&args)?;
    info!(
        data_dir = %config.data_dir.display(),
        extensions = ?config.extensions,
        merge_files = config.merge.files.len(),
        merge_by_convention = config.merge.by_convention,
        "Starting vector layer API server"
    );

    let state = Arc::new(AppState::new(config, Some(prometheus_handle))?);

    let app = vector_api::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = args.listen.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Listening");

    // Serve /health and /ready (503) while discovery runs.
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    state
        .catalog
        .discover()
        .await
        .context("vector layer discovery failed")?;

    server.await??;
    Ok(())
}
