//! civic-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the civic API over HTTP.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::http::{HeaderValue, Method, header};
use civic_api::AppState;
use civic_core::service::IssueService;
use civic_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Civic issue reporting API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = settings::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;
  tracing::info!(path = ?server_cfg.store_path, "store opened");

  // One store serves issues, identities and the audit log.
  let store = Arc::new(store);
  let service = IssueService::new(Arc::clone(&store), store);

  let origin: HeaderValue = server_cfg
    .cors_origin
    .parse()
    .with_context(|| format!("invalid cors_origin {:?}", server_cfg.cors_origin))?;
  let cors = CorsLayer::new()
    .allow_origin(origin)
    .allow_credentials(true)
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
    .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

  let app = civic_api::router(AppState::new(service))
    .layer(cors)
    .layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!("API is running on http://{address}");
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
