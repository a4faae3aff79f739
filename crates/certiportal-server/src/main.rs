//! CertiPortal Server
//!
//! REST backend for the institutional certificate portal: certificate
//! requests, documents, notifications, and user profiles.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use certiportal_server::auth::JwtManager;
use certiportal_server::blob::BlobStore;
use certiportal_server::http::{self, AppState};
use certiportal_server::storage::PortalDatabase;

#[derive(Parser, Debug)]
#[command(name = "certiportal-server")]
#[command(version, about = "CertiPortal server - certificate request portal backend")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JWT secret key.
    #[arg(
        long,
        env = "CERTIPORTAL_JWT_SECRET",
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,

    /// Access token TTL in seconds.
    #[arg(long, default_value_t = 3600)]
    access_ttl: i64,

    /// Refresh token TTL in seconds.
    #[arg(long, default_value_t = 604_800)]
    refresh_ttl: i64,

    /// Root directory for uploaded files.
    #[arg(long)]
    blob_root: Option<PathBuf>,

    /// Public base URL under which uploaded files are served.
    #[arg(long, env = "CERTIPORTAL_PUBLIC_BASE_URL", default_value = "http://localhost:8080/files")]
    public_base_url: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    certiportal_core::tracing_init::init_tracing("certiportal_server=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting certiportal-server"
    );

    let db_path = match args.db_path {
        Some(path) => path,
        None => default_data_dir()?.join("portal.db"),
    };
    info!(path = %db_path.display(), "Opening portal database");
    let db = PortalDatabase::open(&db_path).await?;

    let blob_root = match args.blob_root {
        Some(path) => path,
        None => default_data_dir()?.join("blobs"),
    };

    let jwt = Arc::new(JwtManager::new(
        args.jwt_secret.as_bytes(),
        args.access_ttl,
        args.refresh_ttl,
    ));
    let blobs = Arc::new(BlobStore::new(blob_root, args.public_base_url));

    let app = http::router(AppState::new(db, jwt, blobs));

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Portal server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Portal server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install shutdown handler");
        return;
    }
    info!("Received shutdown signal");
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".certiportal"))
}
