//! Docosphere HTTP server
//!
//! Run with: cargo run -p docosphere --bin docosphere-server [-- config.toml]

use docosphere::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docosphere=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        Docosphere                         ║
║                Where Documents Come Alive                 ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Embedding model: {}", config.embed_model());
    tracing::info!("  - Index: {}", config.index.path.display());
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/process - Upload documents and build the index");
    println!("  POST /api/query   - Ask questions");
    println!("  GET  /api/index   - Current index");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
