//! vecache node: serves one cache group to its peers and, optionally, to
//! clients through the API gateway.
//!
//! The demo group is backed by a slow in-memory "database". Start three nodes
//! with `--port 8001`, `--port 8002` and `--port 8003` (one of them with `--api`)
//! and query `http://127.0.0.1:8888/api?key=Tom`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use vecache::config::{Cli, Config};
use vecache::server::api;
use vecache::{GroupRegistry, HttpPool, OriginLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "vecache=debug,tower_http=debug"
    } else {
        "vecache=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("vecache v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);

    info!(
        node = %config.node.self_addr,
        base_path = %config.node.base_path,
        peers = ?config.node.peers,
        group = %config.cache.group_name,
        cache_bytes = config.cache.cache_bytes,
        "Configuration loaded"
    );

    // Create the demo group.
    let registry = Arc::new(GroupRegistry::new());
    let group = registry.create(&config.cache.group_name, config.cache.cache_bytes, SlowDb::demo());

    // Wire the peer pool.
    let pool = Arc::new(
        HttpPool::new(config.node.self_addr.clone())
            .with_base_path(config.node.base_path.clone())
            .with_replicas(config.transport.replicas)
            .with_transport_options(config.transport.options()),
    );
    pool.set_peers(config.node.peers.clone());
    group.register_peers(pool.clone());

    // Optional API gateway.
    if cli.api {
        let app = api::build_router(group.clone());
        let listener = TcpListener::bind(&cli.api_addr).await?;
        info!(addr = %cli.api_addr, "API gateway listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "API gateway stopped");
            }
        });
    }

    // Start the cache server.
    let listener = TcpListener::bind(config.node.listen_addr()).await?;
    info!("vecache is running at {}", config.node.self_addr);

    axum::serve(listener, pool.router(registry)).await?;

    Ok(())
}

/// In-memory stand-in for a slow backing database.
struct SlowDb {
    rows: HashMap<&'static str, &'static str>,
}

impl SlowDb {
    fn demo() -> Self {
        Self {
            rows: [("Tom", "630"), ("Jack", "589"), ("Sam", "567")].into(),
        }
    }
}

#[async_trait]
impl OriginLoader for SlowDb {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        info!(key, "[SlowDB] search key");
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.rows
            .get(key)
            .map(|v| v.as_bytes().to_vec())
            .ok_or_else(|| anyhow::anyhow!("{key} not exist"))
    }
}
