//! Runtime configuration for a vecache node.
//!
//! Configuration is loaded from a JSON file (missing fields fall back to
//! defaults) and then overridden by command-line flags. Everything here is
//! consumed once at startup; nothing is reconfigurable afterwards.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::peers::client::TransportOptions;
use crate::peers::pool::{DEFAULT_BASE_PATH, DEFAULT_REPLICAS};
use crate::peers::protocol::WireFormat;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "vecache", about = "Distributed key/value cache node")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "vecache.json")]
    pub config: PathBuf,

    /// Cache server port; the node's address becomes http://127.0.0.1:<port>.
    #[arg(long, default_value_t = 8001)]
    pub port: u16,

    /// Also start the front-end API gateway.
    #[arg(long)]
    pub api: bool,

    /// API gateway listen address.
    #[arg(long, default_value = "127.0.0.1:8888")]
    pub api_addr: String,

    /// Peer base URLs (comma separated), overriding the config file.
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// This node and its peers.
    pub node: NodeConfig,

    /// The demo cache group.
    pub cache: CacheConfig,

    /// Peer transport tuning.
    pub transport: TransportConfig,
}

/// Cluster membership of this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Base URL of this node; set from `--port` at startup.
    pub self_addr: String,

    /// Path prefix of the peer endpoint.
    pub base_path: String,

    /// Base URLs of every node in the cluster, this one included.
    pub peers: Vec<String>,
}

impl NodeConfig {
    /// Socket address to bind: the host and port of `self_addr`, so the
    /// node listens exactly where its peers will connect.
    pub fn listen_addr(&self) -> &str {
        let addr = self
            .self_addr
            .strip_prefix("http://")
            .or_else(|| self.self_addr.strip_prefix("https://"))
            .unwrap_or(&self.self_addr);
        addr.trim_end_matches('/')
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            self_addr: String::new(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            peers: vec![
                "http://127.0.0.1:8001".to_string(),
                "http://127.0.0.1:8002".to_string(),
                "http://127.0.0.1:8003".to_string(),
            ],
        }
    }
}

/// Cache group settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub group_name: String,

    /// Byte budget of the group's local cache (0 = unbounded).
    pub cache_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            group_name: "scores".to_string(),
            cache_bytes: 2 << 10,
        }
    }
}

/// Peer transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Virtual replicas per peer on the hash ring.
    pub replicas: usize,

    pub wire_format: WireFormat,

    /// Peer request timeout in milliseconds (none = wait indefinitely).
    pub timeout_ms: Option<u64>,

    /// Retries after a connection-level failure.
    pub retries: u32,

    /// Initial retry backoff in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            wire_format: WireFormat::Raw,
            timeout_ms: None,
            retries: 0,
            retry_backoff_ms: 150,
        }
    }
}

impl TransportConfig {
    pub fn options(&self) -> TransportOptions {
        TransportOptions {
            wire_format: self.wire_format,
            timeout: self.timeout_ms.map(Duration::from_millis),
            retries: self.retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        self.node.self_addr = format!("http://127.0.0.1:{}", cli.port);
        if !cli.peers.is_empty() {
            self.node.peers = cli.peers.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.node.base_path, "/vecache/");
        assert_eq!(cfg.cache.cache_bytes, 2048);
        assert_eq!(cfg.transport.replicas, 50);
        assert_eq!(cfg.transport.wire_format, WireFormat::Raw);
    }

    #[test]
    fn test_default_transport_blocks_without_retry() {
        let options = TransportConfig::default().options();
        assert!(options.timeout.is_none());
        assert_eq!(options.retries, 0);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cache": {{"cache_bytes": 4096}}, "transport": {{"wire_format": "message", "timeout_ms": 250}}}}"#
        )
        .unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.cache.cache_bytes, 4096);
        assert_eq!(cfg.cache.group_name, "scores");
        assert_eq!(cfg.transport.wire_format, WireFormat::Message);
        assert_eq!(cfg.transport.options().timeout, Some(Duration::from_millis(250)));
        assert_eq!(cfg.node.peers.len(), 3);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.cache.group_name, "scores");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["vecache", "--port", "8002", "--peers", "http://a:1,http://b:2"]);
        let mut cfg = Config::default();
        cfg.apply_cli(&cli);
        assert_eq!(cfg.node.self_addr, "http://127.0.0.1:8002");
        assert_eq!(cfg.node.peers, vec!["http://a:1", "http://b:2"]);
    }

    #[test]
    fn test_listen_addr_matches_advertised_host() {
        let cli = Cli::parse_from(["vecache", "--port", "8003"]);
        let mut cfg = Config::default();
        cfg.apply_cli(&cli);
        assert_eq!(cfg.node.listen_addr(), "127.0.0.1:8003");
        assert!(cfg.node.peers.contains(&cfg.node.self_addr));

        cfg.node.self_addr = "http://[::1]:9000/".to_string();
        assert_eq!(cfg.node.listen_addr(), "[::1]:9000");
    }
}
