use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "./history.yaml";
pub const CONFIG_PATH_ENV: &str = "HISTORY_CONFIG";
pub const PORT_ENV: &str = "PORT";

fn host() -> String {
    "0.0.0.0".to_string()
}
const fn port() -> u16 {
    80
}
const fn request_timeout_secs() -> u64 {
    120
}
const fn rpc_timeout_secs() -> u64 {
    300
}
const fn max_concurrent_lookups() -> usize {
    8
}
const fn default_true() -> bool {
    true
}
fn log_level() -> String {
    "info".to_string()
}
fn timestamp_format() -> String {
    "local".to_string()
}
fn logging() -> LoggingConfig {
    LoggingConfig::default()
}
fn self_hostname() -> String {
    "localhost".to_string()
}
const fn full_node_rpc_port() -> u16 {
    8555
}
fn daemon_ssl() -> PrivateSsl {
    PrivateSsl {
        private_crt: "config/ssl/daemon/private_daemon.crt".to_string(),
        private_key: "config/ssl/daemon/private_daemon.key".to_string(),
    }
}
fn full_node() -> ChiaFullnodeConfig {
    ChiaFullnodeConfig::default()
}
const fn precision() -> u8 {
    12
}

/// Expands a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => match env::var_os("HOME") {
            Some(home) => {
                let mut buf = PathBuf::from(home);
                let rest = rest.trim_start_matches(['/', '\\']);
                if !rest.is_empty() {
                    buf.push(rest);
                }
                buf
            }
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "host")]
    pub host: String,
    #[serde(default = "port")]
    pub port: u16,
    #[serde(default = "request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
    #[serde(default = "logging")]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub blockchains: Vec<BlockchainConfig>,
}
impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            host: host(),
            port: port(),
            request_timeout_secs: request_timeout_secs(),
            max_concurrent_lookups: max_concurrent_lookups(),
            logging: logging(),
            blockchains: vec![],
        }
    }
}
impl HistoryConfig {
    /// Loads the config at `path`, falling back to `HISTORY_CONFIG` and then
    /// `./history.yaml`. `PORT` in the environment overrides the listen port.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        debug!("Loading config from {}", path.display());
        let mut config = Self::try_from(path.as_path())?;
        if let Ok(port) = env::var(PORT_ENV) {
            config.port = port.parse().map_err(|e| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Invalid {PORT_ENV} ({port}): {e:?}"),
                )
            })?;
        }
        Ok(config)
    }
    pub fn save_as_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(
            path.as_ref(),
            serde_yaml::to_string(&self)
                .map_err(|e| Error::new(ErrorKind::Other, format!("{e:?}")))?,
        )
    }
}
impl TryFrom<&Path> for HistoryConfig {
    type Error = Error;
    fn try_from(value: &Path) -> Result<Self, Self::Error> {
        serde_yaml::from_str::<HistoryConfig>(&fs::read_to_string(value).map_err(|e| {
            Error::new(
                e.kind(),
                format!("Failed to read config {}: {e}", value.display()),
            )
        })?)
        .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{e:?}")))
    }
}
impl TryFrom<&PathBuf> for HistoryConfig {
    type Error = Error;
    fn try_from(value: &PathBuf) -> Result<Self, Self::Error> {
        Self::try_from(value.as_path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub show_timestamp: bool,
    #[serde(default = "default_true")]
    pub use_colors: bool,
    /// `local`, `utc` or `relative` (time since start).
    #[serde(default = "timestamp_format")]
    pub timestamp_format: String,
    #[serde(default)]
    pub targets: HashMap<String, String>,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: log_level(),
            show_target: true,
            show_timestamp: true,
            use_colors: true,
            timestamp_format: timestamp_format(),
            targets: HashMap::new(),
        }
    }
}

/// A network served by this instance. `ticker` doubles as the address prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainConfig {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "precision")]
    pub precision: u8,
    #[serde(default)]
    pub root_path: Option<String>,
    #[serde(default)]
    pub full_node: Option<FullnodeOverride>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullnodeOverride {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub ssl: Option<NodeSslConfig>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSslConfig {
    pub ssl_crt_path: String,
    pub ssl_key_path: String,
}

/// Where and how to reach one full node's RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConnection {
    pub host: String,
    pub port: u16,
    pub ssl: Option<NodeSslConfig>,
    pub timeout_secs: u64,
}

impl BlockchainConfig {
    /// Resolves the node endpoint from the node's own `config/config.yaml`
    /// under `root_path`, then applies any explicit overrides.
    pub fn node_connection(&self) -> Result<NodeConnection, Error> {
        let overrides = self.full_node.clone().unwrap_or_default();
        let mut connection = match &self.root_path {
            Some(root_path) => {
                let root = expand_home(root_path);
                let node_config =
                    ChiaNodeConfig::try_from(root.join("config").join("config.yaml").as_path())?;
                node_config.connection(&root)
            }
            None => match (&overrides.host, overrides.port) {
                (Some(host), Some(port)) => NodeConnection {
                    host: host.clone(),
                    port,
                    ssl: None,
                    timeout_secs: rpc_timeout_secs(),
                },
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        format!(
                            "Blockchain {} needs a root_path or a full_node host and port",
                            self.ticker
                        ),
                    ))
                }
            },
        };
        if let Some(host) = overrides.host {
            connection.host = host;
        }
        if let Some(port) = overrides.port {
            connection.port = port;
        }
        if let Some(ssl) = overrides.ssl {
            connection.ssl = Some(ssl);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            connection.timeout_secs = timeout_secs;
        }
        Ok(connection)
    }
}

/// The parts of a Chia style node `config.yaml` needed to reach its RPC server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiaNodeConfig {
    #[serde(default = "self_hostname")]
    pub self_hostname: String,
    #[serde(default = "full_node")]
    pub full_node: ChiaFullnodeConfig,
    #[serde(default = "daemon_ssl")]
    pub daemon_ssl: PrivateSsl,
}
impl ChiaNodeConfig {
    pub fn connection(&self, root: &Path) -> NodeConnection {
        let resolve = |p: &str| root.join(p).to_string_lossy().to_string();
        NodeConnection {
            host: self.self_hostname.clone(),
            port: self.full_node.rpc_port,
            ssl: Some(NodeSslConfig {
                ssl_crt_path: resolve(&self.daemon_ssl.private_crt),
                ssl_key_path: resolve(&self.daemon_ssl.private_key),
            }),
            timeout_secs: rpc_timeout_secs(),
        }
    }
}
impl TryFrom<&Path> for ChiaNodeConfig {
    type Error = Error;
    fn try_from(value: &Path) -> Result<Self, Self::Error> {
        serde_yaml::from_str::<ChiaNodeConfig>(&fs::read_to_string(value).map_err(|e| {
            Error::new(
                e.kind(),
                format!("Failed to read node config {}: {e}", value.display()),
            )
        })?)
        .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{e:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiaFullnodeConfig {
    #[serde(default = "full_node_rpc_port")]
    pub rpc_port: u16,
}
impl Default for ChiaFullnodeConfig {
    fn default() -> Self {
        ChiaFullnodeConfig {
            rpc_port: full_node_rpc_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateSsl {
    pub private_crt: String,
    pub private_key: String,
}
