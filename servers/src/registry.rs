use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use xch_history_clients::api::full_node::FullnodeAPI;
use xch_history_clients::rpc::full_node::FullnodeClient;
use xch_history_core::config::{BlockchainConfig, HistoryConfig};
use xch_history_core::errors::ValidationError;

pub type SharedFullnode = Arc<dyn FullnodeAPI>;

/// The networks this instance answers for, keyed by ticker (the address
/// prefix). Built once at startup and shared read-only.
#[derive(Default)]
pub struct NetworkRegistry {
    blockchains: HashMap<String, BlockchainConfig>,
    nodes: HashMap<String, SharedFullnode>,
}
impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every configured blockchain. A blockchain whose node client
    /// cannot be built stays registered without a node.
    pub fn from_config(config: &HistoryConfig) -> Self {
        let mut registry = Self::new();
        for blockchain in &config.blockchains {
            let node = match blockchain
                .node_connection()
                .and_then(|c| FullnodeClient::new(&c))
            {
                Ok(client) => {
                    info!(
                        "Registered {} full node at {}:{}",
                        blockchain.ticker, client.host, client.port
                    );
                    Some(Arc::new(client) as SharedFullnode)
                }
                Err(e) => {
                    warn!("No full node for {}: {e}", blockchain.ticker);
                    None
                }
            };
            registry.register(blockchain.clone(), node);
        }
        registry
    }

    pub fn register(&mut self, blockchain: BlockchainConfig, node: Option<SharedFullnode>) {
        let ticker = blockchain.ticker.to_lowercase();
        match node {
            Some(node) => {
                self.nodes.insert(ticker.clone(), node);
            }
            None => {
                self.nodes.remove(&ticker);
            }
        }
        self.blockchains.insert(ticker, blockchain);
    }

    pub fn with_blockchain(
        mut self,
        blockchain: BlockchainConfig,
        node: Option<SharedFullnode>,
    ) -> Self {
        self.register(blockchain, node);
        self
    }

    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.blockchains.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    pub fn resolve(&self, prefix: &str) -> Result<SharedFullnode, ValidationError> {
        let prefix = prefix.to_lowercase();
        if !self.blockchains.contains_key(&prefix) {
            return Err(ValidationError::UnknownBlockchain(prefix));
        }
        self.nodes
            .get(&prefix)
            .cloned()
            .ok_or(ValidationError::UnsupportedBlockchain(prefix))
    }

    /// Asks every node which network it is on and warns when that disagrees
    /// with the ticker it was configured under.
    pub async fn check_networks(&self) {
        for ticker in self.tickers() {
            let Some(node) = self.nodes.get(ticker) else {
                continue;
            };
            match node.get_network_info().await {
                Ok(info) if info.network_prefix.eq_ignore_ascii_case(ticker) => {
                    info!("{ticker} full node is on {}", info.network_name);
                }
                Ok(info) => warn!(
                    "{ticker} full node reports prefix {} on {}",
                    info.network_prefix, info.network_name
                ),
                Err(e) => warn!("Could not reach {ticker} full node: {e}"),
            }
        }
    }
}
