use async_trait::async_trait;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::io::{Error, ErrorKind};
use std::sync::Mutex;
use std::time::Duration;
use xch_history_clients::api::full_node::FullnodeAPI;
use xch_history_core::blockchain::block_delta::BlockDelta;
use xch_history_core::blockchain::block_record::BlockRecord;
use xch_history_core::blockchain::coin::Coin;
use xch_history_core::blockchain::coin_record::CoinRecord;
use xch_history_core::blockchain::network_info::NetworkInfo;
use xch_history_core::blockchain::sized_bytes::{Bytes32, SizedBytes};

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
pub const BLOCK_INTERVAL: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    CoinRecordsByPuzzleHash,
    CoinRecordByName,
    BlockRecordByHeight,
    AdditionsAndRemovals,
    NetworkInfo,
}

/// A full node backed by in-memory coin and block tables, with injectable
/// failures and a per-lookup call counter.
pub struct MemoryFullnode {
    network: NetworkInfo,
    coins: Vec<CoinRecord>,
    coin_index: HashMap<Bytes32, usize>,
    blocks: HashMap<u32, BlockRecord>,
    failures: HashSet<Lookup>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<Lookup, usize>>,
}
impl MemoryFullnode {
    pub fn new(prefix: &str) -> Self {
        MemoryFullnode {
            network: NetworkInfo {
                network_name: format!("{prefix}-memory"),
                network_prefix: prefix.to_string(),
            },
            coins: vec![],
            coin_index: HashMap::new(),
            blocks: HashMap::new(),
            failures: HashSet::new(),
            delay: None,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn header_hash(height: u32) -> Bytes32 {
        let mut bytes = [0xbbu8; 32];
        bytes[..4].copy_from_slice(&height.to_be_bytes());
        Bytes32::new(bytes)
    }

    pub fn block_timestamp(height: u32) -> u64 {
        GENESIS_TIMESTAMP + u64::from(height) * BLOCK_INTERVAL
    }

    /// Adds a block at `height`, replacing any block already there.
    pub fn add_block(&mut self, height: u32, timestamp: Option<u64>) -> &mut Self {
        self.blocks.insert(
            height,
            BlockRecord {
                header_hash: Self::header_hash(height),
                height,
                timestamp,
            },
        );
        self
    }

    fn ensure_block(&mut self, height: u32) {
        if !self.blocks.contains_key(&height) {
            self.add_block(height, Some(Self::block_timestamp(height)));
        }
    }

    /// Creates a coin confirmed at `height` and returns its id.
    pub fn add_coin(
        &mut self,
        parent: Bytes32,
        puzzle_hash: Bytes32,
        amount: u64,
        height: u32,
    ) -> Bytes32 {
        self.ensure_block(height);
        let coin = Coin {
            parent_coin_info: parent,
            puzzle_hash,
            amount,
        };
        let coin_id = coin.coin_id();
        self.coin_index.insert(coin_id, self.coins.len());
        self.coins.push(CoinRecord {
            coin,
            confirmed_block_index: height,
            spent_block_index: 0,
            timestamp: Self::block_timestamp(height),
            coinbase: false,
            spent: false,
        });
        coin_id
    }

    /// Marks a coin spent at `height`.
    pub fn spend(&mut self, coin_id: &Bytes32, height: u32) -> &mut Self {
        self.ensure_block(height);
        if let Some(index) = self.coin_index.get(coin_id) {
            let record = &mut self.coins[*index];
            record.spent = true;
            record.spent_block_index = height;
        }
        self
    }

    /// Spends `coin_id` at `height` into the given outputs and returns the
    /// ids of the new coins.
    pub fn spend_into(
        &mut self,
        coin_id: &Bytes32,
        height: u32,
        outputs: &[(Bytes32, u64)],
    ) -> Vec<Bytes32> {
        self.spend(coin_id, height);
        outputs
            .iter()
            .map(|(puzzle_hash, amount)| self.add_coin(*coin_id, *puzzle_hash, *amount, height))
            .collect()
    }

    /// Forgets a coin, as if the node never saw it.
    pub fn remove_coin(&mut self, coin_id: &Bytes32) -> &mut Self {
        self.coins.retain(|r| r.coin.coin_id() != *coin_id);
        self.coin_index = self
            .coins
            .iter()
            .enumerate()
            .map(|(i, r)| (r.coin.coin_id(), i))
            .collect();
        self
    }

    pub fn coin(&self, coin_id: &Bytes32) -> Option<&CoinRecord> {
        self.coin_index.get(coin_id).map(|i| &self.coins[*i])
    }

    pub fn fail_on(&mut self, lookup: Lookup) -> &mut Self {
        self.failures.insert(lookup);
        self
    }

    pub fn with_delay(&mut self, delay: Duration) -> &mut Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, lookup: Lookup) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(&lookup).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|c| c.values().sum())
            .unwrap_or_default()
    }

    async fn enter(&self, lookup: Lookup) -> Result<(), Error> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(lookup).or_default() += 1;
        }
        debug!("{lookup:?}");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failures.contains(&lookup) {
            return Err(Error::new(
                ErrorKind::ConnectionRefused,
                format!("{lookup:?} unavailable"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FullnodeAPI for MemoryFullnode {
    async fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: &Bytes32,
        include_spent_coins: Option<bool>,
        start_height: Option<u32>,
        end_height: Option<u32>,
    ) -> Result<Vec<CoinRecord>, Error> {
        self.enter(Lookup::CoinRecordsByPuzzleHash).await?;
        let include_spent = include_spent_coins.unwrap_or(false);
        Ok(self
            .coins
            .iter()
            .filter(|r| r.coin.puzzle_hash == *puzzle_hash)
            .filter(|r| include_spent || !r.spent)
            .filter(|r| start_height.map_or(true, |h| r.confirmed_block_index >= h))
            .filter(|r| end_height.map_or(true, |h| r.confirmed_block_index < h))
            .cloned()
            .collect())
    }

    async fn get_coin_record_by_name(&self, name: &Bytes32) -> Result<Option<CoinRecord>, Error> {
        self.enter(Lookup::CoinRecordByName).await?;
        Ok(self.coin(name).cloned())
    }

    async fn get_block_record_by_height(&self, height: u32) -> Result<BlockRecord, Error> {
        self.enter(Lookup::BlockRecordByHeight).await?;
        self.blocks.get(&height).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Block at height {height} not found"),
            )
        })
    }

    async fn get_additions_and_removals(&self, header_hash: &Bytes32) -> Result<BlockDelta, Error> {
        self.enter(Lookup::AdditionsAndRemovals).await?;
        let block = self
            .blocks
            .values()
            .find(|b| b.header_hash == *header_hash)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::NotFound,
                    format!("Block {header_hash} not found"),
                )
            })?;
        Ok(BlockDelta {
            additions: self
                .coins
                .iter()
                .filter(|r| r.confirmed_block_index == block.height)
                .cloned()
                .collect(),
            removals: self
                .coins
                .iter()
                .filter(|r| r.spent && r.spent_block_index == block.height)
                .cloned()
                .collect(),
        })
    }

    async fn get_network_info(&self) -> Result<NetworkInfo, Error> {
        self.enter(Lookup::NetworkInfo).await?;
        Ok(self.network.clone())
    }
}

pub fn hash(b: u8) -> Bytes32 {
    Bytes32::new([b; 32])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_fullnode_tables() {
        let mut node = MemoryFullnode::new("xch");
        let funding = node.add_coin(hash(1), hash(2), 1000, 3);
        let outputs = node.spend_into(&funding, 7, &[(hash(3), 600), (hash(2), 400)]);
        assert_eq!(outputs.len(), 2);
        let unspent = node
            .get_coin_records_by_puzzle_hash(&hash(2), None, None, None)
            .await
            .unwrap();
        assert_eq!(unspent.len(), 1);
        let all = node
            .get_coin_records_by_puzzle_hash(&hash(2), Some(true), None, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        let block = node.get_block_record_by_height(7).await.unwrap();
        assert_eq!(block.timestamp, Some(MemoryFullnode::block_timestamp(7)));
        let delta = node.get_additions_and_removals(&block.header_hash).await.unwrap();
        assert_eq!(delta.children_of(&funding).count(), 2);
        assert_eq!(delta.removals.len(), 1);
        assert!(node.get_coin_record_by_name(&hash(9)).await.unwrap().is_none());
        assert_eq!(node.calls(Lookup::CoinRecordsByPuzzleHash), 2);
        assert_eq!(node.total_calls(), 5);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mut node = MemoryFullnode::new("xch");
        node.fail_on(Lookup::NetworkInfo);
        let err = node.get_network_info().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
        assert_eq!(node.calls(Lookup::NetworkInfo), 1);
    }
}
