use async_trait::async_trait;
use std::io::Error;
use xch_history_core::blockchain::block_delta::BlockDelta;
use xch_history_core::blockchain::block_record::BlockRecord;
use xch_history_core::blockchain::coin_record::CoinRecord;
use xch_history_core::blockchain::network_info::NetworkInfo;
use xch_history_core::blockchain::sized_bytes::Bytes32;

/// Point lookups against a full node.
///
/// A lookup for something the node does not have fails with
/// `ErrorKind::NotFound`, except `get_coin_record_by_name` which answers
/// `None`. Every other error kind means the node could not be asked or did
/// not answer sensibly.
///
/// Callers cancel a lookup by dropping its future.
#[async_trait]
pub trait FullnodeAPI: Send + Sync {
    async fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: &Bytes32,
        include_spent_coins: Option<bool>,
        start_height: Option<u32>,
        end_height: Option<u32>,
    ) -> Result<Vec<CoinRecord>, Error>;
    async fn get_coin_record_by_name(&self, name: &Bytes32) -> Result<Option<CoinRecord>, Error>;
    async fn get_block_record_by_height(&self, height: u32) -> Result<BlockRecord, Error>;
    async fn get_additions_and_removals(&self, header_hash: &Bytes32) -> Result<BlockDelta, Error>;
    async fn get_network_info(&self) -> Result<NetworkInfo, Error>;
}
