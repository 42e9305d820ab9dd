use crate::blockchain::coin_record::CoinRecord;
use crate::blockchain::sized_bytes::Bytes32;
use serde::{Deserialize, Serialize};

/// Coins created and consumed by a single block.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BlockDelta {
    pub additions: Vec<CoinRecord>,
    pub removals: Vec<CoinRecord>,
}
impl BlockDelta {
    /// Additions created by spending the coin `coin_id`.
    pub fn children_of<'a>(&'a self, coin_id: &'a Bytes32) -> impl Iterator<Item = &'a CoinRecord> {
        self.additions
            .iter()
            .filter(move |r| r.coin.parent_coin_info == *coin_id)
    }
}
