use serde::Deserialize;
use xch_history_core::blockchain::block_record::BlockRecord;
use xch_history_core::blockchain::coin_record::CoinRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct AdditionsAndRemovalsResp {
    pub additions: Vec<CoinRecord>,
    pub removals: Vec<CoinRecord>,
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecordResp {
    pub block_record: BlockRecord,
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinRecordResp {
    pub coin_record: Option<CoinRecord>,
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinRecordAryResp {
    pub coin_records: Vec<CoinRecord>,
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInfoResp {
    pub network_name: String,
    pub network_prefix: String,
    pub success: bool,
}
