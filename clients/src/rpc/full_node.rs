use crate::api::full_node::FullnodeAPI;
use crate::api::responses::{
    AdditionsAndRemovalsResp, BlockRecordResp, CoinRecordAryResp, CoinRecordResp,
    NetworkInfoResp,
};
use crate::rpc::{get_client, get_url, post};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map};
use std::io::{Error, ErrorKind};
use std::time::Duration;
use xch_history_core::blockchain::block_delta::BlockDelta;
use xch_history_core::blockchain::block_record::BlockRecord;
use xch_history_core::blockchain::coin_record::CoinRecord;
use xch_history_core::blockchain::network_info::NetworkInfo;
use xch_history_core::blockchain::sized_bytes::Bytes32;
use xch_history_core::config::NodeConnection;

pub struct FullnodeClient {
    client: Client,
    pub host: String,
    pub port: u16,
}

impl FullnodeClient {
    pub fn new(connection: &NodeConnection) -> Result<Self, Error> {
        Ok(FullnodeClient {
            client: get_client(
                &connection.ssl,
                Duration::from_secs(connection.timeout_secs),
            )?,
            host: connection.host.clone(),
            port: connection.port,
        })
    }
    fn url(&self, endpoint: &str) -> String {
        get_url(self.host.as_str(), self.port, endpoint)
    }
}

#[async_trait]
impl FullnodeAPI for FullnodeClient {
    async fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: &Bytes32,
        include_spent_coins: Option<bool>,
        start_height: Option<u32>,
        end_height: Option<u32>,
    ) -> Result<Vec<CoinRecord>, Error> {
        let mut request_body = Map::new();
        request_body.insert("puzzle_hash".to_string(), json!(puzzle_hash));
        if let Some(include_spent_coins) = include_spent_coins {
            request_body.insert(
                "include_spent_coins".to_string(),
                json!(include_spent_coins),
            );
        }
        if let Some(start_height) = start_height {
            request_body.insert("start_height".to_string(), json!(start_height));
        }
        if let Some(end_height) = end_height {
            request_body.insert("end_height".to_string(), json!(end_height));
        }
        Ok(post::<CoinRecordAryResp>(
            &self.client,
            &self.url("get_coin_records_by_puzzle_hash"),
            &request_body,
        )
        .await?
        .coin_records)
    }
    async fn get_coin_record_by_name(&self, name: &Bytes32) -> Result<Option<CoinRecord>, Error> {
        let mut request_body = Map::new();
        request_body.insert("name".to_string(), json!(name));
        match post::<CoinRecordResp>(
            &self.client,
            &self.url("get_coin_record_by_name"),
            &request_body,
        )
        .await
        {
            Ok(resp) => Ok(resp.coin_record),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
    async fn get_block_record_by_height(&self, height: u32) -> Result<BlockRecord, Error> {
        let mut request_body = Map::new();
        request_body.insert("height".to_string(), json!(height));
        Ok(post::<BlockRecordResp>(
            &self.client,
            &self.url("get_block_record_by_height"),
            &request_body,
        )
        .await?
        .block_record)
    }
    async fn get_additions_and_removals(&self, header_hash: &Bytes32) -> Result<BlockDelta, Error> {
        let mut request_body = Map::new();
        request_body.insert("header_hash".to_string(), json!(header_hash));
        let resp = post::<AdditionsAndRemovalsResp>(
            &self.client,
            &self.url("get_additions_and_removals"),
            &request_body,
        )
        .await?;
        Ok(BlockDelta {
            additions: resp.additions,
            removals: resp.removals,
        })
    }
    async fn get_network_info(&self) -> Result<NetworkInfo, Error> {
        let resp = post::<NetworkInfoResp>(
            &self.client,
            &self.url("get_network_info"),
            &Map::new(),
        )
        .await?;
        Ok(NetworkInfo {
            network_name: resp.network_name,
            network_prefix: resp.network_prefix,
        })
    }
}
