use crate::groups::{PendingGroup, ReceiveTransaction, SendTransaction, TransactionGroup};
use futures_util::future::try_join;
use futures_util::{stream, StreamExt, TryStreamExt};
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::io::{Error, ErrorKind};
use xch_history_clients::api::full_node::FullnodeAPI;
use xch_history_core::blockchain::coin_record::CoinRecord;
use xch_history_core::blockchain::sized_bytes::Bytes32;
use xch_history_core::errors::HistoryError;
use xch_history_keys::Address;

const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructOptions {
    /// Coin records resolved at the same time. Each one may need up to three
    /// node round trips.
    pub max_concurrent_lookups: usize,
}
impl Default for ReconstructOptions {
    fn default() -> Self {
        ReconstructOptions {
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }
}

/// Everything the node had to say about one of the address's coin records.
#[derive(Debug, Clone)]
struct ResolvedRecord {
    record: CoinRecord,
    parent: CoinRecord,
    spend: Option<ResolvedSpend>,
}

#[derive(Debug, Clone)]
struct ResolvedSpend {
    timestamp: u64,
    children: Vec<CoinRecord>,
}

/// Coin records for the address, as the node lists them by default.
pub async fn list_records(
    node: &dyn FullnodeAPI,
    address: &Address,
) -> Result<Vec<CoinRecord>, HistoryError> {
    Ok(node
        .get_coin_records_by_puzzle_hash(&address.hash, None, None, None)
        .await?)
}

/// Builds the send/receive history of `address`, most recent first.
///
/// Either every lookup succeeds and the full history is returned, or the
/// first failure is returned and any lookups still in flight are dropped.
pub async fn reconstruct(
    node: &dyn FullnodeAPI,
    address: &Address,
    options: &ReconstructOptions,
) -> Result<Vec<TransactionGroup>, HistoryError> {
    let records = node
        .get_coin_records_by_puzzle_hash(&address.hash, Some(true), None, None)
        .await?;
    let total = records.len();
    let records = distinct_nonzero(records);
    debug!(
        "Resolving {} of {total} coin records for {address}",
        records.len()
    );
    let mut resolved: Vec<(usize, ResolvedRecord)> = stream::iter(records.into_iter().enumerate())
        .map(|(index, record)| async move {
            resolve_record(node, record).await.map(|r| (index, r))
        })
        .buffer_unordered(options.max_concurrent_lookups.max(1))
        .try_collect()
        .await?;
    resolved.sort_by_key(|(index, _)| *index);
    let groups = aggregate(address, resolved.into_iter().map(|(_, r)| r));
    info!("Built {} transaction groups for {address}", groups.len());
    Ok(groups)
}

/// Drops zero value coins and repeated coin ids, keeping the node's order.
fn distinct_nonzero(records: Vec<CoinRecord>) -> Vec<CoinRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.coin.amount != 0)
        .filter(|r| seen.insert(r.coin.coin_id()))
        .collect()
}

async fn resolve_record(
    node: &dyn FullnodeAPI,
    record: CoinRecord,
) -> Result<ResolvedRecord, Error> {
    let (parent, spend) =
        try_join(resolve_parent(node, &record), resolve_spend(node, &record)).await?;
    debug!(
        "Resolved coin {} (spent: {})",
        record.coin.coin_id(),
        spend.is_some()
    );
    Ok(ResolvedRecord {
        record,
        parent,
        spend,
    })
}

async fn resolve_parent(node: &dyn FullnodeAPI, record: &CoinRecord) -> Result<CoinRecord, Error> {
    let parent_id = record.coin.parent_coin_info;
    node.get_coin_record_by_name(&parent_id)
        .await?
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Parent coin record {parent_id} not found"),
            )
        })
}

async fn resolve_spend(
    node: &dyn FullnodeAPI,
    record: &CoinRecord,
) -> Result<Option<ResolvedSpend>, Error> {
    if !record.spent {
        return Ok(None);
    }
    let block = node
        .get_block_record_by_height(record.spent_block_index)
        .await?;
    let timestamp = block.timestamp.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            format!(
                "Block {} at height {} has no timestamp",
                block.header_hash, block.height
            ),
        )
    })?;
    let delta = node.get_additions_and_removals(&block.header_hash).await?;
    let coin_id = record.coin.coin_id();
    let children = delta.children_of(&coin_id).cloned().collect();
    Ok(Some(ResolvedSpend {
        timestamp,
        children,
    }))
}

/// Folds resolved records into groups. Receives are merged by parent coin,
/// each spend is its own group. Ties on timestamp keep creation order with
/// receives ahead of sends.
fn aggregate(
    address: &Address,
    resolved: impl IntoIterator<Item = ResolvedRecord>,
) -> Vec<TransactionGroup> {
    let mut receives: Vec<PendingGroup<ReceiveTransaction>> = vec![];
    let mut receive_index: HashMap<Bytes32, usize> = HashMap::new();
    let mut sends: Vec<PendingGroup<SendTransaction>> = vec![];
    for ResolvedRecord {
        record,
        parent,
        spend,
    } in resolved
    {
        let coin = &record.coin;
        if parent.coin.puzzle_hash != address.hash {
            let index = *receive_index
                .entry(coin.parent_coin_info)
                .or_insert_with(|| {
                    receives.push(PendingGroup::new(
                        record.timestamp,
                        record.confirmed_block_index,
                        coin.amount,
                    ));
                    receives.len() - 1
                });
            let group = &mut receives[index];
            group.push(ReceiveTransaction {
                sender: Address::new(&address.prefix, parent.coin.puzzle_hash),
                amount: coin.amount,
            });
            group.debit(coin.amount);
        }
        if let Some(spend) = spend {
            let mut group =
                PendingGroup::new(spend.timestamp, record.spent_block_index, coin.amount);
            for child in spend.children {
                if child.coin.puzzle_hash != address.hash {
                    group.push(SendTransaction {
                        destination: Address::new(&address.prefix, child.coin.puzzle_hash),
                        amount: child.coin.amount,
                    });
                }
                group.debit(child.coin.amount);
            }
            sends.push(group);
        }
    }
    let mut groups: Vec<TransactionGroup> = receives
        .into_iter()
        .map(|g| TransactionGroup::Receive(g.finish()))
        .chain(sends.into_iter().map(|g| TransactionGroup::Send(g.finish())))
        .collect();
    groups.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    groups
}
