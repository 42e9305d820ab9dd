use crate::blockchain::sized_bytes::Bytes32;
use serde::{Deserialize, Serialize};

/// The subset of a node's block record needed to place a spend in time.
/// Unknown fields in the node response are ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BlockRecord {
    pub header_hash: Bytes32,
    pub height: u32,
    #[serde(default)]
    pub timestamp: Option<u64>,
}
