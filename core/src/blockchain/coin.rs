use crate::blockchain::sized_bytes::Bytes32;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Coin {
    pub parent_coin_info: Bytes32,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
}
impl Coin {
    #[must_use]
    pub fn coin_id(&self) -> Bytes32 {
        let mut hasher = Sha256::new();
        hasher.update(self.parent_coin_info);
        hasher.update(self.puzzle_hash);
        hasher.update(canonical_amount(self.amount));
        let digest: [u8; 32] = hasher.finalize().into();
        digest.into()
    }
}

/// Minimal big-endian two's complement encoding of an unsigned amount, the
/// form the chain hashes coin amounts in.
fn canonical_amount(amount: u64) -> Vec<u8> {
    if amount == 0 {
        return vec![];
    }
    let bytes = amount.to_be_bytes();
    let first = (amount.leading_zeros() / 8) as usize;
    let mut out = Vec::with_capacity(9);
    if bytes[first] & 0x80 != 0 {
        out.push(0u8);
    }
    out.extend_from_slice(&bytes[first..]);
    out
}
