use serde::{Deserialize, Serialize};
use xch_history_keys::Address;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct SendTransaction {
    pub destination: Address,
    pub amount: u64,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ReceiveTransaction {
    pub sender: Address,
    pub amount: u64,
}

/// One logical event on an address. `fee` is `amount` minus every coin
/// attributed to the event, so it can go negative.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Group<T> {
    pub transactions: Vec<T>,
    pub timestamp: u64,
    pub block: u32,
    pub amount: u64,
    pub fee: i64,
}

/// A group still being filled. The balance stays in `i128` until `finish`,
/// so `amount - attributed` is exact for any `u64` amounts and only the
/// stored fee is clamped to the `i64` range.
#[derive(Debug)]
pub struct PendingGroup<T> {
    group: Group<T>,
    balance: i128,
}
impl<T> PendingGroup<T> {
    pub fn new(timestamp: u64, block: u32, amount: u64) -> Self {
        PendingGroup {
            group: Group {
                transactions: vec![],
                timestamp,
                block,
                amount,
                fee: 0,
            },
            balance: i128::from(amount),
        }
    }
    pub fn push(&mut self, transaction: T) {
        self.group.transactions.push(transaction);
    }
    pub fn debit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_sub(i128::from(amount));
    }
    pub fn finish(self) -> Group<T> {
        let mut group = self.group;
        group.fee = clamp_fee(self.balance);
        group
    }
}

fn clamp_fee(balance: i128) -> i64 {
    i64::try_from(balance).unwrap_or(if balance < 0 { i64::MIN } else { i64::MAX })
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransactionGroup {
    Send(Group<SendTransaction>),
    Receive(Group<ReceiveTransaction>),
}
impl TransactionGroup {
    pub fn timestamp(&self) -> u64 {
        match self {
            TransactionGroup::Send(g) => g.timestamp,
            TransactionGroup::Receive(g) => g.timestamp,
        }
    }
    pub fn block(&self) -> u32 {
        match self {
            TransactionGroup::Send(g) => g.block,
            TransactionGroup::Receive(g) => g.block,
        }
    }
    pub fn amount(&self) -> u64 {
        match self {
            TransactionGroup::Send(g) => g.amount,
            TransactionGroup::Receive(g) => g.amount,
        }
    }
    pub fn fee(&self) -> i64 {
        match self {
            TransactionGroup::Send(g) => g.fee,
            TransactionGroup::Receive(g) => g.fee,
        }
    }
    pub fn is_send(&self) -> bool {
        matches!(self, TransactionGroup::Send(_))
    }
}
