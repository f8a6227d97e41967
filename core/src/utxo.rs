//! The UTXO pool: a mapping from `TransactionInput` to `UtxoValue` with
//! point lookup, insertion and deletion. No ordering requirements.

use crate::block::RootBlockHeader;
use crate::tx::TransactionInput;
use crate::types::{Quarkash, Recipient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `rootBlockHeader` records the earliest root commitment that makes this
/// output spendable: a spender's referencing minor block must hang off a
/// root header at or above this height (I2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoValue {
    pub recipient: Recipient,
    pub quarkash: Quarkash,
    pub root_block_header: RootBlockHeader,
}

#[derive(Clone, Debug, Default)]
pub struct UtxoPool {
    entries: HashMap<TransactionInput, UtxoValue>,
}

impl UtxoPool {
    pub fn new() -> Self {
        UtxoPool { entries: HashMap::new() }
    }

    pub fn get(&self, input: &TransactionInput) -> Option<&UtxoValue> {
        self.entries.get(input)
    }

    pub fn contains(&self, input: &TransactionInput) -> bool {
        self.entries.contains_key(input)
    }

    /// Duplicate insertion is a programming error: the caller must have
    /// already checked the input isn't live (double-spend / re-delivery of
    /// the same cross-shard output would otherwise silently clobber state).
    pub fn insert(&mut self, input: TransactionInput, value: UtxoValue) {
        let prev = self.entries.insert(input, value);
        assert!(prev.is_none(), "duplicate UTXO insertion for {:?}", input);
    }

    pub fn remove(&mut self, input: &TransactionInput) -> Option<UtxoValue> {
        self.entries.remove(input)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransactionInput, &UtxoValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn balance_of(&self, recipient: Recipient) -> Quarkash {
        self.entries
            .values()
            .filter(|v| v.recipient == recipient)
            .map(|v| v.quarkash)
            .fold(0u64, |acc, q| acc.saturating_add(q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ShardInfo;
    use crate::types::Hash;

    fn root_header(height: u64) -> RootBlockHeader {
        RootBlockHeader {
            height,
            hash_prev_block: Hash::ZERO,
            hash_merkle_root: Hash::ZERO,
            hash_coinbase_tx: Hash::ZERO,
            shard_info: ShardInfo { shard_size: 1 },
            create_time: 0,
            nonce: 0,
            difficulty: 0,
        }
    }

    #[test]
    fn insert_get_remove_round_trip() {
        let mut pool = UtxoPool::new();
        let input = TransactionInput::new(Hash::ZERO, 0);
        let value = UtxoValue { recipient: Recipient([1; 20]), quarkash: 50, root_block_header: root_header(0) };
        pool.insert(input, value.clone());
        assert_eq!(pool.get(&input), Some(&value));
        assert_eq!(pool.remove(&input), Some(value));
        assert!(pool.get(&input).is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate UTXO insertion")]
    fn duplicate_insert_asserts() {
        let mut pool = UtxoPool::new();
        let input = TransactionInput::new(Hash::ZERO, 0);
        let value = UtxoValue { recipient: Recipient([1; 20]), quarkash: 50, root_block_header: root_header(0) };
        pool.insert(input, value.clone());
        pool.insert(input, value);
    }

    #[test]
    fn balance_sums_matching_recipient_only() {
        let mut pool = UtxoPool::new();
        let r1 = Recipient([1; 20]);
        let r2 = Recipient([2; 20]);
        pool.insert(
            TransactionInput::new(Hash::ZERO, 0),
            UtxoValue { recipient: r1, quarkash: 10, root_block_header: root_header(0) },
        );
        pool.insert(
            TransactionInput::new(Hash::ZERO, 1),
            UtxoValue { recipient: r2, quarkash: 20, root_block_header: root_header(0) },
        );
        assert_eq!(pool.balance_of(r1), 10);
        assert_eq!(pool.balance_of(r2), 20);
    }
}
