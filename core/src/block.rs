//! Minor (shard) and root block/header types, plus the merkle root used by
//! both: minor blocks over their transaction list, root blocks over their
//! embedded minor header list.

use crate::crypto;
use crate::tx::Transaction;
use crate::types::{Branch, Hash};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinorBlockHeader {
    pub height: u64,
    pub branch: Branch,
    pub hash_prev_minor_block: Hash,
    pub hash_prev_root_block: Hash,
    pub hash_merkle_root: Hash,
    pub create_time: u64,
    pub nonce: u64,
    pub difficulty: u64,
}

impl MinorBlockHeader {
    pub fn hash(&self) -> Hash {
        let bytes = bincode::serialize(self).expect("header is always serializable");
        crypto::hash::blake_hash(&bytes)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinorBlock {
    pub header: MinorBlockHeader,
    /// Index 0 is always the coinbase transaction.
    pub tx_list: Vec<Transaction>,
}

impl MinorBlock {
    pub fn coinbase(&self) -> &Transaction {
        &self.tx_list[0]
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    pub shard_size: u32,
}

impl ShardInfo {
    pub fn shard_size(&self) -> u32 {
        self.shard_size
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootBlockHeader {
    pub height: u64,
    pub hash_prev_block: Hash,
    pub hash_merkle_root: Hash,
    pub hash_coinbase_tx: Hash,
    pub shard_info: ShardInfo,
    pub create_time: u64,
    pub nonce: u64,
    pub difficulty: u64,
}

impl RootBlockHeader {
    pub fn hash(&self) -> Hash {
        let bytes = bincode::serialize(self).expect("header is always serializable");
        crypto::hash::blake_hash(&bytes)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RootBlock {
    pub header: RootBlockHeader,
    pub coinbase_tx: Transaction,
    pub minor_block_header_list: Vec<MinorBlockHeader>,
}

/// A discriminated union over the two block kinds, for any outer worker
/// (mining, sync) exchanging candidate blocks generically. The ledger core
/// itself never needs this — `LedgerCoordinator` takes concrete types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Block {
    Minor(MinorBlock),
    Root(RootBlock),
}

/// Merkle root over any sequence of hashable items. Generic over
/// `MinorBlockHeader` (root block building its merkle root over embedded
/// headers) and `Transaction` (minor block building its merkle root over
/// its tx list) via the `Hashable` trait below.
pub trait Hashable {
    fn content_hash(&self) -> Hash;
}

impl Hashable for Transaction {
    fn content_hash(&self) -> Hash {
        self.hash()
    }
}

impl Hashable for MinorBlockHeader {
    fn content_hash(&self) -> Hash {
        self.hash()
    }
}

pub fn calculate_merkle_root<T: Hashable>(items: &[T]) -> Hash {
    if items.is_empty() {
        return Hash::ZERO;
    }
    let mut level: Vec<Hash> = items.iter().map(|i| i.content_hash()).collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let mut data = Vec::with_capacity(64);
            data.extend_from_slice(pair[0].as_bytes());
            data.extend_from_slice(pair.get(1).unwrap_or(&pair[0]).as_bytes());
            next.push(crypto::hash::blake_hash(&data));
        }
        level = next;
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{Address, Transaction, TransactionOutput};
    use crate::types::{Code, Recipient};

    fn coinbase_tx() -> Transaction {
        Transaction::new_coinbase(
            Code::minor_coinbase(1),
            TransactionOutput {
                address: Address { recipient: Recipient::ZERO, full_shard_id: 0 },
                quarkash: 100,
            },
        )
    }

    #[test]
    fn merkle_root_single_item_is_its_hash() {
        let tx = coinbase_tx();
        assert_eq!(calculate_merkle_root(&[tx.clone()]), tx.hash());
    }

    #[test]
    fn merkle_root_empty_is_zero() {
        assert_eq!(calculate_merkle_root::<Transaction>(&[]), Hash::ZERO);
    }

    #[test]
    fn merkle_root_changes_with_order() {
        let a = coinbase_tx();
        let mut b = coinbase_tx();
        b.out_list[0].quarkash = 200;
        assert_ne!(calculate_merkle_root(&[a.clone(), b.clone()]), calculate_merkle_root(&[b, a]));
    }
}
