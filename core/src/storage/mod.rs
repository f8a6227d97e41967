//! The persistence contract of §6, modeled as a capability trait so the
//! ledger core can run against an in-memory map in tests and an embedded
//! store (see `storage::lmdb`) in a real node.

pub mod lmdb;
pub mod memory;

use crate::block::{MinorBlock, RootBlock, RootBlockHeader};
use crate::tx::{Transaction, TransactionInput};
use crate::types::{Hash, ShardId};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// For a single committed root block: which `(destination shard,
/// TransactionInput)` pairs it delivered to destination shards, so
/// `rollBackRootBlock` can remove exactly those (§9 "Cross-shard delivery
/// recovery").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RootCommitRecord {
    pub delivered: Vec<(ShardId, TransactionInput)>,
}

pub trait LedgerStore: Send + Sync {
    fn put_minor_block(&self, block: &MinorBlock) -> Result<()>;
    fn get_minor_block(&self, hash: &Hash) -> Result<Option<MinorBlock>>;

    fn put_root_block(&self, block: &RootBlock) -> Result<()>;
    fn get_root_block(&self, hash: &Hash) -> Result<Option<RootBlock>>;

    /// `mblockCoinbaseTx_<minorHash>` — the coinbase tx of a minor block,
    /// indexed separately so root-block validation can read it without
    /// deserializing the whole minor block.
    fn put_minor_block_coinbase_tx(&self, minor_hash: &Hash, tx: &Transaction) -> Result<()>;
    fn get_minor_block_coinbase_tx(&self, minor_hash: &Hash) -> Result<Option<Transaction>>;

    /// A transaction plus the root header that confirmed it (needed to
    /// restore a UTXO on rollback, per `rollBackTx`).
    fn put_tx(&self, tx: &Transaction, root_block_header: &RootBlockHeader) -> Result<()>;
    fn get_tx(&self, hash: &Hash) -> Result<Option<Transaction>>;
    fn get_tx_root_block_header(&self, hash: &Hash) -> Result<Option<RootBlockHeader>>;

    fn put_root_commit_record(&self, root_hash: &Hash, record: &RootCommitRecord) -> Result<()>;
    fn get_root_commit_record(&self, root_hash: &Hash) -> Result<Option<RootCommitRecord>>;
    fn remove_root_commit_record(&self, root_hash: &Hash) -> Result<()>;
}
