//! In-memory `LedgerStore`: the reference implementation of the persistence
//! contract's semantics, used by every test in the crate.

use super::{LedgerStore, RootCommitRecord};
use crate::block::{MinorBlock, RootBlock, RootBlockHeader};
use crate::tx::Transaction;
use crate::types::Hash;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    minor_blocks: RwLock<HashMap<Hash, MinorBlock>>,
    root_blocks: RwLock<HashMap<Hash, RootBlock>>,
    minor_coinbase_txs: RwLock<HashMap<Hash, Transaction>>,
    txs: RwLock<HashMap<Hash, (Transaction, RootBlockHeader)>>,
    root_commit_records: RwLock<HashMap<Hash, RootCommitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl LedgerStore for MemoryStore {
    fn put_minor_block(&self, block: &MinorBlock) -> Result<()> {
        self.minor_blocks.write().unwrap().insert(block.header.hash(), block.clone());
        Ok(())
    }

    fn get_minor_block(&self, hash: &Hash) -> Result<Option<MinorBlock>> {
        Ok(self.minor_blocks.read().unwrap().get(hash).cloned())
    }

    fn put_root_block(&self, block: &RootBlock) -> Result<()> {
        self.root_blocks.write().unwrap().insert(block.header.hash(), block.clone());
        Ok(())
    }

    fn get_root_block(&self, hash: &Hash) -> Result<Option<RootBlock>> {
        Ok(self.root_blocks.read().unwrap().get(hash).cloned())
    }

    fn put_minor_block_coinbase_tx(&self, minor_hash: &Hash, tx: &Transaction) -> Result<()> {
        self.minor_coinbase_txs.write().unwrap().insert(*minor_hash, tx.clone());
        Ok(())
    }

    fn get_minor_block_coinbase_tx(&self, minor_hash: &Hash) -> Result<Option<Transaction>> {
        Ok(self.minor_coinbase_txs.read().unwrap().get(minor_hash).cloned())
    }

    fn put_tx(&self, tx: &Transaction, root_block_header: &RootBlockHeader) -> Result<()> {
        self.txs.write().unwrap().insert(tx.hash(), (tx.clone(), root_block_header.clone()));
        Ok(())
    }

    fn get_tx(&self, hash: &Hash) -> Result<Option<Transaction>> {
        Ok(self.txs.read().unwrap().get(hash).map(|(tx, _)| tx.clone()))
    }

    fn get_tx_root_block_header(&self, hash: &Hash) -> Result<Option<RootBlockHeader>> {
        Ok(self.txs.read().unwrap().get(hash).map(|(_, h)| h.clone()))
    }

    fn put_root_commit_record(&self, root_hash: &Hash, record: &RootCommitRecord) -> Result<()> {
        self.root_commit_records.write().unwrap().insert(*root_hash, record.clone());
        Ok(())
    }

    fn get_root_commit_record(&self, root_hash: &Hash) -> Result<Option<RootCommitRecord>> {
        Ok(self.root_commit_records.read().unwrap().get(root_hash).cloned())
    }

    fn remove_root_commit_record(&self, root_hash: &Hash) -> Result<()> {
        self.root_commit_records.write().unwrap().remove(root_hash);
        Ok(())
    }
}
