//! Embedded `LedgerStore` backed by `heed` (LMDB bindings), generalizing
//! the teacher's `ZionStorage`: one table per key convention of §6, hex
//! block/tx hashes as `Str` keys, `SerdeBincode` for values.

use super::{LedgerStore, RootCommitRecord};
use crate::block::{MinorBlock, RootBlock, RootBlockHeader};
use crate::tx::Transaction;
use crate::types::Hash;
use anyhow::Result;
use heed::types::{SerdeBincode, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;

#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    minor_blocks: Database<Str, SerdeBincode<MinorBlock>>,
    root_blocks: Database<Str, SerdeBincode<RootBlock>>,
    minor_coinbase_txs: Database<Str, SerdeBincode<Transaction>>,
    txs: Database<Str, SerdeBincode<(Transaction, RootBlockHeader)>>,
    root_commit_records: Database<Str, SerdeBincode<RootCommitRecord>>,
}

impl LmdbStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        // Configurable map size via env var (default 10 GB), same convention
        // as the teacher's ZionStorage::open.
        let map_size_gb: usize = std::env::var("LEDGER_LMDB_MAP_SIZE_GB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let map_size_bytes = map_size_gb * 1024 * 1024 * 1024;

        let env = unsafe { EnvOpenOptions::new().map_size(map_size_bytes).max_dbs(8).open(path)? };

        let mut wtxn = env.write_txn()?;
        let minor_blocks = env.create_database(&mut wtxn, Some("mblock"))?;
        let root_blocks = env.create_database(&mut wtxn, Some("rblock"))?;
        let minor_coinbase_txs = env.create_database(&mut wtxn, Some("mblockCoinbaseTx"))?;
        let txs = env.create_database(&mut wtxn, Some("tx"))?;
        let root_commit_records = env.create_database(&mut wtxn, Some("rootCommitRecord"))?;
        wtxn.commit()?;

        Ok(LmdbStore { env, minor_blocks, root_blocks, minor_coinbase_txs, txs, root_commit_records })
    }
}

impl LedgerStore for LmdbStore {
    fn put_minor_block(&self, block: &MinorBlock) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.minor_blocks.put(&mut wtxn, &block.header.hash().to_hex(), block)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get_minor_block(&self, hash: &Hash) -> Result<Option<MinorBlock>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.minor_blocks.get(&rtxn, &hash.to_hex())?)
    }

    fn put_root_block(&self, block: &RootBlock) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.root_blocks.put(&mut wtxn, &block.header.hash().to_hex(), block)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get_root_block(&self, hash: &Hash) -> Result<Option<RootBlock>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.root_blocks.get(&rtxn, &hash.to_hex())?)
    }

    fn put_minor_block_coinbase_tx(&self, minor_hash: &Hash, tx: &Transaction) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.minor_coinbase_txs.put(&mut wtxn, &minor_hash.to_hex(), tx)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get_minor_block_coinbase_tx(&self, minor_hash: &Hash) -> Result<Option<Transaction>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.minor_coinbase_txs.get(&rtxn, &minor_hash.to_hex())?)
    }

    fn put_tx(&self, tx: &Transaction, root_block_header: &RootBlockHeader) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.txs.put(&mut wtxn, &tx.hash().to_hex(), &(tx.clone(), root_block_header.clone()))?;
        wtxn.commit()?;
        Ok(())
    }

    fn get_tx(&self, hash: &Hash) -> Result<Option<Transaction>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.txs.get(&rtxn, &hash.to_hex())?.map(|(tx, _)| tx))
    }

    fn get_tx_root_block_header(&self, hash: &Hash) -> Result<Option<RootBlockHeader>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.txs.get(&rtxn, &hash.to_hex())?.map(|(_, h)| h))
    }

    fn put_root_commit_record(&self, root_hash: &Hash, record: &RootCommitRecord) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.root_commit_records.put(&mut wtxn, &root_hash.to_hex(), record)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get_root_commit_record(&self, root_hash: &Hash) -> Result<Option<RootCommitRecord>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.root_commit_records.get(&rtxn, &root_hash.to_hex())?)
    }

    fn remove_root_commit_record(&self, root_hash: &Hash) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.root_commit_records.delete(&mut wtxn, &root_hash.to_hex())?;
        wtxn.commit()?;
        Ok(())
    }
}
