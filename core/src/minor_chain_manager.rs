//! `MinorChainManager`: a read-only index of validated minor headers across
//! every shard (§2 component C). It performs no consensus validation of its
//! own — `ShardState` is the sole writer of chain state; this module exists
//! so a block can be looked up by hash without knowing which shard it came
//! from, and so genesis blocks are reachable by shard id from one place.

use crate::block::{MinorBlock, MinorBlockHeader};
use crate::storage::LedgerStore;
use crate::types::Hash;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MinorChainManager {
    genesis_blocks: Vec<MinorBlock>,
    headers_by_hash: HashMap<Hash, MinorBlockHeader>,
    store: Arc<dyn LedgerStore>,
}

impl MinorChainManager {
    pub fn new(genesis_blocks: Vec<MinorBlock>, store: Arc<dyn LedgerStore>) -> Self {
        let headers_by_hash = genesis_blocks.iter().map(|b| (b.header.hash(), b.header.clone())).collect();
        MinorChainManager { genesis_blocks, headers_by_hash, store }
    }

    pub fn get_genesis_block(&self, shard_id: usize) -> Option<&MinorBlock> {
        self.genesis_blocks.get(shard_id)
    }

    /// Records a newly validated minor block. Called after `ShardState`
    /// has already accepted it; this is bookkeeping, not a second
    /// validation pass.
    pub fn add_new_block(&mut self, block: &MinorBlock) {
        self.headers_by_hash.insert(block.header.hash(), block.header.clone());
    }

    pub fn get_block_header(&self, hash: &Hash) -> Option<&MinorBlockHeader> {
        self.headers_by_hash.get(hash)
    }

    pub fn get_block(&self, hash: &Hash) -> anyhow::Result<Option<MinorBlock>> {
        self.store.get_minor_block(hash)
    }

    pub fn is_validated(&self, hash: &Hash) -> bool {
        self.headers_by_hash.contains_key(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{create_genesis_blocks, ShardGenesis};
    use crate::storage::memory::MemoryStore;
    use crate::types::Recipient;

    #[test]
    fn indexes_genesis_blocks_by_hash() {
        let premine = vec![
            ShardGenesis { recipient: Recipient([1; 20]), quarkash: 1 },
            ShardGenesis { recipient: Recipient([2; 20]), quarkash: 2 },
        ];
        let (_root, minors) = create_genesis_blocks(2, &premine);
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let manager = MinorChainManager::new(minors.clone(), store);
        assert!(manager.is_validated(&minors[0].header.hash()));
        assert!(manager.is_validated(&minors[1].header.hash()));
        assert_eq!(manager.get_genesis_block(0).unwrap().header.branch.shard_id, 0);
    }
}
