//! `RootChain`: the chain that commits minor headers and enforces proof of
//! progress across shards. §4.D.

use crate::block::{calculate_merkle_root, MinorBlockHeader, RootBlock, RootBlockHeader};
use crate::config::LedgerConfig;
use crate::storage::LedgerStore;
use crate::types::{Code, Hash, Quarkash, ShardId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct RootChain {
    genesis_header: RootBlockHeader,
    chain: Vec<RootBlockHeader>,
    by_hash: HashMap<Hash, RootBlockHeader>,
    store: Arc<dyn LedgerStore>,
    config: Arc<LedgerConfig>,
}

impl RootChain {
    pub fn new(genesis_block: RootBlock, store: Arc<dyn LedgerStore>) -> anyhow::Result<Self> {
        Self::with_config(genesis_block, store, Arc::new(LedgerConfig::default()))
    }

    pub fn with_config(genesis_block: RootBlock, store: Arc<dyn LedgerStore>, config: Arc<LedgerConfig>) -> anyhow::Result<Self> {
        let header = genesis_block.header.clone();
        store.put_root_block(&genesis_block)?;
        let mut by_hash = HashMap::new();
        by_hash.insert(header.hash(), header.clone());
        Ok(RootChain { genesis_header: header.clone(), chain: vec![header], by_hash, store, config })
    }

    pub fn genesis_header(&self) -> &RootBlockHeader {
        &self.genesis_header
    }

    pub fn tip(&self) -> &RootBlockHeader {
        self.chain.last().expect("genesis header is always present")
    }

    pub fn get_block_header_by_hash(&self, hash: &Hash) -> Option<RootBlockHeader> {
        self.by_hash.get(hash).cloned()
    }

    pub fn get_block_header_by_height(&self, height: u64) -> Option<&RootBlockHeader> {
        self.chain.get(height as usize)
    }

    /// Validates and appends `block`, in the order of §4.D: linkage,
    /// height, coinbase shape and hash, merkle root over the embedded
    /// minor headers, difficulty, that every embedded header was actually
    /// uncommitted, shard-size agreement, then the per-shard linkage and
    /// proof-of-progress walk and the coinbase-amount bound.
    pub fn append_block(&mut self, block: RootBlock, uncommitted: &mut HashSet<MinorBlockHeader>) -> Result<(), String> {
        let header = block.header.clone();
        let tip = self.tip().clone();
        log::debug!("root chain: appending root block at height {}", header.height);

        if header.hash_prev_block != tip.hash() {
            return Err("root block does not link to the current tip".to_string());
        }
        if header.height != tip.height + 1 {
            return Err("root block height mismatch".to_string());
        }
        if header.hash_coinbase_tx != block.coinbase_tx.hash() {
            return Err("coinbase tx hash mismatch".to_string());
        }
        if !block.coinbase_tx.in_list.is_empty()
            || block.coinbase_tx.out_list.len() != 1
            || block.coinbase_tx.code != Code::root_coinbase(header.height)
        {
            return Err("incorrect root coinbase tx".to_string());
        }
        if header.hash_merkle_root != calculate_merkle_root(&block.minor_block_header_list) {
            return Err("incorrect merkle root".to_string());
        }
        if !self.config.skip_root_difficulty_check {
            return Err("root difficulty check is not implemented".to_string());
        }
        if block.minor_block_header_list.is_empty() {
            return Err("root block must commit at least one minor block".to_string());
        }
        for mheader in &block.minor_block_header_list {
            if !uncommitted.contains(mheader) {
                return Err("root block confirms a non-existent or already-committed minor block".to_string());
            }
            if mheader.branch.shard_size != header.shard_info.shard_size {
                return Err("minor header shard size does not match root block shard info".to_string());
            }
        }

        let prev_block = self
            .store
            .get_root_block(&tip.hash())
            .map_err(|e| format!("persistence error: {e}"))?
            .expect("previous root block is always persisted at commit time");

        let last_block_hash_list = last_block_hash_per_shard(&prev_block)?;
        let total_minor_coinbase = self.walk_shard_linkage(&block, &last_block_hash_list)?;

        if block.coinbase_tx.out_list[0].quarkash > total_minor_coinbase {
            return Err("root coinbase exceeds collected minor coinbase".to_string());
        }

        self.store.put_root_block(&block).map_err(|e| format!("persistence error: {e}"))?;
        for mheader in &block.minor_block_header_list {
            uncommitted.remove(mheader);
        }
        log::info!("root chain: committed root block at height {}", header.height);
        self.by_hash.insert(header.hash(), header.clone());
        self.chain.push(header);
        Ok(())
    }

    /// Walks `block.minor_block_header_list`, enforcing: starts at shard 0,
    /// every header links to the previous one within its shard (or to the
    /// previous root block's last header for that shard when the shard
    /// changes), shard ids only ever advance by one, and each shard
    /// contributes at least `proof_of_progress_blocks` headers before the
    /// walk may advance past it. Returns the sum of minor coinbase amounts
    /// collected along the way, used to bound the root coinbase.
    fn walk_shard_linkage(&self, block: &RootBlock, last_block_hash_list: &[Hash]) -> Result<Quarkash, String> {
        let headers = &block.minor_block_header_list;
        let first = &headers[0];
        if first.branch.shard_id != 0 {
            return Err("first minor block header must start from shard 0".to_string());
        }
        if first.hash_prev_minor_block != last_block_hash_list[0] {
            return Err("first minor block in shard doesn't link to the previous root block's header".to_string());
        }

        let mut shard_id: ShardId = 0;
        let mut prev_header = first;
        let mut block_count_in_shard: u32 = 1;
        let mut total_minor_coinbase = self.coinbase_quarkash(first)?;

        for mheader in &headers[1..] {
            total_minor_coinbase = total_minor_coinbase
                .checked_add(self.coinbase_quarkash(mheader)?)
                .ok_or_else(|| "minor coinbase sum overflow".to_string())?;

            if mheader.branch.shard_id == shard_id {
                if mheader.hash_prev_minor_block != prev_header.hash() {
                    return Err("minor block doesn't link to the previous minor block".to_string());
                }
                block_count_in_shard += 1;
            } else if mheader.branch.shard_id != shard_id + 1 {
                return Err("minor block shard ids must be ordered".to_string());
            } else {
                if block_count_in_shard < self.config.proof_of_progress_blocks {
                    return Err("shard failed to prove progress".to_string());
                }
                shard_id = mheader.branch.shard_id;
                if mheader.hash_prev_minor_block != last_block_hash_list[shard_id as usize] {
                    return Err("first minor block in shard doesn't link to the previous root block's header".to_string());
                }
                block_count_in_shard = 1;
            }
            prev_header = mheader;
        }

        if shard_id as usize != last_block_hash_list.len() - 1 {
            return Err("root block does not cover every shard".to_string());
        }
        if block_count_in_shard < self.config.proof_of_progress_blocks {
            return Err("shard failed to prove progress".to_string());
        }

        Ok(total_minor_coinbase)
    }

    fn coinbase_quarkash(&self, mheader: &MinorBlockHeader) -> Result<Quarkash, String> {
        let tx = self
            .store
            .get_minor_block_coinbase_tx(&mheader.hash())
            .map_err(|e| format!("persistence error: {e}"))?
            .ok_or_else(|| "missing coinbase tx for committed minor block".to_string())?;
        Ok(tx.out_list[0].quarkash)
    }

    /// Refuses to roll back the genesis block.
    pub fn roll_back(&mut self) -> Result<(), String> {
        if self.chain.len() == 1 {
            return Err("cannot roll back the genesis block".to_string());
        }
        let header = self.chain.pop().expect("checked length above");
        log::warn!("root chain: rolling back root block at height {}", header.height);
        self.by_hash.remove(&header.hash());
        Ok(())
    }
}

/// For each shard, the hash of its last header embedded in `prev_block`.
fn last_block_hash_per_shard(prev_block: &RootBlock) -> Result<Vec<Hash>, String> {
    if prev_block.minor_block_header_list.is_empty() {
        return Ok(vec![Hash::ZERO; prev_block.header.shard_info.shard_size as usize]);
    }
    let headers = &prev_block.minor_block_header_list;
    let mut out = Vec::with_capacity(prev_block.header.shard_info.shard_size as usize);
    let mut current_shard: ShardId = 0;
    let mut prev_header = &headers[0];
    for mheader in &headers[1..] {
        if mheader.branch.shard_id != current_shard {
            if mheader.branch.shard_id != current_shard + 1 {
                return Err("previous root block has non-ordered shard ids".to_string());
            }
            out.push(prev_header.hash());
            current_shard = mheader.branch.shard_id;
        }
        prev_header = mheader;
    }
    out.push(headers.last().expect("checked non-empty above").hash());
    if out.len() != prev_block.header.shard_info.shard_size as usize {
        return Err("previous root block does not cover every shard".to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::{create_genesis_blocks, ShardGenesis};
    use crate::storage::memory::MemoryStore;
    use crate::types::Recipient;

    fn genesis_chain() -> (RootChain, RootBlock) {
        let premine = vec![ShardGenesis { recipient: Recipient([1; 20]), quarkash: 10 }];
        let (root_genesis, _minors) = create_genesis_blocks(1, &premine);
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let chain = RootChain::new(root_genesis.clone(), store).unwrap();
        (chain, root_genesis)
    }

    #[test]
    fn rejects_appending_block_with_no_committed_minor_headers() {
        let (mut chain, genesis) = genesis_chain();
        let mut uncommitted = HashSet::new();
        let coinbase = crate::tx::Transaction::new_coinbase(
            Code::root_coinbase(1),
            crate::tx::TransactionOutput {
                address: crate::tx::Address { recipient: Recipient::ZERO, full_shard_id: 0 },
                quarkash: 0,
            },
        );
        let header = RootBlockHeader {
            height: 1,
            hash_prev_block: genesis.header.hash(),
            hash_merkle_root: calculate_merkle_root::<MinorBlockHeader>(&[]),
            hash_coinbase_tx: coinbase.hash(),
            shard_info: genesis.header.shard_info.clone(),
            create_time: 0,
            nonce: 0,
            difficulty: 0,
        };
        let block = RootBlock { header, coinbase_tx: coinbase, minor_block_header_list: vec![] };
        let err = chain.append_block(block, &mut uncommitted).unwrap_err();
        assert!(err.contains("at least one"));
    }

    #[test]
    fn roll_back_refuses_on_genesis() {
        let (mut chain, _genesis) = genesis_chain();
        assert!(chain.roll_back().is_err());
    }
}
