//! `LedgerCoordinator`: the single entry point a block producer or sync
//! worker talks to. Owns the root chain, every shard, the uncommitted-minor-
//! header set, and the commitment lock that serializes mutation across all
//! of them — generalizing the teacher's coarse `block_processing_lock`
//! pattern to the sharded setting (§4.E).

use crate::block::{MinorBlock, RootBlock};
use crate::config::LedgerConfig;
use crate::crypto::TxVerifier;
use crate::genesis::{create_genesis_blocks, ShardGenesis};
use crate::minor_chain_manager::MinorChainManager;
use crate::root_chain::RootChain;
use crate::shard::ShardState;
use crate::storage::{LedgerStore, RootCommitRecord};
use crate::tx::TransactionInput;
use crate::types::{Branch, Quarkash, Recipient};
use crate::utxo::UtxoValue;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub struct LedgerCoordinator {
    root_chain: Mutex<RootChain>,
    shard_list: Vec<Mutex<ShardState>>,
    minor_chain_manager: Mutex<MinorChainManager>,
    uncommitted: Mutex<HashSet<crate::block::MinorBlockHeader>>,
    store: Arc<dyn LedgerStore>,
    /// Serializes the multi-step commit sequences below. Every individual
    /// field is already lock-guarded; this additionally prevents two
    /// concurrent root-block commits (which each touch several shards plus
    /// the uncommitted set) from interleaving.
    lock: Mutex<()>,
}

impl LedgerCoordinator {
    pub fn new(
        shard_size: u32,
        premine: &[ShardGenesis],
        store: Arc<dyn LedgerStore>,
        verifier: Arc<dyn TxVerifier>,
        config: Arc<LedgerConfig>,
    ) -> anyhow::Result<Self> {
        let (root_genesis, minor_genesis_blocks) = create_genesis_blocks(shard_size, premine);
        let root_chain = RootChain::with_config(root_genesis, store.clone(), config.clone())?;

        let mut shard_list = Vec::with_capacity(shard_size as usize);
        for genesis in &minor_genesis_blocks {
            let shard = ShardState::new(
                genesis.clone(),
                root_chain.genesis_header().clone(),
                store.clone(),
                verifier.clone(),
                config.clone(),
            )?;
            shard_list.push(Mutex::new(shard));
        }
        let minor_chain_manager = MinorChainManager::new(minor_genesis_blocks, store.clone());

        Ok(LedgerCoordinator {
            root_chain: Mutex::new(root_chain),
            shard_list,
            minor_chain_manager: Mutex::new(minor_chain_manager),
            uncommitted: Mutex::new(HashSet::new()),
            store,
            lock: Mutex::new(()),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shard_list.len()
    }

    pub fn balance_of(&self, shard_id: usize, recipient: Recipient) -> Quarkash {
        self.shard_list[shard_id].lock().unwrap().check_balance(recipient)
    }

    /// Current tip header of one shard, for a block producer to build the
    /// next candidate minor block against.
    pub fn minor_tip(&self, shard_id: usize) -> crate::block::MinorBlockHeader {
        self.shard_list[shard_id].lock().unwrap().tip().clone()
    }

    pub fn root_tip(&self) -> crate::block::RootBlockHeader {
        self.root_chain.lock().unwrap().tip().clone()
    }

    pub fn root_genesis_header(&self) -> crate::block::RootBlockHeader {
        self.root_chain.lock().unwrap().genesis_header().clone()
    }

    pub fn shard_genesis_block(&self, shard_id: usize) -> MinorBlock {
        self.minor_chain_manager.lock().unwrap().get_genesis_block(shard_id).expect("genesis block exists for every shard").clone()
    }

    pub fn append_minor_block(&self, shard_id: usize, block: MinorBlock) -> Result<(), String> {
        let _serialize = self.lock.lock().unwrap();
        log::debug!("coordinator: appending minor block to shard {shard_id}");
        if shard_id >= self.shard_list.len() {
            return Err("unknown shard id".to_string());
        }
        if block.header.branch.shard_size as usize != self.shard_list.len() {
            return Err("minor block shard size does not match the current shard count".to_string());
        }
        if block.header.branch.shard_id as usize != shard_id {
            return Err("minor block shard id does not match the target shard".to_string());
        }

        let header = block.header.clone();
        let block_for_index = block.clone();
        {
            let root_chain = self.root_chain.lock().unwrap();
            let mut shard = self.shard_list[shard_id].lock().unwrap();
            shard.append_block(block, &root_chain)?;
        }
        self.minor_chain_manager.lock().unwrap().add_new_block(&block_for_index);
        self.uncommitted.lock().unwrap().insert(header);
        log::info!("coordinator: committed minor block to shard {shard_id}");
        Ok(())
    }

    /// Refuses when the shard's current tip has already been committed by
    /// a root block (it is no longer in the uncommitted set).
    pub fn roll_back_minor_block(&self, shard_id: usize) -> Result<(), String> {
        let _serialize = self.lock.lock().unwrap();
        if shard_id >= self.shard_list.len() {
            return Err("unknown shard id".to_string());
        }
        let mut shard = self.shard_list[shard_id].lock().unwrap();
        let tip = shard.tip().clone();
        let mut uncommitted = self.uncommitted.lock().unwrap();
        if !uncommitted.contains(&tip) {
            return Err("the minor block is commited by root block".to_string());
        }
        log::warn!("coordinator: rolling back minor block on shard {shard_id}");
        shard.roll_back_tip()?;
        uncommitted.remove(&tip);
        Ok(())
    }

    /// Validates and commits `block`, then delivers every cross-shard
    /// output of the minor blocks it just confirmed to its destination
    /// shard's pool, recording what was delivered so the delivery can be
    /// undone by `roll_back_root_block` (§4.D / §9 "Cross-shard delivery
    /// recovery").
    pub fn append_root_block(&self, block: RootBlock) -> Result<(), String> {
        let _serialize = self.lock.lock().unwrap();
        log::debug!("coordinator: appending root block");
        let mut root_chain = self.root_chain.lock().unwrap();
        let mut uncommitted = self.uncommitted.lock().unwrap();

        let minor_headers = block.minor_block_header_list.clone();
        root_chain.append_block(block, &mut uncommitted)?;
        let confirming_header = root_chain.tip().clone();

        let mut delivered = Vec::new();
        for mheader in &minor_headers {
            let mblock = self
                .store
                .get_minor_block(&mheader.hash())
                .map_err(|e| format!("persistence error: {e}"))?
                .ok_or_else(|| "missing minor block for committed header".to_string())?;

            for tx in &mblock.tx_list[1..] {
                for (idx, out) in tx.out_list.iter().enumerate() {
                    let dest_shard = Branch::shard_id_of(mheader.branch.shard_size, out.address.full_shard_id);
                    if dest_shard != mheader.branch.shard_id {
                        let input = TransactionInput::new(tx.hash(), idx as u32);
                        let value = UtxoValue {
                            recipient: out.address.recipient,
                            quarkash: out.quarkash,
                            root_block_header: confirming_header.clone(),
                        };
                        self.shard_list[dest_shard as usize].lock().unwrap().add_cross_shard_utxo(input, value);
                        delivered.push((dest_shard, input));
                    }
                }
            }
        }

        let record = RootCommitRecord { delivered };
        self.store
            .put_root_commit_record(&confirming_header.hash(), &record)
            .map_err(|e| format!("persistence error: {e}"))?;
        log::info!("coordinator: committed root block at height {}", confirming_header.height);
        Ok(())
    }

    /// Refuses when an uncommitted minor block still references the
    /// current root tip as its `hashPrevRootBlock` — rolling back would
    /// orphan it.
    pub fn roll_back_root_block(&self) -> Result<(), String> {
        let _serialize = self.lock.lock().unwrap();
        let mut root_chain = self.root_chain.lock().unwrap();
        let mut uncommitted = self.uncommitted.lock().unwrap();

        let tip_hash = root_chain.tip().hash();
        if uncommitted.iter().any(|h| h.hash_prev_root_block == tip_hash) {
            return Err("the root block is used by uncommitted minor blocks".to_string());
        }
        log::warn!("coordinator: rolling back root block");

        let tip_block = self
            .store
            .get_root_block(&tip_hash)
            .map_err(|e| format!("persistence error: {e}"))?
            .ok_or_else(|| "missing root block in store".to_string())?;
        let record = self
            .store
            .get_root_commit_record(&tip_hash)
            .map_err(|e| format!("persistence error: {e}"))?
            .unwrap_or_default();

        root_chain.roll_back()?;

        for (shard_id, input) in &record.delivered {
            self.shard_list[*shard_id as usize].lock().unwrap().remove_cross_shard_utxo(input);
        }
        self.store.remove_root_commit_record(&tip_hash).map_err(|e| format!("persistence error: {e}"))?;
        for mheader in tip_block.minor_block_header_list {
            uncommitted.insert(mheader);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{calculate_merkle_root, MinorBlockHeader, RootBlockHeader, ShardInfo};
    use crate::crypto::Ed25519TxVerifier;
    use crate::storage::memory::MemoryStore;
    use crate::tx::{Address, Transaction, TransactionOutput};
    use crate::types::Code;

    fn coordinator(shard_size: u32) -> LedgerCoordinator {
        let premine: Vec<ShardGenesis> = (0..shard_size)
            .map(|i| ShardGenesis { recipient: Recipient([i as u8 + 1; 20]), quarkash: 1_000 })
            .collect();
        LedgerCoordinator::new(
            shard_size,
            &premine,
            Arc::new(MemoryStore::new()),
            Arc::new(Ed25519TxVerifier),
            Arc::new(LedgerConfig::default()),
        )
        .unwrap()
    }

    fn minor_block(coord: &LedgerCoordinator, shard_id: usize, root_hash: crate::types::Hash) -> MinorBlock {
        let shard = coord.shard_list[shard_id].lock().unwrap();
        let tip = shard.tip().clone();
        let coinbase = Transaction::new_coinbase(
            Code::minor_coinbase(tip.height + 1),
            TransactionOutput {
                address: Address { recipient: Recipient([9; 20]), full_shard_id: shard_id as u32 },
                quarkash: 1,
            },
        );
        MinorBlock {
            header: MinorBlockHeader {
                height: tip.height + 1,
                branch: Branch::new(coord.shard_count() as u32, shard_id as u32),
                hash_prev_minor_block: tip.hash(),
                hash_prev_root_block: root_hash,
                hash_merkle_root: calculate_merkle_root(&[coinbase.clone()]),
                create_time: 0,
                nonce: 0,
                difficulty: 0,
            },
            tx_list: vec![coinbase],
        }
    }

    #[test]
    fn append_minor_then_commit_with_root_block() {
        let coord = coordinator(1);
        let root_genesis_hash = coord.root_chain.lock().unwrap().genesis_header().hash();
        let block = minor_block(&coord, 0, root_genesis_hash);
        let mheader = block.header.clone();
        coord.append_minor_block(0, block).unwrap();

        let root_tip = coord.root_chain.lock().unwrap().tip().clone();
        let root_coinbase = Transaction::new_coinbase(
            Code::root_coinbase(1),
            TransactionOutput { address: Address { recipient: Recipient::ZERO, full_shard_id: 0 }, quarkash: 0 },
        );
        let root_block = RootBlock {
            header: RootBlockHeader {
                height: 1,
                hash_prev_block: root_tip.hash(),
                hash_merkle_root: calculate_merkle_root(&[mheader.clone()]),
                hash_coinbase_tx: root_coinbase.hash(),
                shard_info: ShardInfo { shard_size: 1 },
                create_time: 0,
                nonce: 0,
                difficulty: 0,
            },
            coinbase_tx: root_coinbase,
            minor_block_header_list: vec![mheader],
        };
        coord.append_root_block(root_block).unwrap();

        assert!(coord.roll_back_minor_block(0).is_err());
    }

    #[test]
    fn roll_back_minor_block_before_commitment_succeeds() {
        let coord = coordinator(1);
        let root_genesis_hash = coord.root_chain.lock().unwrap().genesis_header().hash();
        let block = minor_block(&coord, 0, root_genesis_hash);
        coord.append_minor_block(0, block).unwrap();
        coord.roll_back_minor_block(0).unwrap();
    }

    #[test]
    fn append_minor_block_rejects_mismatched_shard_size() {
        let coord = coordinator(1);
        let root_genesis_hash = coord.root_chain.lock().unwrap().genesis_header().hash();
        let mut block = minor_block(&coord, 0, root_genesis_hash);
        block.header.branch = Branch::new(2, 0);
        let err = coord.append_minor_block(0, block).unwrap_err();
        assert!(err.contains("shard size"));
    }

    #[test]
    fn append_minor_block_rejects_mismatched_shard_id() {
        let coord = coordinator(2);
        let root_genesis_hash = coord.root_chain.lock().unwrap().genesis_header().hash();
        let mut block = minor_block(&coord, 0, root_genesis_hash);
        block.header.branch = Branch::new(2, 1);
        let err = coord.append_minor_block(0, block).unwrap_err();
        assert!(err.contains("shard id"));
    }
}
