//! Genesis construction. Out of scope per §1 ("genesis construction
//! details" is an external collaborator concern) beyond the minimal,
//! deterministic genesis needed to boot a `LedgerCoordinator` in tests and
//! in the reference in-memory node — premine amounts/addresses are the
//! caller's responsibility (§9 note 5).

use crate::block::{calculate_merkle_root, MinorBlock, MinorBlockHeader, RootBlock, RootBlockHeader, ShardInfo};
use crate::tx::{Address, Transaction, TransactionOutput};
use crate::types::{Branch, Code, Hash, Quarkash, Recipient};

/// One shard's genesis premine: who owns the coinbase output.
#[derive(Clone, Copy, Debug)]
pub struct ShardGenesis {
    pub recipient: Recipient,
    pub quarkash: Quarkash,
}

/// Builds one genesis minor block per shard and a root genesis block that
/// embeds all of their headers (height 0, in shard order). Embedding them
/// (rather than leaving the list empty) is what lets the first real root
/// block's shard-linkage walk (`RootChain::walk_shard_linkage`) find a
/// `lastBlockHashList` entry for every shard to link its own first minor
/// header against — see §9 open question 5.
///
/// Genesis minor headers carry `hash_prev_root_block = Hash::ZERO`: there
/// is no causally-prior root block to reference. The UTXOs they mint are
/// still spendable immediately — `ShardState::new` inserts them into the
/// pool confirmed by `rootChain.genesisHeader` directly, independent of
/// this field.
pub fn create_genesis_blocks(shard_size: u32, premine: &[ShardGenesis]) -> (RootBlock, Vec<MinorBlock>) {
    assert_eq!(premine.len() as u32, shard_size, "one genesis entry per shard required");

    let minor_blocks: Vec<MinorBlock> = premine
        .iter()
        .enumerate()
        .map(|(shard_id, g)| {
            let branch = Branch::new(shard_size, shard_id as u32);
            let coinbase = Transaction::new_coinbase(
                Code::minor_coinbase(0),
                TransactionOutput {
                    address: Address { recipient: g.recipient, full_shard_id: shard_id as u32 },
                    quarkash: g.quarkash,
                },
            );
            let header = MinorBlockHeader {
                height: 0,
                branch,
                hash_prev_minor_block: Hash::ZERO,
                hash_prev_root_block: Hash::ZERO,
                hash_merkle_root: calculate_merkle_root(&[coinbase.clone()]),
                create_time: 0,
                nonce: 0,
                difficulty: 0,
            };
            MinorBlock { header, tx_list: vec![coinbase] }
        })
        .collect();

    let minor_headers: Vec<MinorBlockHeader> = minor_blocks.iter().map(|b| b.header.clone()).collect();

    let root_coinbase = Transaction::new_coinbase(
        Code::root_coinbase(0),
        TransactionOutput {
            address: Address { recipient: Recipient::ZERO, full_shard_id: 0 },
            quarkash: 0,
        },
    );
    let root_header = RootBlockHeader {
        height: 0,
        hash_prev_block: Hash::ZERO,
        hash_merkle_root: calculate_merkle_root(&minor_headers),
        hash_coinbase_tx: root_coinbase.hash(),
        shard_info: ShardInfo { shard_size },
        create_time: 0,
        nonce: 0,
        difficulty: 0,
    };
    let root_block = RootBlock { header: root_header, coinbase_tx: root_coinbase, minor_block_header_list: minor_headers };

    (root_block, minor_blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_genesis_embeds_every_shard_genesis_header() {
        let premine = vec![
            ShardGenesis { recipient: Recipient([1; 20]), quarkash: 100 },
            ShardGenesis { recipient: Recipient([2; 20]), quarkash: 200 },
        ];
        let (root, minors) = create_genesis_blocks(2, &premine);
        assert_eq!(root.minor_block_header_list.len(), 2);
        for (m, embedded) in minors.iter().zip(root.minor_block_header_list.iter()) {
            assert_eq!(&m.header, embedded);
            assert_eq!(m.header.height, 0);
        }
        assert_eq!(minors[0].header.branch.shard_id, 0);
        assert_eq!(minors[1].header.branch.shard_id, 1);
    }
}
