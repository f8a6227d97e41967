//! Sharded ledger core: per-shard UTXO chains (`ShardState`) committed by a
//! root chain (`RootChain`) that enforces cross-shard proof of progress,
//! orchestrated through a single entry point, `LedgerCoordinator`.

pub mod block;
pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod genesis;
pub mod minor_chain_manager;
pub mod root_chain;
pub mod shard;
pub mod storage;
pub mod test_support;
pub mod tx;
pub mod types;
pub mod utxo;

pub use block::{Block, MinorBlock, MinorBlockHeader, RootBlock, RootBlockHeader};
pub use config::LedgerConfig;
pub use coordinator::LedgerCoordinator;
pub use crypto::{Ed25519TxVerifier, TxVerifier};
pub use genesis::ShardGenesis;
pub use storage::{memory::MemoryStore, lmdb::LmdbStore, LedgerStore};
pub use tx::{Transaction, TransactionInput, TransactionOutput};
pub use types::{Branch, Code, FullShardId, Hash, Quarkash, Recipient, ShardId};
