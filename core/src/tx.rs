//! Transactions: inputs, outputs, the opaque `code` tag, and the hash/
//! signature-verification surface `ShardState` validates against.

use crate::crypto;
use crate::types::{Code, FullShardId, Hash, Quarkash, Recipient};
use serde::{Deserialize, Serialize};

/// `(hash, index)` — identifies one output of a previous transaction.
/// This is also the key type of the UTXO pool.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionInput {
    pub hash: Hash,
    pub index: u32,
}

impl TransactionInput {
    pub fn new(hash: Hash, index: u32) -> Self {
        TransactionInput { hash, index }
    }
}

impl std::fmt::Debug for TransactionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TxInput({}:{})", self.hash, self.index)
    }
}

/// `(recipient, fullShardId)` — a cross-shard-aware destination address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: Recipient,
    pub full_shard_id: FullShardId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: Address,
    pub quarkash: Quarkash,
}

/// One input's signature material. The ledger core only checks that the
/// signing key's derived recipient matches the UTXO owner and that the
/// signature verifies; key custody itself is out of scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSignature {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub in_list: Vec<TransactionInput>,
    pub out_list: Vec<TransactionOutput>,
    pub code: Code,
    /// Signatures, one per entry of `in_list`, in the same order.
    pub signatures: Vec<InputSignature>,
}

impl Transaction {
    pub fn new_ordinary(in_list: Vec<TransactionInput>, out_list: Vec<TransactionOutput>) -> Self {
        Transaction {
            in_list,
            out_list,
            code: Code::Ordinary,
            signatures: Vec::new(),
        }
    }

    pub fn new_coinbase(code: Code, output: TransactionOutput) -> Self {
        Transaction {
            in_list: Vec::new(),
            out_list: vec![output],
            code,
            signatures: Vec::new(),
        }
    }

    /// Deterministic hash over the serialized fields that matter for
    /// identity: inputs, outputs and code. Signatures are excluded so the
    /// hash can be computed before or after signing (mirrors the teacher's
    /// "ID excludes signature" convention in `tx::Transaction::calculate_hash`).
    pub fn hash(&self) -> Hash {
        let bytes = bincode::serialize(&(&self.in_list, &self.out_list, &self.code))
            .expect("transaction fields are always serializable");
        crypto::hash::blake_hash(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8, shard: u32) -> Address {
        Address { recipient: Recipient([byte; 20]), full_shard_id: shard }
    }

    #[test]
    fn hash_is_deterministic_and_ignores_signatures() {
        let mut tx = Transaction::new_ordinary(
            vec![TransactionInput::new(Hash::ZERO, 0)],
            vec![TransactionOutput { address: addr(1, 0), quarkash: 10 }],
        );
        let h1 = tx.hash();
        tx.signatures.push(InputSignature { public_key: vec![1, 2, 3], signature: vec![4, 5, 6] });
        let h2 = tx.hash();
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_outputs_hash_differently() {
        let tx_a = Transaction::new_ordinary(
            vec![],
            vec![TransactionOutput { address: addr(1, 0), quarkash: 10 }],
        );
        let tx_b = Transaction::new_ordinary(
            vec![],
            vec![TransactionOutput { address: addr(1, 0), quarkash: 11 }],
        );
        assert_ne!(tx_a.hash(), tx_b.hash());
    }
}
