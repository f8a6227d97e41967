pub mod hash;
pub mod keys;

use crate::tx::Transaction;
use crate::types::Recipient;

/// Stands in for the crypto contract of §6: "`verifySignature(senderList)`
/// returns true iff the tx carries valid signatures matching the given
/// recipients in input order." Kept as a trait so the ledger core can be
/// exercised without depending on a concrete wallet/key-management layer.
pub trait TxVerifier: Send + Sync {
    fn verify_signature(&self, tx: &Transaction, sender_list: &[Recipient]) -> bool;
}

/// Default implementation: each input must carry an ed25519 signature over
/// the transaction hash, signed by a key whose derived recipient matches
/// the corresponding entry in `sender_list` (input order).
#[derive(Default)]
pub struct Ed25519TxVerifier;

impl TxVerifier for Ed25519TxVerifier {
    fn verify_signature(&self, tx: &Transaction, sender_list: &[Recipient]) -> bool {
        if tx.signatures.len() != sender_list.len() {
            return false;
        }
        let msg = tx.hash().0;
        for (sig, expected_sender) in tx.signatures.iter().zip(sender_list.iter()) {
            if keys::recipient_from_public_key(&sig.public_key) != *expected_sender {
                return false;
            }
            if !keys::verify(&sig.public_key, &msg, &sig.signature) {
                return false;
            }
        }
        true
    }
}

