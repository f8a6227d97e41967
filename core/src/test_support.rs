//! Deterministic fixtures for tests and for embedders exercising the
//! ledger without a real wallet. Mirrors the teacher's convention of
//! gating unchecked/test-only constructors behind a `dev-tools` feature
//! rather than scattering `#[cfg(test)]` helpers across production modules.

#![cfg(any(test, feature = "dev-tools"))]

use crate::crypto::keys::recipient_from_public_key;
use crate::tx::{InputSignature, Transaction, TransactionInput, TransactionOutput};
use crate::types::Recipient;
use ed25519_dalek::{Signer, SigningKey};

/// A deterministic keypair derived from a seed byte, for tests that need a
/// stable recipient and the ability to sign spends from it.
pub struct TestKey {
    signing_key: SigningKey,
}

impl TestKey {
    pub fn from_seed(seed: u8) -> Self {
        TestKey { signing_key: SigningKey::from_bytes(&[seed; 32]) }
    }

    pub fn recipient(&self) -> Recipient {
        recipient_from_public_key(self.signing_key.verifying_key().as_bytes())
    }

    /// Builds an ordinary transaction spending `inputs` to `outputs` and
    /// signs it with this key for every input (single-signer convenience;
    /// multi-signer transactions are built by hand in the tests that need
    /// them).
    pub fn sign_ordinary(&self, inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Transaction {
        let mut tx = Transaction::new_ordinary(inputs, outputs);
        let msg = tx.hash().0;
        let signature = self.signing_key.sign(&msg);
        tx.signatures = (0..tx.in_list.len())
            .map(|_| InputSignature {
                public_key: self.signing_key.verifying_key().as_bytes().to_vec(),
                signature: signature.to_bytes().to_vec(),
            })
            .collect();
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_recipient() {
        assert_eq!(TestKey::from_seed(1).recipient(), TestKey::from_seed(1).recipient());
    }

    #[test]
    fn different_seeds_yield_different_recipients() {
        assert_ne!(TestKey::from_seed(1).recipient(), TestKey::from_seed(2).recipient());
    }
}
