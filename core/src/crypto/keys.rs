//! Signature verification and recipient (account identifier) derivation.
//!
//! The ledger core does not manage keys itself (wallet/key-management is an
//! external collaborator); this module only implements the two primitives
//! `verifySignature` depends on: checking an ed25519 signature, and deriving
//! a `Recipient` from a public key the same way an address is derived.

use crate::types::Recipient;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::convert::TryInto;

pub fn verify(public_key_bytes: &[u8], msg: &[u8], signature_bytes: &[u8]) -> bool {
    let pk_array: [u8; 32] = match public_key_bytes.try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };

    let public_key = match VerifyingKey::from_bytes(&pk_array) {
        Ok(pk) => pk,
        Err(_) => return false,
    };

    let signature_array: [u8; 64] = match signature_bytes.try_into() {
        Ok(arr) => arr,
        Err(_) => return false,
    };

    let signature = Signature::from_bytes(&signature_array);
    public_key.verify(msg, &signature).is_ok()
}

/// `recipient = ripemd160(sha256(pubkey))`, 20 bytes.
pub fn recipient_from_public_key(public_key_bytes: &[u8]) -> Recipient {
    let sha = Sha256::digest(public_key_bytes);
    let digest = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    Recipient(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    #[test]
    fn verify_round_trip() {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let msg = b"hello ledger";
        let sig = signing_key.sign(msg);
        assert!(verify(
            signing_key.verifying_key().as_bytes(),
            msg,
            &sig.to_bytes()
        ));
    }

    #[test]
    fn verify_rejects_wrong_message() {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let sig = signing_key.sign(b"hello ledger");
        assert!(!verify(
            signing_key.verifying_key().as_bytes(),
            b"goodbye ledger",
            &sig.to_bytes()
        ));
    }

    #[test]
    fn recipient_is_deterministic() {
        let pk = [7u8; 32];
        assert_eq!(recipient_from_public_key(&pk), recipient_from_public_key(&pk));
    }
}
