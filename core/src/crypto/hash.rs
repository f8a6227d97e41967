//! Content hashing. blake3 everywhere a collision-resistant digest is needed,
//! matching the rest of the crate's dependency on `blake3` for block/tx ids.

use crate::types::Hash;

pub fn blake(data: &[u8]) -> [u8; 32] {
    blake3::hash(data).into()
}

pub fn blake_hash(data: &[u8]) -> Hash {
    Hash(blake(data))
}
