//! Keccak256 hasher for the allocation tree

use tiny_keccak::{Hasher, Keccak};

use crate::Hash;

/// Keccak256 hasher
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256Hasher;

impl Keccak256Hasher {
    /// Hash arbitrary bytes
    pub fn hash(data: &[u8]) -> Hash {
        Self::hash_parts(&[data])
    }

    /// Hash the concatenation of several byte slices without allocating
    pub fn hash_parts(parts: &[&[u8]]) -> Hash {
        let mut hasher = Keccak::v256();
        for part in parts {
            hasher.update(part);
        }
        let mut output = [0u8; 32];
        hasher.finalize(&mut output);
        output
    }

    /// Hash two 32-byte values together, in the given order
    pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
        Self::hash_parts(&[left.as_slice(), right.as_slice()])
    }

    /// Combine two sibling nodes into their parent.
    ///
    /// The children are ordered as raw bytes before hashing, so
    /// `hash_sorted_pair(a, b) == hash_sorted_pair(b, a)`. A verifier can
    /// therefore fold a proof without knowing which side each sibling was on.
    pub fn hash_sorted_pair(a: &Hash, b: &Hash) -> Hash {
        if a <= b {
            Self::hash_pair(a, b)
        } else {
            Self::hash_pair(b, a)
        }
    }
}
