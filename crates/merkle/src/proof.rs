//! Inclusion proof folding and verification

use serde::{Deserialize, Serialize};

use crate::{hasher::Keccak256Hasher, Hash};

/// Inclusion proof for one leaf.
///
/// Only sibling digests are carried. The sorted-pair node rule makes the
/// left/right position of each sibling irrelevant, so no path bits or leaf
/// index are needed to fold it back to the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling hashes from leaf level to root (bottom-up)
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    /// Wrap a list of sibling hashes
    pub const fn new(siblings: Vec<Hash>) -> Self {
        Self { siblings }
    }

    /// Number of siblings
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    /// True for the proof of a single-leaf tree
    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    /// Compute root from proof
    pub fn compute_root(&self, leaf: &Hash) -> Hash {
        fold_siblings(leaf, &self.siblings)
    }

    /// Verify this proof against a root hash
    pub fn verify(&self, root: &Hash, leaf: &Hash) -> bool {
        verify_proof(root, leaf, &self.siblings)
    }
}

impl From<Vec<Hash>> for MerkleProof {
    fn from(siblings: Vec<Hash>) -> Self {
        Self::new(siblings)
    }
}

/// Check that `leaf` folds up to `root` through `siblings`.
///
/// Stateless and free of side effects; needs nothing from the tree that
/// produced the proof. A proof of the wrong length or with a wrong sibling
/// simply folds to a different digest and yields `false`.
pub fn verify_proof(root: &Hash, leaf: &Hash, siblings: &[Hash]) -> bool {
    fold_siblings(leaf, siblings) == *root
}

fn fold_siblings(leaf: &Hash, siblings: &[Hash]) -> Hash {
    siblings
        .iter()
        .fold(*leaf, |current, sibling| Keccak256Hasher::hash_sorted_pair(&current, sibling))
}
