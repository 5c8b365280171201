//! Merkle tree construction and proof lookup

use thiserror::Error;

use crate::{hasher::Keccak256Hasher, proof::MerkleProof, Hash};

/// Tree construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A tree needs at least one leaf
    #[error("cannot build a Merkle tree without leaves")]
    EmptyLeaves,
}

/// Immutable binary Merkle tree.
///
/// Built once from an ordered list of leaves. There are no insert or
/// delete operations; a different leaf set means a different tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    /// All nodes stored level by level, bottom-up. `layers[0]` = leaves.
    layers: Vec<Vec<Hash>>,
    /// Root hash
    root: Hash,
}

impl MerkleTree {
    /// Build a tree from pre-hashed leaves, keeping their order.
    pub fn from_leaves(leaves: Vec<Hash>) -> Result<Self, TreeError> {
        if leaves.is_empty() {
            return Err(TreeError::EmptyLeaves);
        }

        let mut layers = vec![leaves];
        while let Some(next) = layers.last().and_then(|prev| Self::parent_layer(prev)) {
            layers.push(next);
        }

        // Top layer holds exactly one node
        let root = layers[layers.len() - 1][0];

        Ok(Self { layers, root })
    }

    /// Pair adjacent nodes. Returns `None` once the layer is the root.
    fn parent_layer(layer: &[Hash]) -> Option<Vec<Hash>> {
        if layer.len() < 2 {
            return None;
        }

        let parents = layer
            .chunks(2)
            .map(|pair| match pair.get(1) {
                Some(right) => Keccak256Hasher::hash_sorted_pair(&pair[0], right),
                // Odd node is promoted as-is
                None => pair[0],
            })
            .collect();

        Some(parents)
    }

    /// Get the Merkle root
    pub const fn root(&self) -> Hash {
        self.root
    }

    /// Leaves in construction order
    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of levels above the leaves (0 for a single leaf)
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Index of the first leaf equal to `leaf`
    pub fn position(&self, leaf: &Hash) -> Option<usize> {
        self.layers[0].iter().position(|candidate| candidate == leaf)
    }

    /// Generate a proof for the leaf at the given index.
    ///
    /// Levels where the node was promoted contribute no sibling, so proof
    /// length can be shorter than [`depth`](Self::depth).
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut idx = leaf_index;

        for layer in &self.layers[..self.depth()] {
            if let Some(sibling) = layer.get(idx ^ 1) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }

        Some(MerkleProof::new(siblings))
    }

    /// Generate a proof for a leaf identified by its digest
    pub fn proof_for_leaf(&self, leaf: &Hash) -> Option<MerkleProof> {
        self.position(leaf).and_then(|index| self.proof(index))
    }
}
