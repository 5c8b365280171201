//! Allocation tree: validated allocation set committed to a Merkle root

use splitter_merkle::{verify_proof, MerkleTree};
use thiserror::Error;
use tracing::info;

use crate::types::{allocation_leaf, Address, Allocation, Hash, PERCENTAGE_SCALE};

/// Allocation set validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No allocations supplied
    #[error("allocation set is empty")]
    EmptySet,

    /// Percentages do not add up to the denominator
    #[error("allocation percentages sum to {actual}, expected exactly {expected}")]
    SumMismatch {
        /// Denominator the set must sum to
        expected: u64,
        /// Actual sum of all percents
        actual: u128,
    },

    /// Denominator of zero cannot express any share
    #[error("denominator must be non-zero")]
    ZeroDenominator,
}

/// Proof lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// The (account, percent) pair is not a leaf of this tree
    #[error("no allocation for account 0x{} with percent {percent}", hex::encode(.account))]
    NotFound {
        /// Requested account
        account: Address,
        /// Requested percent
        percent: u64,
    },
}

/// Merkle commitment over a full allocation set.
///
/// Built once; the root is the only value that needs publishing. Proofs are
/// looked up by allocation content, never by position.
#[derive(Clone, Debug)]
pub struct AllocationTree {
    allocations: Vec<Allocation>,
    denominator: u64,
    tree: MerkleTree,
}

impl AllocationTree {
    /// Build a tree over parts-per-million allocations
    pub fn new(allocations: Vec<Allocation>) -> Result<Self, AllocationError> {
        Self::with_denominator(allocations, PERCENTAGE_SCALE)
    }

    /// Build a tree whose percents must sum to `denominator`
    pub fn with_denominator(
        allocations: Vec<Allocation>,
        denominator: u64,
    ) -> Result<Self, AllocationError> {
        if denominator == 0 {
            return Err(AllocationError::ZeroDenominator);
        }
        if allocations.is_empty() {
            return Err(AllocationError::EmptySet);
        }

        let total: u128 = allocations.iter().map(|a| u128::from(a.percent)).sum();
        if total != u128::from(denominator) {
            return Err(AllocationError::SumMismatch {
                expected: denominator,
                actual: total,
            });
        }

        let leaves = allocations.iter().map(Allocation::leaf).collect();
        let tree = MerkleTree::from_leaves(leaves).map_err(|_| AllocationError::EmptySet)?;

        info!(
            allocations = allocations.len(),
            depth = tree.depth(),
            root = %hex::encode(tree.root()),
            "Allocation tree built"
        );

        Ok(Self {
            allocations,
            denominator,
            tree,
        })
    }

    /// Root committing to every allocation
    pub const fn root(&self) -> Hash {
        self.tree.root()
    }

    /// Denominator the percents are expressed over
    pub const fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Allocations in construction order
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Number of allocations (never zero)
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    /// Always false: construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Whether the pair is committed by this tree
    pub fn contains(&self, account: &Address, percent: u64) -> bool {
        self.tree.position(&allocation_leaf(account, percent)).is_some()
    }

    /// Sibling digests proving `(account, percent)`, leaf to root.
    ///
    /// A wrong percent for a known account is reported the same way as an
    /// unknown account, since both fields are bound into the leaf.
    pub fn proof(&self, account: &Address, percent: u64) -> Result<Vec<Hash>, ProofError> {
        self.tree
            .proof_for_leaf(&allocation_leaf(account, percent))
            .map(|proof| proof.siblings)
            .ok_or(ProofError::NotFound {
                account: *account,
                percent,
            })
    }
}

/// Check an allocation claim against a published root.
///
/// Needs nothing but the claim itself: recompute the leaf, fold the proof
/// with the sorted-pair rule and compare. Pure, so it is safe to call from
/// any number of threads or any number of times before settling a claim.
pub fn verify_allocation(account: &Address, percent: u64, proof: &[Hash], root: &Hash) -> bool {
    verify_proof(root, &allocation_leaf(account, percent), proof)
}
