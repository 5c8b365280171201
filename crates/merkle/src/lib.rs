//! Binary Merkle tree with sorted-pair Keccak-256 nodes.
//!
//! This crate commits to an ordered list of 32-byte leaves and answers
//! inclusion proofs for them. Layout:
//! - Internal node: `keccak256(min(a, b) || max(a, b))`
//! - Odd node at the end of a level: promoted unchanged to the next level
//! - Root of a single-leaf tree: the leaf itself
//!
//! The node rule matches OpenZeppelin's `MerkleProof.verify`, so roots and
//! proofs produced here can be checked by a Solidity contract unchanged.
//! Leaf encoding is left to callers.

mod hasher;
mod proof;
mod tree;

pub use hasher::Keccak256Hasher;
pub use proof::{verify_proof, MerkleProof};
pub use tree::{MerkleTree, TreeError};

/// 32-byte digest
pub type Hash = [u8; 32];
