//! Common types

use serde::{Deserialize, Serialize};
use splitter_merkle::Keccak256Hasher;

pub use splitter_merkle::Hash;

/// Account identifier (20-byte Ethereum address)
pub type Address = [u8; 20];

/// Currency amount in the smallest unit (wei or token base units)
pub type Amount = u128;

/// Percentages are parts-per-million: numerators over this denominator.
pub const PERCENTAGE_SCALE: u64 = 1_000_000;

/// One payee's share of the proceeds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Payee
    pub account: Address,
    /// Numerator over the tree's denominator
    pub percent: u64,
}

impl Allocation {
    /// Create an allocation
    pub const fn new(account: Address, percent: u64) -> Self {
        Self { account, percent }
    }

    /// Leaf digest committing to this allocation
    pub fn leaf(&self) -> Hash {
        allocation_leaf(&self.account, self.percent)
    }
}

/// Leaf digest for an (account, percent) pair.
///
/// `keccak256(account || uint256(percent))`, the same bytes Solidity's
/// `abi.encodePacked(address, uint256)` produces: 20 address bytes followed
/// by the percent as a 32-byte big-endian word.
pub fn allocation_leaf(account: &Address, percent: u64) -> Hash {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&percent.to_be_bytes());
    Keccak256Hasher::hash_parts(&[account.as_slice(), word.as_slice()])
}
