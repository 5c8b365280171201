//! Auction proceeds splitter core
//!
//! Commits a set of (account, percent) allocations to a single Merkle root
//! and settles claims against that root:
//! - [`AllocationTree`] validates the set and answers proofs
//! - [`verify_allocation`] checks a claim with nothing but the root
//! - [`ClaimLedger`] holds deposited proceeds and pays verified claims

pub mod allocation;
pub mod ledger;
pub mod types;

pub use allocation::{verify_allocation, AllocationError, AllocationTree, ProofError};
pub use ledger::{payout_for, ClaimLedger, LedgerError};
pub use types::*;
