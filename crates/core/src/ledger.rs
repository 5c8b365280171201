//! Claim accounting for proceeds held by a splitter
//!
//! The ledger only knows the committed root. Each claim brings its own
//! (account, percent, proof); a valid proof unlocks
//! `floor(total_deposited * percent / denominator)` minus whatever that
//! allocation already received. Proceeds may arrive in several deposits,
//! claims settle the difference each time.
//!
//! An (account, percent) pair listed more than once commits to the same
//! leaf, so the ledger pays that leaf `percent` times its multiplicity.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::allocation::{verify_allocation, AllocationTree};
use crate::types::{allocation_leaf, Address, Amount, Hash};

/// Claim and payout errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Proof does not fold to the committed root
    #[error("invalid proof for account 0x{} with percent {percent}", hex::encode(.account))]
    InvalidProof {
        /// Claiming account
        account: Address,
        /// Claimed percent
        percent: u64,
    },

    /// Allocation already received its full share of current proceeds
    #[error("nothing to claim for account 0x{}", hex::encode(.account))]
    NothingToClaim {
        /// Claiming account
        account: Address,
    },

    /// Payout exceeds the funds held
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Payout owed
        required: Amount,
        /// Funds held
        available: Amount,
    },

    /// Arithmetic overflow while computing an amount
    #[error("amount overflow: proceeds {proceeds}, percent {percent}")]
    Overflow {
        /// Proceeds involved
        proceeds: Amount,
        /// Percent involved
        percent: u64,
    },

    /// Denominator of zero cannot express any share
    #[error("denominator must be non-zero")]
    ZeroDenominator,
}

/// Share of `proceeds` owed to `percent / denominator`, rounded down.
///
/// Rounding down means the sum of all shares never exceeds `proceeds`;
/// at most `n - 1` units stay behind for `n` allocations.
pub fn payout_for(proceeds: Amount, percent: u64, denominator: u64) -> Result<Amount, LedgerError> {
    if denominator == 0 {
        return Err(LedgerError::ZeroDenominator);
    }

    proceeds
        .checked_mul(Amount::from(percent))
        .map(|scaled| scaled / Amount::from(denominator))
        .ok_or(LedgerError::Overflow { proceeds, percent })
}

/// Funds held for one allocation root, and what each allocation has drawn.
#[derive(Clone, Debug)]
pub struct ClaimLedger {
    root: Hash,
    denominator: u64,
    /// Sum of all deposits
    total_deposited: Amount,
    /// Funds currently held
    balance: Amount,
    /// Amount released per allocation leaf
    released: HashMap<Hash, Amount>,
    /// Leaves committed more than once, with their count
    multiplicity: HashMap<Hash, u64>,
}

impl ClaimLedger {
    /// Create an empty ledger for a published root.
    ///
    /// Every leaf is assumed to be committed once; use
    /// [`from_tree`](Self::from_tree) when the allocation set is at hand.
    pub fn new(root: Hash, denominator: u64) -> Result<Self, LedgerError> {
        if denominator == 0 {
            return Err(LedgerError::ZeroDenominator);
        }

        Ok(Self {
            root,
            denominator,
            total_deposited: 0,
            balance: 0,
            released: HashMap::new(),
            multiplicity: HashMap::new(),
        })
    }

    /// Create an empty ledger for a tree's root and denominator
    pub fn from_tree(tree: &AllocationTree) -> Self {
        let mut counts: HashMap<Hash, u64> = HashMap::new();
        for allocation in tree.allocations() {
            *counts.entry(allocation.leaf()).or_default() += 1;
        }
        counts.retain(|_, count| *count > 1);

        Self {
            root: tree.root(),
            denominator: tree.denominator(),
            total_deposited: 0,
            balance: 0,
            released: HashMap::new(),
            multiplicity: counts,
        }
    }

    /// Share of the denominator committed to `leaf`
    fn committed_percent(&self, leaf: &Hash, percent: u64) -> Result<u64, LedgerError> {
        let count = self.multiplicity.get(leaf).copied().unwrap_or(1);
        percent.checked_mul(count).ok_or(LedgerError::Overflow {
            proceeds: self.total_deposited,
            percent,
        })
    }

    /// Record proceeds arriving (e.g. an auction settling into the splitter)
    pub fn deposit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let (Some(total), Some(balance)) = (
            self.total_deposited.checked_add(amount),
            self.balance.checked_add(amount),
        ) else {
            return Err(LedgerError::Overflow {
                proceeds: amount,
                percent: 0,
            });
        };

        self.total_deposited = total;
        self.balance = balance;

        info!(amount, total, balance, "Proceeds deposited");
        Ok(())
    }

    /// Pay out what `(account, percent)` is owed, if the proof checks out.
    ///
    /// Returns the amount released by this call.
    pub fn claim(
        &mut self,
        account: &Address,
        percent: u64,
        proof: &[Hash],
    ) -> Result<Amount, LedgerError> {
        if !verify_allocation(account, percent, proof, &self.root) {
            debug!(account = %hex::encode(account), percent, "Claim proof rejected");
            return Err(LedgerError::InvalidProof {
                account: *account,
                percent,
            });
        }

        let leaf = allocation_leaf(account, percent);
        let committed = self.committed_percent(&leaf, percent)?;
        let entitlement = payout_for(self.total_deposited, committed, self.denominator)?;
        let already = self.released.get(&leaf).copied().unwrap_or_default();
        let payout = entitlement.saturating_sub(already);

        if payout == 0 {
            return Err(LedgerError::NothingToClaim { account: *account });
        }
        if payout > self.balance {
            return Err(LedgerError::InsufficientBalance {
                required: payout,
                available: self.balance,
            });
        }

        self.balance -= payout;
        *self.released.entry(leaf).or_default() += payout;

        info!(
            account = %hex::encode(account),
            percent,
            payout,
            balance = self.balance,
            "Claim paid"
        );
        Ok(payout)
    }

    /// Total released so far to `(account, percent)`
    pub fn released(&self, account: &Address, percent: u64) -> Amount {
        self.released
            .get(&allocation_leaf(account, percent))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `(account, percent)` has claimed at least once
    pub fn is_claimed(&self, account: &Address, percent: u64) -> bool {
        self.released(account, percent) > 0
    }

    /// Funds currently held
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Sum of all deposits
    pub const fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    /// Root claims are checked against
    pub const fn root(&self) -> Hash {
        self.root
    }

    /// Denominator percents are expressed over
    pub const fn denominator(&self) -> u64 {
        self.denominator
    }
}
