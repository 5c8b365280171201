//! End-to-end scenarios: build a tree, hand out proofs, settle claims.

use std::thread;

use rand::{rngs::StdRng, Rng, SeedableRng};
use splitter_core::{
    payout_for, verify_allocation, Address, Allocation, AllocationTree, Amount, ClaimLedger,
    Hash, PERCENTAGE_SCALE,
};

const AUCTION_PERCENTS: [u64; 6] = [500, 10_000, 25_000, 127_500, 327_000, 510_000];

fn auction_allocations() -> Vec<Allocation> {
    AUCTION_PERCENTS
        .iter()
        .enumerate()
        .map(|(i, percent)| Allocation::new([i as u8 + 1; 20], *percent))
        .collect()
}

/// Random accounts with percents summing to `PERCENTAGE_SCALE`
fn random_allocations(count: usize, seed: u64) -> Vec<Allocation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut remaining = PERCENTAGE_SCALE;
    let mut allocations = Vec::with_capacity(count);

    for i in 0..count {
        let percent = if i + 1 == count {
            remaining
        } else {
            let max_share = remaining / (count - i) as u64;
            rng.gen_range(0..=max_share)
        };
        remaining -= percent;
        allocations.push(Allocation::new(rng.gen::<Address>(), percent));
    }

    allocations
}

#[test]
fn test_auction_root_vector() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    assert_eq!(
        hex::encode(tree.root()),
        "26e1f2a4c5327eb0721b3010e500c7373a48840dd0b62e94458961edc2025c2b"
    );
}

#[test]
fn test_auction_end_to_end() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    let proceeds: Amount = 1_000_000_000;

    // Only the root travels to the ledger
    let mut ledger = ClaimLedger::new(tree.root(), PERCENTAGE_SCALE).unwrap();
    ledger.deposit(proceeds).unwrap();

    let mut paid = 0;
    for allocation in tree.allocations() {
        let proof = tree.proof(&allocation.account, allocation.percent).unwrap();
        let payout = ledger
            .claim(&allocation.account, allocation.percent, &proof)
            .unwrap();
        assert_eq!(
            payout,
            payout_for(proceeds, allocation.percent, PERCENTAGE_SCALE).unwrap()
        );
        paid += payout;
    }

    assert!(paid <= proceeds);
    assert!(proceeds - paid < tree.len() as Amount);
    assert_eq!(ledger.balance(), proceeds - paid);
}

#[test]
fn test_dust_bounded_for_awkward_proceeds() {
    let allocations = random_allocations(25, 7);
    let tree = AllocationTree::new(allocations).unwrap();

    for proceeds in [1, 999_999, 1_000_001, 123_456_789_012_345_678] {
        let paid: Amount = tree
            .allocations()
            .iter()
            .map(|a| payout_for(proceeds, a.percent, tree.denominator()).unwrap())
            .sum();
        assert!(paid <= proceeds);
        assert!(proceeds - paid <= tree.len() as Amount - 1);
    }
}

#[test]
fn test_round_trip_large_set() {
    let tree = AllocationTree::new(random_allocations(257, 99)).unwrap();

    for allocation in tree.allocations() {
        let proof = tree.proof(&allocation.account, allocation.percent).unwrap();
        assert!(verify_allocation(
            &allocation.account,
            allocation.percent,
            &proof,
            &tree.root()
        ));
    }
}

#[test]
fn test_bit_flip_in_any_proof_entry_fails() {
    let tree = AllocationTree::new(random_allocations(13, 3)).unwrap();
    let root = tree.root();

    for allocation in tree.allocations() {
        let proof = tree.proof(&allocation.account, allocation.percent).unwrap();
        for entry in 0..proof.len() {
            for bit in [0usize, 7, 100, 255] {
                let mut tampered = proof.clone();
                tampered[entry][bit / 8] ^= 1 << (bit % 8);
                assert!(!verify_allocation(
                    &allocation.account,
                    allocation.percent,
                    &tampered,
                    &root
                ));
            }
        }
    }
}

#[test]
fn test_substituted_sibling_fails() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    let first = &tree.allocations()[0];
    let last = &tree.allocations()[5];

    let proof = tree.proof(&first.account, first.percent).unwrap();
    let other = tree.proof(&last.account, last.percent).unwrap();

    // Swap in a real node from elsewhere in the tree
    let mut tampered = proof.clone();
    tampered[0] = other[0];
    assert_ne!(tampered, proof);
    assert!(!verify_allocation(&first.account, first.percent, &tampered, &tree.root()));
}

#[test]
fn test_proof_of_other_account_fails() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    let a = &tree.allocations()[1];
    let b = &tree.allocations()[4];
    let proof_a = tree.proof(&a.account, a.percent).unwrap();

    assert!(!verify_allocation(&b.account, b.percent, &proof_a, &tree.root()));
    assert!(!verify_allocation(&a.account, b.percent, &proof_a, &tree.root()));
    assert!(!verify_allocation(&b.account, a.percent, &proof_a, &tree.root()));
}

#[test]
fn test_truncated_and_padded_proofs_fail() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    let a = &tree.allocations()[2];
    let proof = tree.proof(&a.account, a.percent).unwrap();

    let truncated = &proof[..proof.len() - 1];
    assert!(!verify_allocation(&a.account, a.percent, truncated, &tree.root()));

    let mut padded = proof.clone();
    padded.push([0u8; 32]);
    assert!(!verify_allocation(&a.account, a.percent, &padded, &tree.root()));
    assert!(!verify_allocation(&a.account, a.percent, &[], &tree.root()));
}

#[test]
fn test_root_from_other_set_fails() {
    let tree = AllocationTree::new(auction_allocations()).unwrap();
    let other = AllocationTree::new(random_allocations(6, 1)).unwrap();
    let a = &tree.allocations()[0];
    let proof = tree.proof(&a.account, a.percent).unwrap();

    assert!(!verify_allocation(&a.account, a.percent, &proof, &other.root()));
}

#[test]
fn test_concurrent_verification() {
    let tree = AllocationTree::new(random_allocations(64, 11)).unwrap();
    let root: Hash = tree.root();
    let tree = &tree;

    thread::scope(|scope| {
        for chunk in tree.allocations().chunks(16) {
            scope.spawn(move || {
                for allocation in chunk {
                    let proof = tree.proof(&allocation.account, allocation.percent).unwrap();
                    assert!(verify_allocation(
                        &allocation.account,
                        allocation.percent,
                        &proof,
                        &root
                    ));
                }
            });
        }
    });
}
