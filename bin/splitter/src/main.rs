//! Splitter operator CLI
//!
//! Builds the allocation commitment from a JSON file and hands out the
//! per-payee proofs that go on-chain with each claim.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use splitter_bindings::{decode_address, ClaimProof, Commitment, VerifyRequest};
use splitter_core::{AllocationTree, Amount, ClaimLedger, PERCENTAGE_SCALE};

#[derive(Debug, Parser)]
#[command(
    name = "splitter",
    about = "Merkle-committed auction proceeds splitter",
    version,
    propagate_version = true
)]
struct Cli {
    /// Denominator percents are expressed over [env: PERCENTAGE_SCALE]
    #[arg(long, global = true)]
    denominator: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the commitment (root) for an allocation file
    Root {
        /// JSON array of {"account", "percent"} records
        #[arg(long, value_name = "FILE")]
        allocations: PathBuf,
    },
    /// Print the claim proof for one allocation
    Proof {
        #[arg(long, value_name = "FILE")]
        allocations: PathBuf,
        /// Hex account address
        #[arg(long)]
        account: String,
        #[arg(long)]
        percent: u64,
    },
    /// Print claim proofs for every allocation
    Proofs {
        #[arg(long, value_name = "FILE")]
        allocations: PathBuf,
    },
    /// Check a claim against a root; exits 1 when it does not verify
    Verify {
        #[arg(long)]
        account: String,
        #[arg(long)]
        percent: u64,
        /// Hex root
        #[arg(long)]
        root: String,
        /// Comma-separated hex sibling digests, leaf to root
        #[arg(long, value_delimiter = ',')]
        proof: Vec<String>,
    },
    /// Simulate depositing proceeds and every payee claiming
    Distribute {
        #[arg(long, value_name = "FILE")]
        allocations: PathBuf,
        /// Proceeds in the smallest currency unit
        #[arg(long)]
        proceeds: Amount,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payout {
    account: String,
    percent: u64,
    amount: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Distribution {
    root: String,
    proceeds: String,
    payouts: Vec<Payout>,
    remaining: String,
}

fn denominator(cli: &Cli) -> Result<u64> {
    if let Some(denominator) = cli.denominator {
        return Ok(denominator);
    }
    match std::env::var("PERCENTAGE_SCALE") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("PERCENTAGE_SCALE is not an integer: {value}")),
        Err(_) => Ok(PERCENTAGE_SCALE),
    }
}

fn load_tree(path: &Path, denominator: u64) -> Result<AllocationTree> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read allocations from {}", path.display()))?;
    let allocations = splitter_bindings::parse_allocations(&json)
        .with_context(|| format!("failed to parse allocations in {}", path.display()))?;

    info!("Loaded {} allocations from {}", allocations.len(), path.display());
    AllocationTree::with_denominator(allocations, denominator)
        .with_context(|| format!("invalid allocation set in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn distribute(tree: &AllocationTree, proceeds: Amount) -> Result<Distribution> {
    let mut ledger = ClaimLedger::from_tree(tree);
    ledger.deposit(proceeds)?;

    let mut payouts = Vec::with_capacity(tree.len());
    for allocation in tree.allocations() {
        let proof = tree.proof(&allocation.account, allocation.percent)?;
        let amount = match ledger.claim(&allocation.account, allocation.percent, &proof) {
            Ok(amount) => amount,
            // Zero-percent payees owe nothing; a repeated pair was paid in full
            // by its first claim
            Err(splitter_core::LedgerError::NothingToClaim { .. }) => 0,
            Err(err) => return Err(err.into()),
        };
        payouts.push(Payout {
            account: splitter_bindings::encode_address(&allocation.account),
            percent: allocation.percent,
            amount: amount.to_string(),
        });
    }

    Ok(Distribution {
        root: splitter_bindings::encode_hash(&ledger.root()),
        proceeds: proceeds.to_string(),
        payouts,
        remaining: ledger.balance().to_string(),
    })
}

fn run(cli: Cli) -> Result<ExitCode> {
    let denominator = denominator(&cli)?;

    match cli.command {
        Command::Root { allocations } => {
            let tree = load_tree(&allocations, denominator)?;
            print_json(&Commitment::from(&tree))?;
        }
        Command::Proof {
            allocations,
            account,
            percent,
        } => {
            let tree = load_tree(&allocations, denominator)?;
            let account = decode_address(&account)?;
            let proof = tree.proof(&account, percent)?;
            let allocation = splitter_core::Allocation::new(account, percent);
            print_json(&ClaimProof::new(&allocation, &proof))?;
        }
        Command::Proofs { allocations } => {
            let tree = load_tree(&allocations, denominator)?;
            let claims = tree
                .allocations()
                .iter()
                .map(|allocation| ClaimProof::from_tree(&tree, allocation))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&claims)?;
        }
        Command::Verify {
            account,
            percent,
            root,
            proof,
        } => {
            let request = VerifyRequest {
                account,
                percent,
                proof,
                root,
            };
            let valid = request.verify()?;
            println!("{valid}");
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Distribute {
            allocations,
            proceeds,
        } => {
            let tree = load_tree(&allocations, denominator)?;
            let distribution = distribute(&tree, proceeds)?;
            if distribution.remaining != "0" {
                warn!("{} units left undistributed after rounding", distribution.remaining);
            }
            print_json(&distribution)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitter_core::Allocation;
    use std::io::Write;

    fn auction_tree() -> AllocationTree {
        let percents = [500, 10_000, 25_000, 127_500, 327_000, 510_000];
        let allocations = percents
            .iter()
            .enumerate()
            .map(|(i, percent)| Allocation::new([i as u8 + 1; 20], *percent))
            .collect();
        AllocationTree::new(allocations).unwrap()
    }

    #[test]
    fn test_cli_parses_proof_list() {
        let cli = Cli::try_parse_from([
            "splitter",
            "verify",
            "--account",
            "0x01",
            "--percent",
            "5",
            "--root",
            "0x02",
            "--proof",
            "0xaa,0xbb",
        ])
        .unwrap();

        match cli.command {
            Command::Verify { proof, .. } => assert_eq!(proof, vec!["0xaa", "0xbb"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_distribute_never_overdraws() {
        let tree = auction_tree();
        let distribution = distribute(&tree, 1_000_000_000).unwrap();

        let paid: Amount = distribution
            .payouts
            .iter()
            .map(|p| p.amount.parse::<Amount>().unwrap())
            .sum();
        let remaining: Amount = distribution.remaining.parse().unwrap();
        assert_eq!(paid + remaining, 1_000_000_000);
        assert_eq!(distribution.payouts[0].amount, "500000");
    }

    fn write_allocations(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_tree_from_file() {
        let file = write_allocations(
            r#"[
                {"account": "0x0101010101010101010101010101010101010101", "percent": 400000},
                {"account": "0x0202020202020202020202020202020202020202", "percent": 600000}
            ]"#,
        );

        let tree = load_tree(file.path(), PERCENTAGE_SCALE).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.contains(&[2u8; 20], 600_000));
    }

    #[test]
    fn test_load_tree_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tree(&dir.path().join("absent.json"), PERCENTAGE_SCALE).unwrap_err();
        assert!(err.to_string().starts_with("failed to read allocations"));
    }

    #[test]
    fn test_load_tree_bad_json() {
        let file = write_allocations(r#"[{"account": "0x01", "percent": 1000000}]"#);
        let err = load_tree(file.path(), PERCENTAGE_SCALE).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse allocations"));
    }

    #[test]
    fn test_load_tree_bad_sum() {
        let file = write_allocations(
            r#"[{"account": "0x0101010101010101010101010101010101010101", "percent": 999999}]"#,
        );
        let err = load_tree(file.path(), PERCENTAGE_SCALE).unwrap_err();
        assert!(err.to_string().starts_with("invalid allocation set"));
        assert!(matches!(
            err.downcast_ref::<splitter_core::AllocationError>(),
            Some(splitter_core::AllocationError::SumMismatch { actual: 999_999, .. })
        ));
    }

    #[test]
    fn test_distribute_repeated_pair_leaves_nothing_behind() {
        let allocations = vec![
            Allocation::new([8u8; 20], 500_000),
            Allocation::new([8u8; 20], 500_000),
        ];
        let tree = AllocationTree::new(allocations).unwrap();
        let distribution = distribute(&tree, 1_000).unwrap();

        assert_eq!(distribution.payouts[0].amount, "1000");
        assert_eq!(distribution.payouts[1].amount, "0");
        assert_eq!(distribution.remaining, "0");
    }

    #[test]
    fn test_distribute_reports_dust() {
        let tree = auction_tree();
        let distribution = distribute(&tree, 7).unwrap();
        let remaining: Amount = distribution.remaining.parse().unwrap();
        assert!(remaining < tree.len() as Amount);
    }
}
