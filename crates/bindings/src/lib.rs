//! Wire bindings
//!
//! JSON shapes exchanged with tooling and with the contract side. Digests
//! and addresses travel as `0x`-prefixed hex strings; every length check
//! happens here, so the core only ever sees well-formed `[u8; N]` values.

use serde::{Deserialize, Serialize};
use splitter_core::{Address, Allocation, AllocationTree, Hash};
use thiserror::Error;

/// Boundary decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Not valid hexadecimal
    #[error("invalid hex {value:?}: {reason}")]
    InvalidHex {
        /// Offending input
        value: String,
        /// Decoder message
        reason: String,
    },

    /// Decoded to the wrong number of bytes
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length
        expected: usize,
        /// Decoded byte length
        actual: usize,
    },

    /// Malformed JSON document
    #[error("invalid json: {0}")]
    Json(String),
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

fn decode_fixed<const N: usize>(value: &str) -> Result<[u8; N], WireError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(digits).map_err(|e| WireError::InvalidHex {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| WireError::InvalidLength {
        expected: N,
        actual: bytes.len(),
    })
}

/// `0x` + 64 lowercase hex digits
pub fn encode_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a 32-byte digest; the `0x` prefix is optional
pub fn decode_hash(value: &str) -> Result<Hash, WireError> {
    decode_fixed(value)
}

/// `0x` + 40 lowercase hex digits
pub fn encode_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Parse a 20-byte address; the `0x` prefix is optional
pub fn decode_address(value: &str) -> Result<Address, WireError> {
    decode_fixed(value)
}

/// Encode a proof as a list of hex digests
pub fn encode_proof(proof: &[Hash]) -> Vec<String> {
    proof.iter().map(encode_hash).collect()
}

/// Decode a list of hex digests
pub fn decode_proof<S: AsRef<str>>(proof: &[S]) -> Result<Vec<Hash>, WireError> {
    proof.iter().map(|entry| decode_hash(entry.as_ref())).collect()
}

/// One row of an allocation input file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// Hex account address
    pub account: String,
    /// Parts of the denominator
    pub percent: u64,
}

impl AllocationRecord {
    /// Decode into a core allocation
    pub fn decode(&self) -> Result<Allocation, WireError> {
        Ok(Allocation::new(decode_address(&self.account)?, self.percent))
    }
}

impl From<&Allocation> for AllocationRecord {
    fn from(allocation: &Allocation) -> Self {
        Self {
            account: encode_address(&allocation.account),
            percent: allocation.percent,
        }
    }
}

/// Parse a JSON array of allocation records
pub fn parse_allocations(json: &str) -> Result<Vec<Allocation>, WireError> {
    let records: Vec<AllocationRecord> = serde_json::from_str(json)?;
    records.iter().map(AllocationRecord::decode).collect()
}

/// The published commitment for an allocation set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    /// Hex Merkle root
    pub root: String,
    /// Denominator percents are expressed over
    pub denominator: u64,
    /// Number of committed allocations
    pub allocation_count: usize,
}

impl From<&AllocationTree> for Commitment {
    fn from(tree: &AllocationTree) -> Self {
        Self {
            root: encode_hash(&tree.root()),
            denominator: tree.denominator(),
            allocation_count: tree.len(),
        }
    }
}

/// Everything a payee submits to claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProof {
    /// Hex account address
    pub account: String,
    /// Parts of the denominator
    pub percent: u64,
    /// Hex sibling digests, leaf to root
    pub proof: Vec<String>,
}

impl ClaimProof {
    /// Encode an allocation and its proof
    pub fn new(allocation: &Allocation, proof: &[Hash]) -> Self {
        Self {
            account: encode_address(&allocation.account),
            percent: allocation.percent,
            proof: encode_proof(proof),
        }
    }

    /// Look up and encode the proof for `allocation`
    pub fn from_tree(
        tree: &AllocationTree,
        allocation: &Allocation,
    ) -> Result<Self, splitter_core::ProofError> {
        let proof = tree.proof(&allocation.account, allocation.percent)?;
        Ok(Self::new(allocation, &proof))
    }

    /// Decode into an allocation and raw proof
    pub fn decode(&self) -> Result<(Allocation, Vec<Hash>), WireError> {
        let allocation = Allocation::new(decode_address(&self.account)?, self.percent);
        Ok((allocation, decode_proof(&self.proof)?))
    }
}

/// Arguments of the `verify(account, percent, proof[], root)` boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Hex account address
    pub account: String,
    /// Parts of the denominator
    pub percent: u64,
    /// Hex sibling digests, leaf to root
    pub proof: Vec<String>,
    /// Hex root to check against
    pub root: String,
}

impl VerifyRequest {
    /// Decode and run verification.
    ///
    /// Malformed hex is an error; a well-formed but wrong claim is `Ok(false)`.
    pub fn verify(&self) -> Result<bool, WireError> {
        let account = decode_address(&self.account)?;
        let proof = decode_proof(&self.proof)?;
        let root = decode_hash(&self.root)?;
        Ok(splitter_core::verify_allocation(&account, self.percent, &proof, &root))
    }
}
