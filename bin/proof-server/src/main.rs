//! Splitter proof server
//!
//! Serves the published root and per-payee claim proofs over JSON-RPC so
//! claim front-ends never need the full allocation file:
//! - `splitter_getRoot` / `splitter_getCommitment`
//! - `splitter_getProof [account, percent]`
//! - `splitter_verify {account, percent, proof, root}`
//!
//! The tree is built once at startup and shared read-only.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use splitter_bindings::{decode_address, ClaimProof, Commitment, VerifyRequest};
use splitter_core::{Allocation, AllocationTree, PERCENTAGE_SCALE};

const INVALID_PARAMS: i64 = -32602;
const METHOD_NOT_FOUND: i64 = -32601;
const NOT_FOUND: i64 = -32000;

/// Server configuration
#[derive(Clone, Debug)]
struct Config {
    rpc_addr: String,
    allocations_path: String,
    denominator: u64,
}

impl Config {
    /// Load from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            rpc_addr: env::var("RPC_ADDR").unwrap_or_else(|_| "0.0.0.0:8547".to_string()),
            allocations_path: env::var("ALLOCATIONS_PATH")
                .unwrap_or_else(|_| "allocations.json".to_string()),
            denominator: parse_denominator(env::var("PERCENTAGE_SCALE").ok())?,
        })
    }
}

/// Unset means parts per million; anything else must be a positive integer
fn parse_denominator(value: Option<String>) -> Result<u64> {
    let Some(value) = value else {
        return Ok(PERCENTAGE_SCALE);
    };
    let denominator: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("PERCENTAGE_SCALE is not an integer: {value}"))?;
    anyhow::ensure!(denominator > 0, "PERCENTAGE_SCALE must be non-zero");
    Ok(denominator)
}

type SharedTree = Arc<AllocationTree>;

/// JSON-RPC request
#[derive(Debug, Deserialize)]
struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    id: Value,
}

/// JSON-RPC error object
#[derive(Debug, Serialize, PartialEq, Eq)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC response
#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: Value,
}

impl RpcResponse {
    fn new(id: Value, outcome: Result<Value, RpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            result,
            error,
            id,
        }
    }
}

fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError {
        code: INVALID_PARAMS,
        message: message.into(),
    }
}

/// `[account, percent]`
fn proof_params(params: Option<&Value>) -> Result<Allocation, RpcError> {
    let args = params
        .and_then(Value::as_array)
        .ok_or_else(|| invalid_params("expected [account, percent]"))?;

    let account = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("account must be a hex string"))?;
    let percent = args
        .get(1)
        .and_then(Value::as_u64)
        .ok_or_else(|| invalid_params("percent must be an unsigned integer"))?;

    let account = decode_address(account).map_err(|e| invalid_params(e.to_string()))?;
    Ok(Allocation::new(account, percent))
}

/// `{account, percent, proof, root}` or `[{...}]`
fn verify_params(params: Option<Value>) -> Result<VerifyRequest, RpcError> {
    let value = match params {
        Some(Value::Array(mut args)) if args.len() == 1 => args.remove(0),
        Some(value) => value,
        None => return Err(invalid_params("missing verify parameters")),
    };
    serde_json::from_value(value).map_err(|e| invalid_params(e.to_string()))
}

/// Route one request against the tree
fn dispatch(tree: &AllocationTree, req: RpcRequest) -> RpcResponse {
    let outcome = match req.method.as_str() {
        "splitter_getRoot" => Ok(json!(splitter_bindings::encode_hash(&tree.root()))),
        "splitter_getCommitment" => Ok(json!(Commitment::from(tree))),
        "splitter_getProof" => proof_params(req.params.as_ref()).and_then(|allocation| {
            ClaimProof::from_tree(tree, &allocation)
                .map(|claim| json!(claim))
                .map_err(|e| RpcError {
                    code: NOT_FOUND,
                    message: e.to_string(),
                })
        }),
        "splitter_verify" => verify_params(req.params).and_then(|request| {
            request
                .verify()
                .map(|valid| json!(valid))
                .map_err(|e| invalid_params(e.to_string()))
        }),
        other => {
            warn!("Unknown RPC method: {}", other);
            Err(RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("method not found: {other}"),
            })
        }
    };

    RpcResponse::new(req.id, outcome)
}

async fn health() -> &'static str {
    "ok"
}

async fn commitment(State(tree): State<SharedTree>) -> Json<Commitment> {
    Json(Commitment::from(tree.as_ref()))
}

async fn rpc_handler(
    State(tree): State<SharedTree>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(dispatch(&tree, req))
}

fn router(tree: SharedTree) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/commitment", get(commitment))
        .route("/", post(rpc_handler))
        .with_state(tree)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("===========================================");
    info!("        Splitter Proof Server");
    info!("===========================================");

    let config = Config::from_env()?;
    info!("  Allocations: {}", config.allocations_path);
    info!("  Denominator: {}", config.denominator);

    let json = std::fs::read_to_string(&config.allocations_path)
        .with_context(|| format!("failed to read {}", config.allocations_path))?;
    let allocations = splitter_bindings::parse_allocations(&json)?;
    let tree = AllocationTree::with_denominator(allocations, config.denominator)
        .context("invalid allocation set")?;
    info!(
        "Serving {} allocations under root {}",
        tree.len(),
        splitter_bindings::encode_hash(&tree.root())
    );

    let listener = tokio::net::TcpListener::bind(&config.rpc_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.rpc_addr))?;
    info!("RPC server listening on {}", config.rpc_addr);

    axum::serve(listener, router(Arc::new(tree))).await?;
    Ok(())
}
