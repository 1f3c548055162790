//! Error taxonomy for the aggregator core.
//!
//! Each concern gets its own `thiserror` enum, mirroring the layering in
//! `arbitrage/detector.rs` and `pool/syncer.rs` of the original bot (narrow
//! typed errors inside the library, collapsed into `anyhow` only at the
//! binary edge).

use thiserror::Error;

/// Failures raised by a single pricing model while quoting or updating a pool.
///
/// These are always *local* to one hop: the evaluator discards the route
/// that produced them rather than failing the whole request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("invalid token [{0}] for pool")]
    InvalidToken(String),

    #[error("insufficient liquidity: requested output exceeds reserve")]
    InsufficientLiquidity,

    #[error("insufficient input: {0}")]
    InsufficientInput(String),

    #[error("unsafe value: {0}")]
    UnsafeValue(String),

    #[error("solver did not converge: {0}")]
    DidNotConverge(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Failures raised while searching for routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("max_hops out of range: {0} (expected 1..=4)")]
    InvalidMaxHops(u32),
}

/// Failures raised while evaluating a single route or a split-route plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("route hop chain is broken: expected input token [{expected}], got [{actual}]")]
    BrokenChain { expected: String, actual: String },

    #[error("external failure: {0}")]
    ExternalFailure(String),
}

/// Failures surfaced to the façade at the query-service boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("not ready: no successful sync cycle yet")]
    NotReady,
}

/// Failures raised while fanning out a sync cycle across venue families.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("venue family [{family}] sync failed: {source}")]
    Family {
        family: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to acquire sync lease")]
    LeaseUnavailable,
}

/// Configuration loading failures, analogous to `config::load_config`'s
/// `anyhow::Context` usage in the teacher, but typed for library callers.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for environment variable {name}: {value}")]
    InvalidVar { name: String, value: String },
}
