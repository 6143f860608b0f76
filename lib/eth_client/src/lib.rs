#![allow(clippy::upper_case_acronyms, clippy::derive_partial_eq_without_eq)]

use std::fmt;

use async_trait::async_trait;

pub use crate::types::{
    BlockNumber, EnrichedClientError, EnrichedClientResult, FeeHistory, U256, U64,
};

pub mod clients;
mod namespaces;
pub mod types;

/// Source of block fee history, as seen by the fee oracle.
///
/// ## Trait contents
///
/// Both methods are thin wrappers around the corresponding `eth_*` JSON-RPC methods. Implementations
/// must not retry failed requests; retries, if needed, belong to the caller.
///
/// A response to [`Self::fee_history()`] may contain fewer blocks than requested if the history
/// does not reach that far back. This is not an error; the caller treats it as the start of available history.
#[async_trait]
pub trait EthFeeInterface: fmt::Debug + Send + Sync + 'static {
    /// Returns the number of the most recent block.
    async fn block_number(&self) -> EnrichedClientResult<U64>;

    /// Collects the fee history for `block_count` blocks ending with `newest_block` (inclusive).
    ///
    /// If `reward_percentiles` is empty, the query is header-only and the returned history has no rewards.
    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: &[f64],
    ) -> EnrichedClientResult<FeeHistory>;
}
