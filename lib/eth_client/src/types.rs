use std::{collections::BTreeMap, fmt};

use jsonrpsee::core::ClientError;
use serde::{Deserialize, Serialize};
pub use web3::types::{BlockNumber, U256, U64};

/// Response of the `eth_feeHistory` method. All arrays are ordered oldest block first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistory {
    /// Number of the oldest block in the returned range.
    pub oldest_block: U64,
    /// Base fee for each block in the range, followed by the base fee of the next block.
    pub base_fee_per_gas: Vec<U256>,
    /// Ratio of gas used to the gas limit for each block in the range.
    pub gas_used_ratio: Vec<f64>,
    /// Effective priority fees at the requested percentiles for each block in the range.
    /// Only present if reward percentiles were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<Vec<Vec<U256>>>,
}

impl FeeHistory {
    /// Number of fully described blocks in the response.
    pub fn block_count(&self) -> usize {
        self.gas_used_ratio.len()
    }
}

/// Client RPC error with additional details: the method name and arguments.
#[derive(Debug, thiserror::Error)]
#[error("{inner_error} (method: {method}, args: {args:?})")]
pub struct EnrichedClientError {
    #[source]
    inner_error: ClientError,
    method: &'static str,
    args: BTreeMap<&'static str, String>,
}

/// Alias for a result with enriched client RPC error.
pub type EnrichedClientResult<T> = Result<T, EnrichedClientError>;

impl EnrichedClientError {
    /// Wraps the specified `inner_error`.
    pub fn new(inner_error: ClientError, method: &'static str) -> Self {
        Self {
            inner_error,
            method,
            args: BTreeMap::new(),
        }
    }

    /// Creates an error wrapping [`ClientError::Custom`].
    pub fn custom(message: impl Into<String>, method: &'static str) -> Self {
        Self::new(ClientError::Custom(message.into()), method)
    }

    /// Adds a tracked argument for this error.
    #[must_use]
    pub fn with_arg(mut self, name: &'static str, value: &dyn fmt::Debug) -> Self {
        self.args.insert(name, format!("{value:?}"));
        self
    }

    /// Name of the method that has failed.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &ClientError {
        &self.inner_error
    }
}

/// Non-panicking conversion to `u128`.
pub fn cast_to_u128(value: U256, tag: &str) -> EnrichedClientResult<u128> {
    if value > U256::from(u128::MAX) {
        let err = EnrichedClientError::custom(
            format!("{tag} value does not fit in u128"),
            "cast_to_u128",
        );
        return Err(err.with_arg("value", &value));
    }
    Ok(value.low_u128())
}
