//! Declarations of the consumed JSON-RPC methods.

// Client-only expansion of `#[rpc]` rewrites `RpcResult` return types.
#[allow(unused_imports)]
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{BlockNumber, FeeHistory, U64};

#[rpc(client, namespace = "eth")]
pub(crate) trait EthNamespace {
    #[method(name = "blockNumber")]
    async fn get_block_number(&self) -> RpcResult<U64>;

    #[method(name = "feeHistory")]
    async fn fee_history(
        &self,
        block_count: U64,
        newest_block: BlockNumber,
        reward_percentiles: Vec<f64>,
    ) -> RpcResult<FeeHistory>;
}
