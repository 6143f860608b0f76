use anyhow::Context as _;
use async_trait::async_trait;
use fee_oracle_config::EthClientConfig;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};

use crate::{
    namespaces::EthNamespaceClient,
    types::{BlockNumber, EnrichedClientError, EnrichedClientResult, FeeHistory, U64},
    EthFeeInterface,
};

/// JSON-RPC client talking to an Ethereum node over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeeClient {
    inner: HttpClient,
    component: &'static str,
}

impl HttpFeeClient {
    pub fn new(config: &EthClientConfig) -> anyhow::Result<Self> {
        let inner = HttpClientBuilder::default()
            .request_timeout(config.request_timeout())
            .build(config.web3_url.as_str())
            .with_context(|| format!("failed building HTTP client for {}", config.web3_url))?;
        Ok(Self {
            inner,
            component: "fee_oracle",
        })
    }

    /// Tags the client with the component name; the tag is included into the client logs.
    pub fn for_component(mut self, component: &'static str) -> Self {
        self.component = component;
        self
    }
}

#[async_trait]
impl EthFeeInterface for HttpFeeClient {
    async fn block_number(&self) -> EnrichedClientResult<U64> {
        tracing::trace!(component = self.component, "Requesting eth_blockNumber");
        self.inner
            .get_block_number()
            .await
            .map_err(|err| EnrichedClientError::new(err, "eth_blockNumber"))
    }

    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: &[f64],
    ) -> EnrichedClientResult<FeeHistory> {
        tracing::trace!(
            component = self.component,
            block_count,
            ?newest_block,
            percentiles = reward_percentiles.len(),
            "Requesting eth_feeHistory"
        );
        self.inner
            .fee_history(
                U64::from(block_count),
                newest_block,
                reward_percentiles.to_vec(),
            )
            .await
            .map_err(|err| {
                EnrichedClientError::new(err, "eth_feeHistory")
                    .with_arg("block_count", &block_count)
                    .with_arg("newest_block", &newest_block)
            })
    }
}
