use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// By default, a single JSON-RPC request may take up to 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Configuration of the JSON-RPC endpoint serving `eth_feeHistory`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EthClientConfig {
    /// Address of the Ethereum node API.
    pub web3_url: Url,
    #[serde(default = "EthClientConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EthClientConfig {
    pub fn new(web3_url: Url) -> Self {
        Self {
            web3_url,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    fn default_request_timeout_ms() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_MS
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
