//! Fee suggestion pipeline driving an Ethereum node client.

use anyhow::Context as _;
use fee_oracle_config::FeeOracleConfig;
use fee_oracle_eth_client::{BlockNumber, EthFeeInterface};

use crate::{
    base_fee::NormalizedBaseFees,
    curve::FeeCurve,
    metrics::{FeeHistoryKind, METRICS},
    priority_fee::RewardPool,
    window::FeeHistoryWindow,
};

/// Suggests EIP-1559 fees based on the fee history provided by an Ethereum node.
///
/// The oracle is stateless: each suggestion queries the node anew. Independent suggestions
/// (e.g., for different blocks) may be computed concurrently.
#[derive(Debug)]
pub struct FeeOracle {
    client: Box<dyn EthFeeInterface>,
    config: FeeOracleConfig,
}

impl FeeOracle {
    pub fn new(client: Box<dyn EthFeeInterface>, config: FeeOracleConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid fee oracle config")?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeeOracleConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &dyn EthFeeInterface {
        self.client.as_ref()
    }

    /// Fetches the header-only fee history window ending at `newest_block`.
    pub async fn fetch_window(
        &self,
        newest_block: BlockNumber,
    ) -> anyhow::Result<FeeHistoryWindow> {
        METRICS.fee_history_calls[&FeeHistoryKind::Headers].inc();
        let history = self
            .client
            .fee_history(self.config.history_block_count, newest_block, &[])
            .await
            .with_context(|| format!("failed fetching base fee history for {newest_block:?}"))?;
        let window = FeeHistoryWindow::try_from(history)?;
        tracing::debug!(
            oldest_block = window.oldest_block(),
            newest_block = ?window.newest_block(),
            projected_base_fee = window.projected_base_fee(),
            "Fetched base fee window"
        );
        Ok(window)
    }

    /// Builds the fee curve as of `newest_block`. Any data source failure fails the entire suggestion.
    pub async fn suggest_fees(&self, newest_block: BlockNumber) -> anyhow::Result<FeeCurve> {
        let latency = METRICS.suggestion_latency.start();
        let window = self.fetch_window(newest_block).await?;
        let base_fees = NormalizedBaseFees::new(&window, &self.config);
        let rewards =
            RewardPool::collect(self.client(), &window, newest_block, &self.config).await?;
        let curve = FeeCurve::build(&base_fees, &rewards, &self.config);
        let latency = latency.observe();

        if let Some(urgent) = curve.most_urgent() {
            METRICS.urgent_max_fee_per_gas.set(urgent.max_fee_per_gas);
            tracing::info!(
                newest_block = ?window.newest_block(),
                max_fee_per_gas = urgent.max_fee_per_gas_wei(),
                max_priority_fee_per_gas = urgent.max_priority_fee_per_gas_wei(),
                reward_samples = rewards.len(),
                ?latency,
                "Built fee curve"
            );
        }
        Ok(curve)
    }
}
