//! Priority fee suggestions based on rewards in recent blocks.

use anyhow::Context as _;
use fee_oracle_config::FeeOracleConfig;
use fee_oracle_eth_client::{
    types::cast_to_u128, BlockNumber, EnrichedClientError, EthFeeInterface, U64,
};

use crate::{
    metrics::{FeeHistoryKind, METRICS},
    window::FeeHistoryWindow,
};


/// Sorted pool of non-zero rewards observed in recent usable blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardPool {
    samples: Vec<f64>,
}

impl FromIterator<f64> for RewardPool {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut samples: Vec<_> = iter.into_iter().filter(|&reward| reward > 0.0).collect();
        samples.sort_by(f64::total_cmp);
        Self { samples }
    }
}

impl RewardPool {
    /// Collects rewards from the most recent usable blocks of the `window`.
    ///
    /// A block is usable if it's neither empty nor full. Consecutive usable blocks are queried
    /// with a single `eth_feeHistory` call, so at most `reward_block_count` calls are made.
    ///
    /// `newest_block` is the block the `window` was fetched for. It addresses the run starting
    /// at the newest window block, since some tags (e.g., `pending`) have no number known to the node.
    /// Older runs are addressed by number.
    pub async fn collect(
        client: &dyn EthFeeInterface,
        window: &FeeHistoryWindow,
        newest_block: BlockNumber,
        config: &FeeOracleConfig,
    ) -> anyhow::Result<Self> {
        let is_usable = |ratio: f64| ratio > 0.0 && ratio <= config.full_block_threshold;
        let ratios = window.gas_used_ratios();
        let percentiles = config.reward_percentiles();

        let mut samples = vec![];
        let mut remaining = config.reward_block_count;
        // Exclusive upper bound of window indices not scanned yet.
        let mut end = ratios.len();
        while remaining > 0 && end > 0 {
            let newest_idx = end - 1;
            let mut run_len = 0;
            while run_len < remaining
                && run_len <= newest_idx
                && is_usable(ratios[newest_idx - run_len])
            {
                run_len += 1;
            }
            // The block preceding the run (if any) is unusable, so it's skipped as well.
            end = end.saturating_sub(run_len + 1);
            if run_len == 0 {
                continue;
            }

            let run_newest = window.oldest_block() + newest_idx as u64;
            let run_newest_block = if newest_idx + 1 == ratios.len() {
                newest_block
            } else {
                BlockNumber::Number(U64::from(run_newest))
            };
            tracing::debug!(run_len, run_newest, "Requesting rewards for usable blocks");
            METRICS.fee_history_calls[&FeeHistoryKind::Rewards].inc();
            let history = client
                .fee_history(run_len as u64, run_newest_block, &percentiles)
                .await
                .with_context(|| format!("failed fetching rewards for block #{run_newest}"))?;

            let rewards = history.reward.ok_or_else(|| {
                EnrichedClientError::custom("fee history has no rewards", "eth_feeHistory")
                    .with_arg("newest_block", &run_newest)
            })?;
            for reward in rewards.iter().flatten() {
                samples.push(cast_to_u128(*reward, "reward")? as f64);
            }
            if rewards.len() < run_len {
                tracing::debug!(
                    returned = rewards.len(),
                    run_len,
                    "Reached the start of available history"
                );
                break;
            }
            remaining -= run_len;
        }

        let pool: Self = samples.into_iter().collect();
        METRICS.reward_pool_size.set(pool.len());
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Selects the priority fee for the specified time factor. The selected percentile of the pool
    /// goes from `max_block_percentile` for `time_factor == 1` down to `min_block_percentile` for large factors.
    pub fn select(&self, time_factor: f64, config: &FeeOracleConfig) -> f64 {
        let Some(max_rank) = self.samples.len().checked_sub(1) else {
            return config.fallback_priority_fee as f64;
        };
        let percentile = config.min_block_percentile
            + (config.max_block_percentile - config.min_block_percentile) / time_factor;
        let rank = (max_rank as f64 * percentile / 100.0).floor() as usize;
        self.samples[rank.min(max_rank)]
    }
}
