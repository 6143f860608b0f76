//! Historical replay of fee suggestions measuring realized inclusion rates.

use std::{collections::BTreeMap, ops::RangeInclusive};

use anyhow::Context as _;
use fee_oracle_eth_client::{types::cast_to_u128, BlockNumber, EnrichedClientError, U64};
use futures::{stream, StreamExt as _, TryStreamExt as _};
use serde::Serialize;

use crate::{
    curve::{FeeCurve, FeeSuggestion},
    oracle::FeeOracle,
};

/// Maximum number of blocks fetched with a single `eth_feeHistory` call.
const MAX_CHUNK_SIZE: u64 = 1_024;

/// Inclusion statistics for a single time factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InclusionStats {
    /// Number of suggestions with a known outcome.
    pub attempts: u64,
    /// Number of suggestions that would be included within their time factor.
    pub included: u64,
}

impl InclusionStats {
    /// Returns the share of included suggestions, or `None` if there were no attempts.
    pub fn rate(&self) -> Option<f64> {
        (self.attempts > 0).then(|| self.included as f64 / self.attempts as f64)
    }
}

/// Inclusion statistics for all time factors on the curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub first_block: u64,
    pub last_block: u64,
    pub time_factors: BTreeMap<u32, InclusionStats>,
}

/// Realized fee data of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RealizedBlock {
    base_fee_per_gas: f64,
    /// Reward at the calibration percentile.
    reward: f64,
}

#[derive(Debug, Default)]
struct RealizedHistory {
    first_block: u64,
    blocks: Vec<RealizedBlock>,
}

impl RealizedHistory {
    fn get(&self, number: u64) -> Option<&RealizedBlock> {
        let idx = number.checked_sub(self.first_block)?;
        self.blocks.get(usize::try_from(idx).ok()?)
    }

    /// Checks whether the suggestion made at `reference_block` would be included within its time factor.
    /// Returns `None` if the outcome is unknown because realized history ends too early.
    fn is_included(&self, reference_block: u64, suggestion: &FeeSuggestion) -> Option<bool> {
        for offset in 1..=u64::from(suggestion.time_factor) {
            let block = self.get(reference_block + offset)?;
            let effective_tip = suggestion
                .max_priority_fee_per_gas
                .min(suggestion.max_fee_per_gas - block.base_fee_per_gas);
            if effective_tip >= block.reward {
                return Some(true);
            }
        }
        Some(false)
    }
}

/// Replays [`FeeOracle`] suggestions against historical blocks.
///
/// A suggestion made at block `B` for time factor `T` is considered included if for some block
/// among `B + 1..=B + T`, the effective tip of the suggestion is not lower than the realized reward
/// at `calibration_reward_percentile` in this block.
#[derive(Debug)]
pub struct Calibrator<'a> {
    oracle: &'a FeeOracle,
}

impl<'a> Calibrator<'a> {
    pub fn new(oracle: &'a FeeOracle) -> Self {
        Self { oracle }
    }

    pub async fn calibrate(
        &self,
        blocks: RangeInclusive<u64>,
    ) -> anyhow::Result<CalibrationReport> {
        let (first_block, last_block) = (*blocks.start(), *blocks.end());
        anyhow::ensure!(
            first_block <= last_block,
            "invalid calibration range {first_block}..={last_block}"
        );
        let head = self
            .oracle
            .client()
            .block_number()
            .await
            .context("failed getting head block")?
            .as_u64();
        anyhow::ensure!(
            last_block <= head,
            "calibration range {first_block}..={last_block} ends after the head block #{head}"
        );

        let config = self.oracle.config();
        let realized_end = last_block
            .saturating_add(config.max_time_factor.into())
            .min(head);
        let realized = self.fetch_realized(first_block + 1, realized_end).await?;
        tracing::info!(
            first_block,
            last_block,
            realized_blocks = realized.blocks.len(),
            "Starting calibration"
        );

        let mut report = CalibrationReport {
            first_block,
            last_block,
            time_factors: BTreeMap::new(),
        };
        let mut replays = stream::iter(blocks)
            .map(|block| async move {
                let curve = self
                    .oracle
                    .suggest_fees(BlockNumber::Number(U64::from(block)))
                    .await
                    .with_context(|| format!("failed replaying suggestion at block #{block}"))?;
                anyhow::Ok((block, curve))
            })
            .buffered(config.calibration_concurrency);

        while let Some((block, curve)) = replays.try_next().await? {
            Self::record(&mut report, &realized, block, &curve);
        }

        for (time_factor, stats) in &report.time_factors {
            tracing::info!(
                time_factor,
                attempts = stats.attempts,
                included = stats.included,
                "Calibrated inclusion rate"
            );
        }
        Ok(report)
    }

    fn record(
        report: &mut CalibrationReport,
        realized: &RealizedHistory,
        block: u64,
        curve: &FeeCurve,
    ) {
        for suggestion in curve {
            let stats = report
                .time_factors
                .entry(suggestion.time_factor)
                .or_default();
            if let Some(included) = realized.is_included(block, suggestion) {
                stats.attempts += 1;
                stats.included += u64::from(included);
            }
        }
    }

    /// Fetches realized base fees and rewards for blocks `first..=last` in chunks.
    async fn fetch_realized(&self, first: u64, last: u64) -> anyhow::Result<RealizedHistory> {
        let config = self.oracle.config();
        let percentiles = [config.calibration_reward_percentile];
        let mut realized = RealizedHistory {
            first_block: first,
            blocks: vec![],
        };

        let mut chunk_start = first;
        while chunk_start <= last {
            let chunk_end = last.min(chunk_start + MAX_CHUNK_SIZE - 1);
            let block_count = chunk_end - chunk_start + 1;
            let history = self
                .oracle
                .client()
                .fee_history(
                    block_count,
                    BlockNumber::Number(U64::from(chunk_end)),
                    &percentiles,
                )
                .await
                .with_context(|| {
                    format!("failed fetching realized fees for blocks {chunk_start}..={chunk_end}")
                })?;

            let rewards = history.reward.unwrap_or_default();
            let oldest_block = history.oldest_block.as_u64();
            if oldest_block != chunk_start
                || history.gas_used_ratio.len() as u64 != block_count
                || history.base_fee_per_gas.len() as u64 <= block_count
                || rewards.len() as u64 != block_count
            {
                let err = EnrichedClientError::custom(
                    "fee history doesn't cover the requested range",
                    "eth_feeHistory",
                );
                return Err(err
                    .with_arg("block_count", &block_count)
                    .with_arg("newest_block", &chunk_end)
                    .with_arg("oldest_block", &oldest_block)
                    .into());
            }

            for (base_fee, reward) in history.base_fee_per_gas.into_iter().zip(rewards) {
                let reward = reward.first().copied().unwrap_or_default();
                realized.blocks.push(RealizedBlock {
                    base_fee_per_gas: cast_to_u128(base_fee, "base fee")? as f64,
                    reward: cast_to_u128(reward, "reward")? as f64,
                });
            }
            chunk_start = chunk_end + 1;
        }
        Ok(realized)
    }
}
