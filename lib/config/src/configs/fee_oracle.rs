use anyhow::Context as _;
use serde::Deserialize;

/// Number of blocks requested by the header-only fee history query.
pub const DEFAULT_HISTORY_BLOCK_COUNT: u64 = 1024;
/// Default priority fee (2 gwei) used when no recent block carries a usable tip signal.
pub const DEFAULT_FALLBACK_PRIORITY_FEE: u64 = 2_000_000_000;

/// Tunables of the fee suggestion pipeline.
///
/// All percentile values are expressed on the `[0, 100]` scale. The config is passed into the pipeline
/// explicitly, so differently tuned oracles may coexist in a single process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeeOracleConfig {
    /// Number of blocks in the header-only window used to predict the base fee.
    pub history_block_count: u64,
    /// Blocks with the gas used ratio above this value are considered full.
    pub full_block_threshold: f64,
    /// Multiplier applied to the projected base fee of the next block, which is assumed to be full.
    pub pending_base_fee_multiplier: f64,
    /// Lower bound of the sampling curve; weighted percentiles below it do not contribute.
    pub sample_min_percentile: f64,
    /// Upper bound of the sampling curve; weighted percentiles above it do not contribute.
    pub sample_max_percentile: f64,
    /// Rewards are requested for each integer percentile in `0..=max_reward_percentile`.
    pub max_reward_percentile: u32,
    /// Number of recent usable blocks sampled for priority fees.
    pub reward_block_count: usize,
    /// Reward pool percentile picked for the most patient suggestions.
    pub min_block_percentile: f64,
    /// Reward pool percentile picked for the most urgent suggestion.
    pub max_block_percentile: f64,
    /// Share of a base fee dip added to the priority fee when the dip is capped.
    pub extra_priority_fee_ratio: f64,
    /// Priority fee returned when there are no reward samples.
    pub fallback_priority_fee: u64,
    /// Largest time factor on the curve. The curve covers `max_time_factor`, `max_time_factor / 2`, ..., 1.
    pub max_time_factor: u32,
    /// Reward percentile treated as the realized inclusion threshold during calibration.
    pub calibration_reward_percentile: f64,
    /// Number of historical replays the calibrator runs concurrently.
    pub calibration_concurrency: usize,
}

impl Default for FeeOracleConfig {
    fn default() -> Self {
        Self {
            history_block_count: DEFAULT_HISTORY_BLOCK_COUNT,
            full_block_threshold: 0.9,
            pending_base_fee_multiplier: 9.0 / 8.0,
            sample_min_percentile: 10.0,
            sample_max_percentile: 30.0,
            max_reward_percentile: 20,
            reward_block_count: 5,
            min_block_percentile: 40.0,
            max_block_percentile: 80.0,
            extra_priority_fee_ratio: 0.25,
            fallback_priority_fee: DEFAULT_FALLBACK_PRIORITY_FEE,
            max_time_factor: 256,
            calibration_reward_percentile: 10.0,
            calibration_concurrency: 4,
        }
    }
}

impl FeeOracleConfig {
    /// Checks that the tunables describe a well-formed pipeline.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.history_block_count > 0,
            "history_block_count must be positive"
        );
        anyhow::ensure!(
            self.full_block_threshold > 0.0 && self.full_block_threshold <= 1.0,
            "full_block_threshold must be in (0, 1], got {}",
            self.full_block_threshold
        );
        anyhow::ensure!(
            self.pending_base_fee_multiplier > 0.0,
            "pending_base_fee_multiplier must be positive, got {}",
            self.pending_base_fee_multiplier
        );
        check_band(
            "sample",
            self.sample_min_percentile,
            self.sample_max_percentile,
        )?;
        check_band(
            "block",
            self.min_block_percentile,
            self.max_block_percentile,
        )?;
        anyhow::ensure!(
            self.max_reward_percentile <= 100,
            "max_reward_percentile must not exceed 100, got {}",
            self.max_reward_percentile
        );
        anyhow::ensure!(
            self.reward_block_count > 0,
            "reward_block_count must be positive"
        );
        anyhow::ensure!(
            self.extra_priority_fee_ratio >= 0.0,
            "extra_priority_fee_ratio must be non-negative, got {}",
            self.extra_priority_fee_ratio
        );
        anyhow::ensure!(self.max_time_factor > 0, "max_time_factor must be positive");
        check_percentile(
            "calibration_reward_percentile",
            self.calibration_reward_percentile,
        )?;
        anyhow::ensure!(
            self.calibration_concurrency > 0,
            "calibration_concurrency must be positive"
        );
        Ok(())
    }

    /// Percentiles requested for each usable block when collecting priority fees.
    pub fn reward_percentiles(&self) -> Vec<f64> {
        (0..=self.max_reward_percentile).map(f64::from).collect()
    }
}

fn check_percentile(name: &str, value: f64) -> anyhow::Result<()> {
    anyhow::ensure!(
        (0.0..=100.0).contains(&value),
        "{name} must be in [0, 100], got {value}"
    );
    Ok(())
}

fn check_band(name: &str, min: f64, max: f64) -> anyhow::Result<()> {
    check_percentile(&format!("min {name} percentile"), min)
        .and_then(|()| check_percentile(&format!("max {name} percentile"), max))
        .with_context(|| format!("invalid {name} percentile band"))?;
    anyhow::ensure!(
        min < max,
        "min {name} percentile ({min}) must be less than max {name} percentile ({max})"
    );
    Ok(())
}
