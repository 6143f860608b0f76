//! Base fee prediction: normalization of the fetched history and weighted percentile sampling.

use std::f64::consts::PI;

use fee_oracle_config::FeeOracleConfig;

use crate::window::FeeHistoryWindow;


/// Time factors below this value are treated as zero, i.e. only the projected base fee is trusted.
const MIN_TIME_FACTOR: f64 = 1e-6;

/// Smooth ramp from 0 to 1 selecting the `[min_percentile, max_percentile]` band of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingCurve {
    min_percentile: f64,
    max_percentile: f64,
}

impl SamplingCurve {
    pub fn new(min_percentile: f64, max_percentile: f64) -> Self {
        Self {
            min_percentile,
            max_percentile,
        }
    }

    pub(crate) fn from_config(config: &FeeOracleConfig) -> Self {
        Self::new(config.sample_min_percentile, config.sample_max_percentile)
    }

    /// Evaluates the curve at `percentile` (on the `[0, 100]` scale).
    pub fn value(&self, percentile: f64) -> f64 {
        if percentile <= self.min_percentile {
            return 0.0;
        }
        if percentile >= self.max_percentile {
            return 1.0;
        }
        let position =
            (percentile - self.min_percentile) / (self.max_percentile - self.min_percentile);
        (1.0 - (PI * position).cos()) / 2.0
    }
}

/// Base fee history with full blocks repaired, together with its ascending order.
///
/// Contains `N + 1` values; the last one is the (inflated) projected base fee.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBaseFees {
    values: Vec<f64>,
    /// Indices of `values` sorted by value; ties are ordered by index.
    order: Vec<usize>,
}

impl NormalizedBaseFees {
    pub fn new(window: &FeeHistoryWindow, config: &FeeOracleConfig) -> Self {
        Self::normalize(
            window.base_fees().to_vec(),
            window.gas_used_ratios(),
            config.full_block_threshold,
            config.pending_base_fee_multiplier,
        )
    }

    fn normalize(
        mut values: Vec<f64>,
        gas_used_ratios: &[f64],
        full_block_threshold: f64,
        pending_multiplier: f64,
    ) -> Self {
        let projected_idx = gas_used_ratios.len();
        // The next block is assumed to be full.
        values[projected_idx] *= pending_multiplier;
        // Base fee of a full block isn't an equilibrium price; take the one of the following block instead.
        for i in (0..projected_idx).rev() {
            if gas_used_ratios[i] > full_block_threshold {
                values[i] = values[i + 1];
            }
        }

        let mut order: Vec<_> = (0..values.len()).collect();
        // `sort_by` is stable, so ties remain ordered by index.
        order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
        Self { values, order }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Projected base fee of the next block after normalization.
    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Predicts the base fee by averaging the part of the recency-weighted distribution of base fees
    /// selected by `curve`.
    ///
    /// The weight of a value decays exponentially with its distance from the projected block,
    /// `time_factor` being the decay length in blocks.
    pub fn predict(&self, time_factor: f64, curve: SamplingCurve) -> f64 {
        if time_factor < MIN_TIME_FACTOR {
            return self.last();
        }

        let projected_idx = (self.values.len() - 1) as f64;
        // Normalizes weights of all `N + 1` values to sum up to 1.
        let norm = (1.0 - (-1.0 / time_factor).exp())
            / (1.0 - (-(projected_idx + 1.0) / time_factor).exp());

        let mut cumulative_weight = 0.0;
        let mut prev_sample = 0.0;
        let mut result = 0.0;
        for &idx in &self.order {
            cumulative_weight += norm * ((idx as f64 - projected_idx) / time_factor).exp();
            let sample = curve.value(cumulative_weight * 100.0);
            result += (sample - prev_sample) * self.values[idx];
            if sample >= 1.0 {
                return result;
            }
            prev_sample = sample;
        }

        // Rounding errors may leave the cumulative weight just short of the band end.
        if prev_sample > 0.0 {
            result / prev_sample
        } else {
            self.last()
        }
    }
}
