//! Fee curve: suggestions for a range of time factors.

use std::{iter, slice};

use fee_oracle_config::FeeOracleConfig;
use serde::Serialize;

use crate::{
    base_fee::{NormalizedBaseFees, SamplingCurve},
    priority_fee::RewardPool,
};

/// Time factors the curve is evaluated at: `max_time_factor`, `max_time_factor / 2`, ..., 1.
pub fn time_factors(max_time_factor: u32) -> impl Iterator<Item = u32> {
    iter::successors(Some(max_time_factor), |&time_factor| {
        (time_factor > 1).then_some(time_factor / 2)
    })
}

/// Suggested EIP-1559 fee parameters for a single time factor.
///
/// Values are fractional; use `*_wei()` methods to get values suitable for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSuggestion {
    pub time_factor: u32,
    pub max_fee_per_gas: f64,
    pub max_priority_fee_per_gas: f64,
}

impl FeeSuggestion {
    /// Base fee the suggestion is built on.
    pub fn base_fee_per_gas(&self) -> f64 {
        self.max_fee_per_gas - self.max_priority_fee_per_gas
    }

    pub fn max_fee_per_gas_wei(&self) -> u128 {
        self.max_fee_per_gas.ceil() as u128
    }

    pub fn max_priority_fee_per_gas_wei(&self) -> u128 {
        self.max_priority_fee_per_gas.ceil() as u128
    }
}

/// Fee suggestions ordered by ascending time factor, i.e. the most urgent suggestion goes first.
///
/// A more urgent suggestion never builds on a lower base fee than a less urgent one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeeCurve {
    suggestions: Vec<FeeSuggestion>,
}

impl FeeCurve {
    /// Builds the curve for time factors defined by `config`.
    pub fn build(
        base_fees: &NormalizedBaseFees,
        rewards: &RewardPool,
        config: &FeeOracleConfig,
    ) -> Self {
        if rewards.is_empty() {
            tracing::warn!(
                fallback_priority_fee = config.fallback_priority_fee,
                "No rewards in recent usable blocks; using fallback priority fee"
            );
        }

        let sampling_curve = SamplingCurve::from_config(config);
        let mut builder = FeeCurveBuilder::new(config);
        for time_factor in time_factors(config.max_time_factor) {
            let time_factor_f64 = f64::from(time_factor);
            let predicted = base_fees.predict(time_factor_f64 - 1.0, sampling_curve);
            let priority_fee = rewards.select(time_factor_f64, config);
            builder.push(time_factor, predicted, priority_fee);
        }
        builder.build()
    }

    pub fn suggestions(&self) -> &[FeeSuggestion] {
        &self.suggestions
    }

    pub fn iter(&self) -> slice::Iter<'_, FeeSuggestion> {
        self.suggestions.iter()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn get(&self, time_factor: u32) -> Option<&FeeSuggestion> {
        self.suggestions
            .iter()
            .find(|suggestion| suggestion.time_factor == time_factor)
    }

    pub fn most_urgent(&self) -> Option<&FeeSuggestion> {
        self.suggestions.first()
    }
}

impl<'a> IntoIterator for &'a FeeCurve {
    type Item = &'a FeeSuggestion;
    type IntoIter = slice::Iter<'a, FeeSuggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.suggestions.iter()
    }
}

/// Accumulates suggestions from the most patient to the most urgent one, repairing base fee dips.
///
/// If the base fee predicted for a time factor is lower than one predicted for a larger factor,
/// the larger prediction is used instead, and the priority fee is increased by a share of the difference.
#[derive(Debug)]
pub(crate) struct FeeCurveBuilder<'a> {
    config: &'a FeeOracleConfig,
    max_base_fee: f64,
    suggestions: Vec<FeeSuggestion>,
}

impl<'a> FeeCurveBuilder<'a> {
    pub fn new(config: &'a FeeOracleConfig) -> Self {
        Self {
            config,
            max_base_fee: 0.0,
            suggestions: vec![],
        }
    }

    /// Adds a suggestion; `time_factor` must be lower than for all previously pushed ones.
    pub fn push(&mut self, time_factor: u32, predicted_base_fee: f64, priority_fee: f64) {
        let (base_fee, priority_fee) = if predicted_base_fee > self.max_base_fee {
            self.max_base_fee = predicted_base_fee;
            (predicted_base_fee, priority_fee)
        } else {
            let dip = self.max_base_fee - predicted_base_fee;
            if dip > 0.0 {
                tracing::debug!(
                    time_factor,
                    predicted_base_fee,
                    max_base_fee = self.max_base_fee,
                    "Predicted base fee dips below the one for a larger time factor"
                );
            }
            let extra_fee = self.config.extra_priority_fee_ratio * dip;
            (self.max_base_fee, priority_fee + extra_fee)
        };

        self.suggestions.push(FeeSuggestion {
            time_factor,
            max_fee_per_gas: base_fee + priority_fee,
            max_priority_fee_per_gas: priority_fee,
        });
    }

    pub fn build(mut self) -> FeeCurve {
        self.suggestions.reverse();
        FeeCurve {
            suggestions: self.suggestions,
        }
    }
}
