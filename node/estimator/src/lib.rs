//! EIP-1559 fee suggestions.
//!
//! [`FeeOracle`] builds a [`FeeCurve`]: pairs of max fee and max priority fee per gas for a range
//! of time factors, i.e. how many blocks the sender is willing to wait for inclusion.
//! The base fee part is predicted from a recency-weighted distribution of recent base fees,
//! and the priority fee part is selected from rewards in recent non-empty, non-full blocks.

pub use self::{
    base_fee::{NormalizedBaseFees, SamplingCurve},
    calibration::{CalibrationReport, Calibrator, InclusionStats},
    curve::{time_factors, FeeCurve, FeeSuggestion},
    oracle::FeeOracle,
    priority_fee::RewardPool,
    window::{BlockFeeSample, FeeHistoryWindow, WindowError},
};

mod base_fee;
mod calibration;
mod curve;
mod metrics;
mod oracle;
mod priority_fee;
#[cfg(test)]
mod tests;
mod window;
