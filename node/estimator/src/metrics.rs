use std::time::Duration;

use vise::{
    Buckets, Counter, EncodeLabelSet, EncodeLabelValue, Family, Gauge, Histogram, Metrics, Unit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EncodeLabelValue, EncodeLabelSet)]
#[metrics(label = "kind", rename_all = "snake_case")]
pub(crate) enum FeeHistoryKind {
    /// Header-only query for the base fee window.
    Headers,
    /// Query with reward percentiles for a run of usable blocks.
    Rewards,
}

#[derive(Debug, Metrics)]
#[metrics(prefix = "fee_oracle")]
pub(crate) struct FeeOracleMetrics {
    /// Number of `eth_feeHistory` calls issued by the oracle.
    pub fee_history_calls: Family<FeeHistoryKind, Counter>,
    /// Number of samples in the most recently collected reward pool.
    pub reward_pool_size: Gauge<usize>,
    /// Max fee per gas of the most urgent suggestion on the latest curve.
    pub urgent_max_fee_per_gas: Gauge<f64>,
    /// Latency of building a fee curve, including data source queries.
    #[metrics(buckets = Buckets::LATENCIES, unit = Unit::Seconds)]
    pub suggestion_latency: Histogram<Duration>,
}

#[vise::register]
pub(crate) static METRICS: vise::Global<FeeOracleMetrics> = vise::Global::new();
