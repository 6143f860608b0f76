//! Header-level fee history used as the input of the suggestion pipeline.

use fee_oracle_eth_client::{
    types::cast_to_u128, EnrichedClientError, EnrichedClientResult, FeeHistory,
};

/// Header-level fee signal of a single historical block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockFeeSample {
    pub number: u64,
    pub base_fee_per_gas: f64,
    pub gas_used_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("fee history contains no base fees")]
    Empty,
    #[error(
        "fee history has {base_fees} base fees for {ratios} blocks; expected exactly one projected base fee"
    )]
    LengthMismatch { base_fees: usize, ratios: usize },
    #[error("gas used ratio {ratio} of block #{number} is not a finite non-negative number")]
    InvalidRatio { number: u64, ratio: f64 },
}

/// Window of `N` consecutive blocks plus the projected base fee of the block following the newest one.
///
/// Invariant: there are `N + 1` base fees and `N` gas used ratios. `N` may be zero, in which case
/// the window consists of the projected base fee only.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeHistoryWindow {
    oldest_block: u64,
    base_fees: Vec<f64>,
    gas_used_ratios: Vec<f64>,
}

impl FeeHistoryWindow {
    pub fn new(
        oldest_block: u64,
        base_fees: Vec<f64>,
        gas_used_ratios: Vec<f64>,
    ) -> Result<Self, WindowError> {
        if base_fees.is_empty() {
            return Err(WindowError::Empty);
        }
        if base_fees.len() != gas_used_ratios.len() + 1 {
            return Err(WindowError::LengthMismatch {
                base_fees: base_fees.len(),
                ratios: gas_used_ratios.len(),
            });
        }
        for (number, &ratio) in (oldest_block..).zip(&gas_used_ratios) {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(WindowError::InvalidRatio { number, ratio });
            }
        }
        Ok(Self {
            oldest_block,
            base_fees,
            gas_used_ratios,
        })
    }

    /// Number of fetched blocks, i.e. `N`.
    pub fn len(&self) -> usize {
        self.gas_used_ratios.len()
    }

    /// Checks whether the window has no fetched blocks. Even then, it holds the projected base fee.
    pub fn is_empty(&self) -> bool {
        self.gas_used_ratios.is_empty()
    }

    pub fn oldest_block(&self) -> u64 {
        self.oldest_block
    }

    /// Number of the newest fetched block, or `None` if the window has no fetched blocks.
    pub fn newest_block(&self) -> Option<u64> {
        let len = self.len() as u64;
        (len > 0).then(|| self.oldest_block + len - 1)
    }

    /// Base fees of all blocks in the window followed by the projected base fee (`N + 1` values).
    pub fn base_fees(&self) -> &[f64] {
        &self.base_fees
    }

    pub fn gas_used_ratios(&self) -> &[f64] {
        &self.gas_used_ratios
    }

    /// Base fee of the block following the newest one.
    pub fn projected_base_fee(&self) -> f64 {
        self.base_fees[self.len()]
    }

    /// Iterates over fetched blocks, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = BlockFeeSample> + '_ {
        (self.oldest_block..)
            .zip(self.base_fees.iter().zip(&self.gas_used_ratios))
            .map(|(number, (&base_fee_per_gas, &gas_used_ratio))| BlockFeeSample {
                number,
                base_fee_per_gas,
                gas_used_ratio,
            })
    }
}

impl TryFrom<FeeHistory> for FeeHistoryWindow {
    type Error = EnrichedClientError;

    fn try_from(history: FeeHistory) -> EnrichedClientResult<Self> {
        let base_fees = history
            .base_fee_per_gas
            .into_iter()
            .map(|fee| cast_to_u128(fee, "base fee").map(|fee| fee as f64))
            .collect::<Result<Vec<_>, _>>()?;
        let oldest_block = history.oldest_block.as_u64();
        Self::new(oldest_block, base_fees, history.gas_used_ratio).map_err(|err| {
            EnrichedClientError::custom(err.to_string(), "eth_feeHistory")
                .with_arg("oldest_block", &oldest_block)
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use fee_oracle_eth_client::{U256, U64};

    use super::*;

    #[test]
    fn creating_window() {
        let window = FeeHistoryWindow::new(10, vec![1.0, 2.0, 3.0], vec![0.5, 1.0]).unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window.newest_block(), Some(11));
        assert_eq!(window.projected_base_fee(), 3.0);
        let samples: Vec<_> = window.samples().collect();
        assert_eq!(
            samples,
            [
                BlockFeeSample {
                    number: 10,
                    base_fee_per_gas: 1.0,
                    gas_used_ratio: 0.5,
                },
                BlockFeeSample {
                    number: 11,
                    base_fee_per_gas: 2.0,
                    gas_used_ratio: 1.0,
                },
            ]
        );
    }

    #[test]
    fn window_with_projected_base_fee_only() {
        let window = FeeHistoryWindow::new(7, vec![1.0], vec![]).unwrap();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert_eq!(window.newest_block(), None);
        assert_eq!(window.projected_base_fee(), 1.0);
        assert_eq!(window.samples().count(), 0);
    }

    #[test]
    fn malformed_windows_are_rejected() {
        assert_matches!(
            FeeHistoryWindow::new(0, vec![], vec![]),
            Err(WindowError::Empty)
        );
        assert_matches!(
            FeeHistoryWindow::new(0, vec![1.0, 2.0], vec![0.5, 0.5]),
            Err(WindowError::LengthMismatch {
                base_fees: 2,
                ratios: 2,
            })
        );
        assert_matches!(
            FeeHistoryWindow::new(5, vec![1.0, 2.0, 3.0], vec![0.5, f64::NAN]),
            Err(WindowError::InvalidRatio { number: 6, .. })
        );
    }

    #[test]
    fn converting_fee_history() {
        let history = FeeHistory {
            oldest_block: U64::from(3),
            base_fee_per_gas: vec![U256::from(100), U256::from(105)],
            gas_used_ratio: vec![0.7],
            reward: None,
        };
        let window = FeeHistoryWindow::try_from(history).unwrap();
        assert_eq!(window.oldest_block(), 3);
        assert_eq!(window.base_fees(), [100.0, 105.0]);

        let history = FeeHistory {
            oldest_block: U64::from(3),
            base_fee_per_gas: vec![U256::from(100)],
            gas_used_ratio: vec![0.7],
            reward: None,
        };
        let err = FeeHistoryWindow::try_from(history).unwrap_err();
        assert_eq!(err.method(), "eth_feeHistory");
        assert!(
            err.to_string().contains("1 base fees for 1 blocks"),
            "{err}"
        );
    }
}
