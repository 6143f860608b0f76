use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    types::{BlockNumber, EnrichedClientError, EnrichedClientResult, FeeHistory, U256, U64},
    EthFeeInterface,
};

/// Maximum number of blocks served by a single `eth_feeHistory` call, same as in `geth`.
const FEE_HISTORY_MAX_BLOCK_COUNT: u64 = 1_024;

/// Block stored by [`MockEthereum`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockBlock {
    pub base_fee_per_gas: u64,
    pub gas_used_ratio: f64,
    /// Effective priority fees of the block transactions, sorted ascending.
    tips: Vec<u64>,
}

impl MockBlock {
    pub fn new(base_fee_per_gas: u64, gas_used_ratio: f64) -> Self {
        Self {
            base_fee_per_gas,
            gas_used_ratio,
            tips: vec![],
        }
    }

    pub fn with_tips(mut self, tips: impl IntoIterator<Item = u64>) -> Self {
        self.tips = tips.into_iter().collect();
        self.tips.sort_unstable();
        self
    }

    /// Tip at the specified percentile. Zero if the block has no transactions.
    fn reward_at(&self, percentile: f64) -> u64 {
        if self.tips.is_empty() {
            return 0;
        }
        let max_index = self.tips.len() - 1;
        let index = (percentile / 100.0 * max_index as f64).floor() as usize;
        self.tips[index.min(max_index)]
    }

    /// Base fee of the following block according to EIP-1559.
    fn next_base_fee(&self) -> u64 {
        let base_fee = self.base_fee_per_gas as f64;
        (base_fee * (1.0 + (self.gas_used_ratio - 0.5) / 4.0)) as u64
    }
}

/// `eth_feeHistory` request recorded by [`MockEthereum`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeeHistoryRequest {
    pub block_count: u64,
    pub newest_block: u64,
    pub reward_percentiles: Vec<f64>,
}

/// Builder for [`MockEthereum`].
#[derive(Debug, Default)]
pub struct MockEthereumBuilder {
    blocks: Vec<MockBlock>,
    pending_block: Option<MockBlock>,
}

impl MockEthereumBuilder {
    /// Sets the chain; the block at index `i` has number `i`.
    pub fn with_blocks(mut self, blocks: Vec<MockBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Appends blocks without transactions with the given base fees and gas used ratios.
    pub fn with_fee_history(mut self, history: impl IntoIterator<Item = (u64, f64)>) -> Self {
        self.blocks.extend(
            history
                .into_iter()
                .map(|(base_fee, ratio)| MockBlock::new(base_fee, ratio)),
        );
        self
    }

    /// Sets the pending block served for the `pending` tag. It follows the head block and cannot
    /// be requested by number.
    pub fn with_pending_block(mut self, block: MockBlock) -> Self {
        self.pending_block = Some(block);
        self
    }

    pub fn build(self) -> MockEthereum {
        MockEthereum {
            blocks: Arc::new(self.blocks),
            pending_block: self.pending_block.map(Arc::new),
            requests: Arc::default(),
        }
    }
}

/// Mock Ethereum client serving fee history from memory. It records all `eth_feeHistory` requests
/// for the further analysis.
///
/// Unless a pending block is set, the `pending` tag is resolved to the head block, i.e. as a node
/// without pending block support would.
#[derive(Debug, Clone, Default)]
pub struct MockEthereum {
    blocks: Arc<Vec<MockBlock>>,
    pending_block: Option<Arc<MockBlock>>,
    requests: Arc<Mutex<Vec<FeeHistoryRequest>>>,
}

impl MockEthereum {
    pub fn builder() -> MockEthereumBuilder {
        MockEthereumBuilder::default()
    }

    /// Returns all `eth_feeHistory` requests received so far.
    pub fn requests(&self) -> Vec<FeeHistoryRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn head(&self, method: &'static str) -> EnrichedClientResult<u64> {
        match self.blocks.len() {
            0 => Err(EnrichedClientError::custom("chain has no blocks", method)),
            len => Ok(len as u64 - 1),
        }
    }

    /// Gets a block by number, including the pending one.
    fn block(&self, number: u64) -> Option<&MockBlock> {
        let idx = usize::try_from(number).ok()?;
        match self.blocks.get(idx) {
            Some(block) => Some(block),
            None if idx == self.blocks.len() => self.pending_block.as_deref(),
            None => None,
        }
    }

    fn resolve_block(&self, block: BlockNumber) -> EnrichedClientResult<u64> {
        let head = self.head("eth_feeHistory")?;
        let number = match block {
            BlockNumber::Earliest => 0,
            BlockNumber::Number(number) => number.as_u64(),
            BlockNumber::Pending if self.pending_block.is_some() => return Ok(head + 1),
            _ => head,
        };
        if number > head {
            let err = EnrichedClientError::custom(
                "requested block is beyond the head",
                "eth_feeHistory",
            );
            return Err(err.with_arg("newest_block", &block).with_arg("head", &head));
        }
        Ok(number)
    }
}

#[async_trait]
impl EthFeeInterface for MockEthereum {
    async fn block_number(&self) -> EnrichedClientResult<U64> {
        self.head("eth_blockNumber").map(U64::from)
    }

    async fn fee_history(
        &self,
        block_count: u64,
        newest_block: BlockNumber,
        reward_percentiles: &[f64],
    ) -> EnrichedClientResult<FeeHistory> {
        let newest = self.resolve_block(newest_block)?;
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FeeHistoryRequest {
                block_count,
                newest_block: newest,
                reward_percentiles: reward_percentiles.to_vec(),
            });

        let block_count = block_count.min(FEE_HISTORY_MAX_BLOCK_COUNT).min(newest + 1);
        if block_count == 0 {
            return Ok(FeeHistory {
                oldest_block: U64::from(newest + 1),
                ..FeeHistory::default()
            });
        }
        let oldest = newest + 1 - block_count;
        let range: Vec<_> = (oldest..=newest)
            .filter_map(|number| self.block(number))
            .collect();

        let mut base_fee_per_gas: Vec<_> = range
            .iter()
            .map(|block| U256::from(block.base_fee_per_gas))
            .collect();
        let next_base_fee = match self.block(newest + 1) {
            Some(next_block) => next_block.base_fee_per_gas,
            None => range[range.len() - 1].next_base_fee(),
        };
        base_fee_per_gas.push(U256::from(next_base_fee));

        let reward = (!reward_percentiles.is_empty()).then(|| {
            range
                .iter()
                .map(|block| {
                    reward_percentiles
                        .iter()
                        .map(|&percentile| U256::from(block.reward_at(percentile)))
                        .collect()
                })
                .collect()
        });

        Ok(FeeHistory {
            oldest_block: U64::from(oldest),
            base_fee_per_gas,
            gas_used_ratio: range.iter().map(|block| block.gas_used_ratio).collect(),
            reward,
        })
    }
}
