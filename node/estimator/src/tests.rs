//! End-to-end tests for the fee oracle.

use fee_oracle_config::FeeOracleConfig;
use fee_oracle_eth_client::{
    clients::{FeeHistoryRequest, MockBlock, MockEthereum},
    BlockNumber,
};
use test_casing::test_casing;

use crate::FeeOracle;

const GWEI: u64 = 1_000_000_000;

fn test_config() -> FeeOracleConfig {
    FeeOracleConfig {
        history_block_count: 10,
        max_time_factor: 8,
        ..FeeOracleConfig::default()
    }
}

/// Chain with 20 blocks with constant base fee of 100 gwei.
fn mock_chain() -> MockEthereum {
    MockEthereum::builder()
        .with_blocks(mock_chain_blocks())
        .build()
}

fn mock_chain_blocks() -> Vec<MockBlock> {
    let base_fee = 100 * GWEI;
    let mut blocks = vec![MockBlock::new(base_fee, 0.5).with_tips([5 * GWEI]); 13];
    blocks.extend([
        MockBlock::new(base_fee, 0.5).with_tips([GWEI]), // 13
        MockBlock::new(base_fee, 0.5).with_tips([GWEI]),
        MockBlock::new(base_fee, 0.5).with_tips([GWEI]),
        MockBlock::new(base_fee, 0.0),                        // 16; empty
        MockBlock::new(base_fee, 0.95).with_tips([7 * GWEI]), // 17; full
        MockBlock::new(base_fee, 0.5).with_tips([3 * GWEI]),
        MockBlock::new(base_fee, 0.5).with_tips([3 * GWEI]),
    ]);
    blocks
}

fn create_oracle(client: &MockEthereum, config: FeeOracleConfig) -> FeeOracle {
    FeeOracle::new(Box::new(client.clone()), config).unwrap()
}

#[test_casing(2, [BlockNumber::Latest, BlockNumber::Pending])]
#[tokio::test]
async fn suggesting_fees(newest_block: BlockNumber) {
    let client = mock_chain();
    let oracle = create_oracle(&client, test_config());
    let curve = oracle.suggest_fees(newest_block).await.unwrap();

    let reward_percentiles: Vec<_> = (0..=20).map(f64::from).collect();
    assert_eq!(
        client.requests(),
        [
            FeeHistoryRequest {
                block_count: 10,
                newest_block: 19,
                reward_percentiles: vec![],
            },
            FeeHistoryRequest {
                block_count: 2,
                newest_block: 19,
                reward_percentiles: reward_percentiles.clone(),
            },
            FeeHistoryRequest {
                block_count: 3,
                newest_block: 15,
                reward_percentiles,
            },
        ]
    );

    let time_factors: Vec<_> = curve.iter().map(|s| s.time_factor).collect();
    assert_eq!(time_factors, [1, 2, 4, 8]);

    let urgent = curve.most_urgent().unwrap();
    // Projected base fee is inflated by 9/8.
    assert_eq!(urgent.max_fee_per_gas_wei(), 115_500_000_000);
    assert_eq!(urgent.max_priority_fee_per_gas_wei(), 3_000_000_000);

    for suggestion in curve.iter().skip(1) {
        let base_fee = suggestion.base_fee_per_gas();
        assert!((base_fee - 100e9).abs() < 1.0, "{suggestion:?}");
    }
    assert_eq!(
        curve.get(8).unwrap().max_priority_fee_per_gas_wei(),
        1_000_000_000
    );
}

#[tokio::test]
async fn suggesting_fees_with_pending_block() {
    let client = MockEthereum::builder()
        .with_blocks(mock_chain_blocks())
        .with_pending_block(MockBlock::new(100 * GWEI, 0.5).with_tips([3 * GWEI]))
        .build();
    let oracle = create_oracle(&client, test_config());
    let curve = oracle.suggest_fees(BlockNumber::Pending).await.unwrap();

    let requests: Vec<_> = client
        .requests()
        .into_iter()
        .map(|req| (req.block_count, req.newest_block))
        .collect();
    assert_eq!(requests, [(10, 20), (3, 20), (2, 15)]);
    assert_eq!(curve.len(), 4);
    let urgent = curve.most_urgent().unwrap();
    assert_eq!(urgent.max_priority_fee_per_gas_wei(), 3_000_000_000);
}

#[tokio::test]
async fn suggestions_are_deterministic() {
    let client = mock_chain();
    let oracle = create_oracle(&client, test_config());
    let curve = oracle.suggest_fees(BlockNumber::Latest).await.unwrap();
    let same_curve = oracle
        .suggest_fees(BlockNumber::Number(19.into()))
        .await
        .unwrap();
    assert_eq!(curve, same_curve);
}

#[tokio::test]
async fn suggesting_fees_for_historical_block() {
    let client = mock_chain();
    let oracle = create_oracle(&client, test_config());
    let curve = oracle
        .suggest_fees(BlockNumber::Number(15.into()))
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(
        (requests[0].block_count, requests[0].newest_block),
        (10, 15)
    );
    // Blocks 15, 14, 13, 12, 11 are all usable.
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[1].block_count, requests[1].newest_block), (5, 15));

    // Pool contains 63 samples of 1 gwei and 42 samples of 5 gwei.
    let urgent = curve.most_urgent().unwrap();
    assert_eq!(urgent.max_priority_fee_per_gas_wei(), 5_000_000_000);
    assert_eq!(
        curve.get(8).unwrap().max_priority_fee_per_gas_wei(),
        1_000_000_000
    );
}

#[tokio::test]
async fn short_history_near_genesis() {
    let client = MockEthereum::builder()
        .with_fee_history([(10 * GWEI, 0.5), (12 * GWEI, 0.6), (11 * GWEI, 0.4)])
        .build();
    let oracle = create_oracle(&client, FeeOracleConfig::default());
    let curve = oracle.suggest_fees(BlockNumber::Latest).await.unwrap();

    assert_eq!(curve.len(), 9);
    let requests = client.requests();
    assert_eq!(requests[0].block_count, 1_024);
    assert_eq!((requests[1].block_count, requests[1].newest_block), (3, 2));
    // Blocks have no transactions, so all rewards are zero.
    for suggestion in &curve {
        assert!(suggestion.max_priority_fee_per_gas >= 2e9, "{suggestion:?}");
    }
}

#[tokio::test]
async fn only_full_blocks() {
    let client = MockEthereum::builder()
        .with_fee_history((0..20).map(|i| ((10 + i) * GWEI, 1.0)))
        .build();
    let config = test_config();
    let oracle = create_oracle(&client, config.clone());
    let curve = oracle.suggest_fees(BlockNumber::Latest).await.unwrap();

    assert_eq!(client.requests().len(), 1);
    // All base fees are replaced with the projected one. The node projects 29 gwei * 1.125 for a full block,
    // and the oracle inflates it by another 9/8.
    let expected_base_fee = 29e9 * 1.125 * 1.125;
    let fallback_priority_fee = config.fallback_priority_fee as f64;
    for suggestion in &curve {
        assert!(
            (suggestion.max_priority_fee_per_gas - fallback_priority_fee).abs() < 1.0,
            "{suggestion:?}"
        );
        assert!(
            (suggestion.base_fee_per_gas() - expected_base_fee).abs() < 1.0,
            "{suggestion:?}"
        );
    }
}

#[tokio::test]
async fn data_source_errors_are_propagated() {
    let client = mock_chain();
    let oracle = create_oracle(&client, test_config());
    let err = oracle
        .suggest_fees(BlockNumber::Number(100.into()))
        .await
        .unwrap_err();
    let err = format!("{err:#}");
    assert!(err.contains("failed fetching base fee history"), "{err}");
    assert!(err.contains("beyond the head"), "{err}");
}

#[test]
fn invalid_config_is_rejected() {
    let config = FeeOracleConfig {
        min_block_percentile: 90.0,
        ..test_config()
    };
    let err = FeeOracle::new(Box::new(mock_chain()), config).unwrap_err();
    assert!(
        format!("{err:#}").contains("invalid fee oracle config"),
        "{err:#}"
    );
}
