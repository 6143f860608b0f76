use super::*;
use crate::env::test_utils::EnvMutex;

static MUTEX: EnvMutex = EnvMutex::new();

#[test]
fn fee_oracle_config_from_env() {
    let mut lock = MUTEX.lock();
    lock.set_env(
        r#"
            FEE_ORACLE_HISTORY_BLOCK_COUNT="300"
            FEE_ORACLE_MAX_TIME_FACTOR="16"
            FEE_ORACLE_EXTRA_PRIORITY_FEE_RATIO="0.5"
            FEE_ORACLE_FALLBACK_PRIORITY_FEE="1500000000"
        "#,
    );

    let config = FeeOracleConfig::from_env().unwrap();
    assert_eq!(
        config,
        FeeOracleConfig {
            history_block_count: 300,
            max_time_factor: 16,
            extra_priority_fee_ratio: 0.5,
            fallback_priority_fee: 1_500_000_000,
            ..FeeOracleConfig::default()
        }
    );
}

#[test]
fn invalid_fee_oracle_config_from_env() {
    let mut lock = MUTEX.lock();
    lock.set_env(
        r#"
            FEE_ORACLE_SAMPLE_MIN_PERCENTILE="50"
            FEE_ORACLE_SAMPLE_MAX_PERCENTILE="20"
        "#,
    );

    let err = FeeOracleConfig::from_env().unwrap_err();
    assert!(
        format!("{err:#}").contains("invalid fee_oracle config"),
        "{err:#}"
    );
}

#[test]
fn eth_client_config_from_env() {
    let mut lock = MUTEX.lock();
    lock.set_env(
        r#"
            FEE_ORACLE_ETH_CLIENT_WEB3_URL="http://127.0.0.1:8545"
        "#,
    );
    lock.remove_env(&["FEE_ORACLE_ETH_CLIENT_REQUEST_TIMEOUT_MS"]);

    let config = EthClientConfig::from_env().unwrap();
    assert_eq!(
        config,
        EthClientConfig::new("http://127.0.0.1:8545".parse().unwrap())
    );
    assert_eq!(config.request_timeout().as_secs(), 30);
}

#[test]
fn observability_config_falls_back_to_rust_log() {
    let mut lock = MUTEX.lock();
    lock.set_env(
        r#"
            FEE_ORACLE_OBSERVABILITY_LOG_FORMAT="json"
            RUST_LOG="fee_oracle=debug"
        "#,
    );
    lock.remove_env(&["FEE_ORACLE_OBSERVABILITY_LOG_DIRECTIVES"]);

    let config = ObservabilityConfig::from_env().unwrap();
    assert_eq!(config.log_format, "json");
    assert_eq!(config.log_directives.as_deref(), Some("fee_oracle=debug"));
}
