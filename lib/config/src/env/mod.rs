//! Loading configs from environment variables.

use anyhow::Context as _;
use serde::de::DeserializeOwned;

use crate::{EthClientConfig, FeeOracleConfig, ObservabilityConfig};

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub trait FromEnv: Sized {
    fn from_env() -> anyhow::Result<Self>;
}

/// Convenience function that loads the structure from the environment variables given the prefix.
pub fn envy_load<T: DeserializeOwned>(name: &str, prefix: &str) -> anyhow::Result<T> {
    envy::prefixed(prefix)
        .from_env()
        .with_context(|| format!("Cannot load config <{name}>"))
}

impl FromEnv for FeeOracleConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("fee_oracle", "FEE_ORACLE_")?;
        config.validate().context("invalid fee_oracle config")?;
        Ok(config)
    }
}

impl FromEnv for EthClientConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("eth_client", "FEE_ORACLE_ETH_CLIENT_")
    }
}

impl FromEnv for ObservabilityConfig {
    fn from_env() -> anyhow::Result<Self> {
        let mut config: Self = envy_load("observability", "FEE_ORACLE_OBSERVABILITY_")?;
        if config.log_directives.is_none() {
            config.log_directives = std::env::var("RUST_LOG").ok();
        }
        Ok(config)
    }
}
