use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::{EthClientConfig, FeeOracleConfig, FromEnv, ObservabilityConfig};

/// Configuration of the whole application, as read from a single YAML file.
///
/// Every section is optional; a missing `fee_oracle` or `observability` section falls back to defaults,
/// and a missing `eth_client` section must be supplied by other means (e.g., a command-line argument).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigSources {
    pub fee_oracle: FeeOracleConfig,
    pub eth_client: Option<EthClientConfig>,
    pub observability: ObservabilityConfig,
}

impl ConfigSources {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let sources: Self = serde_yaml::from_str(yaml).context("failed parsing YAML config")?;
        sources
            .fee_oracle
            .validate()
            .context("invalid fee_oracle config")?;
        Ok(sources)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        Self::from_yaml_str(&yaml).with_context(|| format!("config file {}", path.display()))
    }

    /// Loads all sections from the environment. The Ethereum client section is optional.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            fee_oracle: FeeOracleConfig::from_env()?,
            eth_client: EthClientConfig::from_env().ok(),
            observability: ObservabilityConfig::from_env()?,
        })
    }
}
