pub use self::{
    eth_client::EthClientConfig, fee_oracle::FeeOracleConfig, observability::ObservabilityConfig,
};

pub mod eth_client;
pub mod fee_oracle;
pub mod observability;
