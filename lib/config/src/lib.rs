#![allow(clippy::upper_case_acronyms, clippy::derive_partial_eq_without_eq)]

pub use crate::{
    configs::{EthClientConfig, FeeOracleConfig, ObservabilityConfig},
    env::FromEnv,
    sources::ConfigSources,
};

pub mod configs;
pub mod env;
mod sources;
