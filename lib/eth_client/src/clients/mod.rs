//! Various fee history client implementations.

pub use self::{
    http::HttpFeeClient,
    mock::{FeeHistoryRequest, MockBlock, MockEthereum, MockEthereumBuilder},
};

mod http;
mod mock;
