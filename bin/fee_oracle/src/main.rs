use std::{io, path::PathBuf, str::FromStr};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use fee_oracle_config::{ConfigSources, EthClientConfig};
use fee_oracle_eth_client::{clients::HttpFeeClient, BlockNumber, EthFeeInterface, U64};
use fee_oracle_estimator::{Calibrator, FeeOracle};
use fee_oracle_vlog::{Logs, ObservabilityBuilder};
use url::Url;

mod output;

/// Number of blocks calibrated if the range is not specified.
const DEFAULT_CALIBRATION_BLOCKS: u64 = 100;

/// Block to build suggestions at: `latest`, `pending`, `earliest`, `safe`, `finalized`,
/// or a block number (decimal or `0x`-prefixed hex).
#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockArg(BlockNumber);

impl FromStr for BlockArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(match s {
            "latest" => BlockNumber::Latest,
            "pending" => BlockNumber::Pending,
            "earliest" => BlockNumber::Earliest,
            "safe" => BlockNumber::Safe,
            "finalized" => BlockNumber::Finalized,
            _ => {
                let number = if let Some(hex) = s.strip_prefix("0x") {
                    u64::from_str_radix(hex, 16)
                } else {
                    s.parse()
                };
                let number = number.with_context(|| format!("invalid block `{s}`"))?;
                BlockNumber::Number(U64::from(number))
            }
        }))
    }
}

#[derive(Debug, Parser)]
#[command(
    author = "The Fee Oracle Team",
    version,
    about = "Suggests EIP-1559 fees based on the recent fee history",
    long_about = None
)]
struct Cli {
    /// Path to the YAML config. If not specified, the config is loaded from env variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// URL of the Ethereum node JSON-RPC API; overrides the URL from the config.
    #[arg(long, global = true)]
    rpc_url: Option<Url>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Suggests fees for all time factors.
    Suggest {
        /// Newest block of the fee history used for suggestions.
        #[arg(long, default_value = "latest")]
        block: BlockArg,
        /// Outputs the fee curve as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Replays suggestions for historical blocks and measures how often they would be included.
    Calibrate {
        /// First block to replay suggestions at.
        #[arg(long, conflicts_with = "last")]
        from: Option<u64>,
        /// Last block to replay suggestions at. By default, it's the latest block with realized history
        /// for all time factors.
        #[arg(long)]
        to: Option<u64>,
        /// Number of blocks to replay suggestions at, ending with `--to`.
        #[arg(long)]
        last: Option<u64>,
        /// Outputs the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ConfigSources> {
        let mut sources = if let Some(path) = &self.config {
            ConfigSources::from_yaml_file(path)?
        } else {
            ConfigSources::from_env().context("failed loading config from env")?
        };
        if let Some(url) = &self.rpc_url {
            match &mut sources.eth_client {
                Some(eth_client) => eth_client.web3_url = url.clone(),
                None => sources.eth_client = Some(EthClientConfig::new(url.clone())),
            }
        }
        Ok(sources)
    }

    async fn run(self, sources: ConfigSources) -> anyhow::Result<()> {
        let eth_client = sources
            .eth_client
            .context("no Ethereum node URL; use `--rpc-url` or the `eth_client` config")?;
        tracing::info!("Using Ethereum node at {}", eth_client.web3_url);
        let client = HttpFeeClient::new(&eth_client)?;
        let oracle = FeeOracle::new(Box::new(client.clone()), sources.fee_oracle)?;

        let mut stdout = io::stdout().lock();
        match self.command {
            Command::Suggest { block, json } => {
                let curve = oracle.suggest_fees(block.0).await?;
                if json {
                    output::write_json(&mut stdout, &curve)?;
                } else {
                    output::write_curve(&mut stdout, &curve)?;
                }
            }
            Command::Calibrate {
                from,
                to,
                last,
                json,
            } => {
                let head = client
                    .for_component("calibration")
                    .block_number()
                    .await
                    .context("failed getting head block")?
                    .as_u64();
                let max_time_factor = oracle.config().max_time_factor;
                let (from, to) = calibration_range(head, max_time_factor, from, to, last)?;
                tracing::info!("Calibrating on blocks {from}..={to}");

                let report = Calibrator::new(&oracle).calibrate(from..=to).await?;
                if json {
                    output::write_json(&mut stdout, &report)?;
                } else {
                    output::write_report(&mut stdout, &report)?;
                }
            }
        }
        Ok(())
    }
}

/// Determines the range of blocks to calibrate on.
fn calibration_range(
    head: u64,
    max_time_factor: u32,
    from: Option<u64>,
    to: Option<u64>,
    last: Option<u64>,
) -> anyhow::Result<(u64, u64)> {
    let to = to.unwrap_or_else(|| head.saturating_sub(max_time_factor.into()));
    let from = match (from, last) {
        (Some(from), _) => from,
        (None, Some(0)) => anyhow::bail!("`--last` must be positive"),
        (None, last) => to.saturating_sub(last.unwrap_or(DEFAULT_CALIBRATION_BLOCKS) - 1),
    };
    anyhow::ensure!(from <= to, "invalid calibration range {from}..={to}");
    Ok((from, to))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sources = cli.load_config()?;

    let observability = &sources.observability;
    let logs = Logs::new(&observability.log_format)?
        .with_log_directives(observability.log_directives.clone());
    ObservabilityBuilder::new()
        .with_logs(Some(logs))
        .try_build()?;

    cli.run(sources).await
}
