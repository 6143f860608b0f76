use std::{backtrace::Backtrace, io, panic::PanicHookInfo, str::FromStr};

use tracing_subscriber::{fmt, registry::LookupSpan, EnvFilter, Layer};

/// Default directives applied when neither config nor `RUST_LOG` specify any.
const DEFAULT_LOG_DIRECTIVES: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported log format `{0}`; expected `plain` or `json`")]
pub struct LogFormatError(String);

impl FromStr for LogFormat {
    type Err = LogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(LogFormatError(s.to_owned())),
        }
    }
}

/// Logs layer configuration. Logs are always written to stderr, leaving stdout to command output.
#[derive(Debug, Clone, Default)]
pub struct Logs {
    format: LogFormat,
    log_directives: Option<String>,
}

impl From<LogFormat> for Logs {
    fn from(format: LogFormat) -> Self {
        Self {
            format,
            log_directives: None,
        }
    }
}

impl Logs {
    pub fn new(format: &str) -> Result<Self, LogFormatError> {
        Ok(Self::from(format.parse::<LogFormat>()?))
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn with_log_directives(mut self, log_directives: Option<String>) -> Self {
        self.log_directives = log_directives;
        self
    }

    pub(crate) fn build_filter(&self) -> EnvFilter {
        let directives = self
            .log_directives
            .clone()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
            .unwrap_or_else(|| DEFAULT_LOG_DIRECTIVES.to_owned());
        EnvFilter::builder().parse_lossy(directives)
    }

    pub(crate) fn install_panic_hook(&self) {
        // Plain logs are readable as is; JSON consumers need panics as structured records.
        if self.format == LogFormat::Json {
            std::panic::set_hook(Box::new(json_panic_handler));
        }
    }

    pub(crate) fn into_layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        match self.format {
            LogFormat::Plain => fmt::layer().with_writer(io::stderr).boxed(),
            LogFormat::Json => {
                let timer = fmt::time::UtcTime::rfc_3339();
                fmt::layer()
                    .json()
                    .with_timer(timer)
                    .flatten_event(true)
                    .with_writer(io::stderr)
                    .boxed()
            }
        }
    }
}

fn json_panic_handler(panic_info: &PanicHookInfo<'_>) {
    let backtrace = Backtrace::force_capture();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default();
    let message = panic_info
        .payload()
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string panic payload>".to_owned());
    let location = panic_info
        .location()
        .map(|location| location.to_string())
        .unwrap_or_default();
    let record = serde_json::json!({
        "timestamp": timestamp,
        "level": "CRITICAL",
        "fields": {
            "message": message,
            "location": location,
            "backtrace": backtrace.to_string(),
        },
    });
    eprintln!("{record}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_log_format() {
        assert_eq!("plain".parse::<LogFormat>().unwrap(), LogFormat::Plain);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        let err = "yaml".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("`yaml`"), "{err}");
    }

    #[test]
    fn explicit_directives_take_precedence() {
        let logs = Logs::new("json")
            .unwrap()
            .with_log_directives(Some("fee_oracle=debug".into()));
        assert_eq!(logs.format(), LogFormat::Json);
        assert_eq!(logs.build_filter().to_string(), "fee_oracle=debug");
    }
}
