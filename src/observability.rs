//! Logging setup for the command-line tool.

use std::str::FromStr;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Set to `json` for JSON log lines when `--log-format` is not given.
pub const LOG_FORMAT_ENV: &str = "JSONAPI_PARAMS_LOG_FORMAT";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Shape of log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Read `JSONAPI_PARAMS_LOG_FORMAT`, falling back to compact output for
    /// unset or unknown values.
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else if s.eq_ignore_ascii_case("compact") || s.eq_ignore_ascii_case("text") {
            Ok(LogFormat::Compact)
        } else {
            Err(format!("unknown log format \"{s}\": expected compact or json"))
        }
    }
}

/// Install the stderr subscriber once for the process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Later calls are
/// ignored, whatever their format.
pub fn init_tracing(format: LogFormat) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let registry = tracing_subscriber::registry().with(filter);

        let result = match format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init(),
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}
