//! Diagnostic logging for the helper programs.
//!
//! Logs always go to stderr; stdout carries the program's answer and must stay
//! clean. Nothing is logged unless `EINFO_LOG` asks for it.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `EINFO_LOG` | `EnvFilter` directives, e.g. `debug` or `einfo_core=trace` (default `off`) |
//! | `EINFO_LOG_FORMAT` | `json` for one JSON object per line |

use std::env;
use std::io;

use tracing_subscriber::EnvFilter;

/// Filter variable.
pub const LOG_ENV: &str = "EINFO_LOG";

/// Format variable.
pub const LOG_FORMAT_ENV: &str = "EINFO_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber from the environment.
///
/// Returns `false` if a subscriber was already installed.
pub fn init() -> bool {
    let directives = env::var(LOG_ENV).unwrap_or_else(|_| "off".to_owned());
    let format = LogFormat::from_env_value(env::var(LOG_FORMAT_ENV).ok().as_deref());
    init_with(&directives, format)
}

/// Install the global subscriber with explicit settings.
///
/// Invalid directives fall back to `off`.
pub fn init_with(directives: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("off"));
    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.with_ansi(false).try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
