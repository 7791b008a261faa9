//! Log subscriber setup for the command line tool
//!
//! Events go to stderr so stdout carries only command output.

use crate::{Error, Result};
use std::io::{self, IsTerminal as _};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the filter directives
pub const ENV_NAME: &str = "ZKONACCI_LOG";

/// Parse a filter from `directives`, or from [`ENV_NAME`] when `None`.
///
/// Directives that name no level fall back to `default`.
pub fn env_filter(directives: Option<&str>, default: LevelFilter) -> Result<EnvFilter> {
    let builder = EnvFilter::builder().with_default_directive(default.into());
    let directives = match directives {
        Some(directives) => directives.to_string(),
        None => match std::env::var(ENV_NAME) {
            Ok(env) => env,
            Err(std::env::VarError::NotPresent) => String::new(),
            Err(std::env::VarError::NotUnicode(_)) => {
                return Err(Error::Config(format!("{} is not unicode", ENV_NAME)))
            }
        },
    };
    builder
        .parse(&directives)
        .map_err(|e| Error::Config(format!("invalid {} {:?}: {}", ENV_NAME, directives, e)))
}

/// Install the global subscriber.
///
/// `verbose` raises the default level from info to debug.
pub fn init(verbose: bool) -> Result<()> {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let format = fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter(None, default)?)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .event_format(format)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set log subscriber: {}", e)))
}
