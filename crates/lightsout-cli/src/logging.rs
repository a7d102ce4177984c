//! Structured logging for the CLI.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` wins over the level stored in the config file.

use lightsout_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "lightsout=info,lightsout_core=info";

pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn configured_filter() -> EnvFilter {
    let level = Config::load_or_default().logging.level;
    EnvFilter::try_new(format!("lightsout={level},lightsout_core={level}"))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
