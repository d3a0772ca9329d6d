//! Logging setup for the shell.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HEADLESS_FILTER: &str = "info,fishtank_world=debug";
const PAINTING_FILTER: &str = "warn";

/// Filter used when `RUST_LOG` is unset. Logs share the terminal with the
/// painted tank, so only warnings get through while painting.
pub fn default_filter(headless: bool) -> &'static str {
    if headless {
        HEADLESS_FILTER
    } else {
        PAINTING_FILTER
    }
}

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with frames painted on stdout.
pub fn init_telemetry(json: bool, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(headless)));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}
