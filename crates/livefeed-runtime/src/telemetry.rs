//! Log subscriber installation

use livefeed_core::{LiveFeedError, LiveFeedResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Output format of the installed subscriber
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber.
///
/// `filter` uses `EnvFilter` directive syntax, e.g. `"livefeed_state=debug,info"`.
/// Fails if the directives don't parse or a global subscriber is already set.
pub fn init(format: LogFormat, filter: &str) -> LiveFeedResult<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|e| LiveFeedError::InvalidConfig(format!("log filter: {}", e)))?;

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_current_span(false))),
    };

    Registry::default()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .map_err(|e| LiveFeedError::InvalidConfig(format!("log subscriber: {}", e)))
}
