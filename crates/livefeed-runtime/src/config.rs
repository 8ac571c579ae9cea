//! LiveFeed configuration

use std::time::Duration;

use livefeed_core::{LiveFeedError, LiveFeedResult, SubscriptionToken};
use serde::{Deserialize, Serialize};

use crate::LogFormat;

/// Feed configuration, injected at construction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveFeedConfig {
    /// Subscription token handed to the channel
    pub token: String,
    /// Bounded queue between the channel and the worker
    pub channel_capacity: usize,
    /// Maximum age of retained latency samples
    #[serde(with = "millis")]
    pub latency_window: Duration,
    /// Maximum number of retained diagnostics
    pub max_diagnostics: usize,
    pub log_format: LogFormat,
    pub log_filter: String,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        LiveFeedConfig {
            token: String::new(),
            channel_capacity: 255,
            latency_window: Duration::from_secs(5 * 60),
            max_diagnostics: 20,
            log_format: LogFormat::Pretty,
            log_filter: "info".to_owned(),
        }
    }
}

impl LiveFeedConfig {
    pub fn new(token: impl Into<String>) -> Self {
        LiveFeedConfig {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> LiveFeedResult<Self> {
        let config: LiveFeedConfig =
            serde_json::from_str(json).map_err(|e| LiveFeedError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LiveFeedResult<()> {
        if self.token.is_empty() {
            return Err(LiveFeedError::InvalidConfig("token is empty".into()));
        }
        if self.channel_capacity == 0 {
            return Err(LiveFeedError::InvalidConfig(
                "channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn token(&self) -> SubscriptionToken {
        SubscriptionToken::new(self.token.clone())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
