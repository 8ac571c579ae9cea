//! Channel status tags
//!
//! Every inbound channel callback carries one of these. Only `Message`
//! reaches the ordering filter; the rest are observational.

use std::fmt;

/// Status tag of a channel event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelStatus {
    Open,
    Message,
    Error,
    Close,
}

impl ChannelStatus {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "open" => Some(ChannelStatus::Open),
            "message" => Some(ChannelStatus::Message),
            "error" => Some(ChannelStatus::Error),
            "close" => Some(ChannelStatus::Close),
            _ => None,
        }
    }

    #[inline]
    pub fn as_tag(self) -> &'static str {
        match self {
            ChannelStatus::Open => "open",
            ChannelStatus::Message => "message",
            ChannelStatus::Error => "error",
            ChannelStatus::Close => "close",
        }
    }

    /// Does this status carry an update message?
    #[inline]
    pub fn is_message(self) -> bool {
        matches!(self, ChannelStatus::Message)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags() {
        for status in [
            ChannelStatus::Open,
            ChannelStatus::Message,
            ChannelStatus::Error,
            ChannelStatus::Close,
        ] {
            assert_eq!(ChannelStatus::from_tag(status.as_tag()), Some(status));
        }
        assert_eq!(ChannelStatus::from_tag("MESSAGE"), None);
        assert!(ChannelStatus::Message.is_message());
        assert!(!ChannelStatus::Error.is_message());
    }
}
