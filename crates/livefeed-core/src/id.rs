//! Identity types for LiveFeed
//!
//! The subscription token is supplied by the host and never generated here.

use std::fmt;

/// Opaque token identifying a channel subscription
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        SubscriptionToken(token.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SubscriptionToken {
    fn from(value: &str) -> Self {
        SubscriptionToken::new(value)
    }
}

impl From<String> for SubscriptionToken {
    fn from(value: String) -> Self {
        SubscriptionToken(value)
    }
}

// Tokens end up in logs; only a short prefix is ever printed.
impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self)
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        if self.0.chars().count() > 4 {
            write!(f, "{}…", prefix)
        } else {
            write!(f, "{}", prefix)
        }
    }
}
