//! Channel patterns used by handler registrations.
//!
//! `"*"` matches every channel, `"repair:*"` matches by prefix, anything else
//! must match exactly.

use std::fmt;

use shared_types::Channel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPattern {
    Any,
    Prefix(String),
    Exact(Channel),
}

impl ChannelPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some("") => Self::Any,
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(Channel::new(pattern)),
        }
    }

    pub fn matches(&self, channel: &Channel) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => channel.as_str().starts_with(prefix.as_str()),
            Self::Exact(exact) => exact == channel,
        }
    }
}

impl From<&str> for ChannelPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

impl From<Channel> for ChannelPattern {
    fn from(channel: Channel) -> Self {
        Self::Exact(channel)
    }
}

impl fmt::Display for ChannelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Exact(channel) => write!(f, "{channel}"),
        }
    }
}
