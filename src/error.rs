//! Top-level error types for Quotebot.

use crate::{ChannelId, GuildId};
use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("discord error: {0}")]
    Discord(#[from] serenity::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),
}

/// Quote recall failures. Each one aborts the current invocation only.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    /// Permissions for a channel could not be determined. Never retried.
    #[error("failed to check permissions for channel {channel_id}: {reason}")]
    Permission { channel_id: ChannelId, reason: String },

    /// The guild's channel list could not be retrieved.
    #[error("failed to list channels of guild {guild_id}: {reason}")]
    ChannelList { guild_id: GuildId, reason: String },

    /// Message history could not be retrieved.
    #[error("failed to fetch messages for channel {channel_id}: {reason}")]
    Fetch { channel_id: ChannelId, reason: String },

    /// No eligible channel, or no matching message within the retry budget.
    #[error("no matching messages found")]
    NotFound,

    /// The sampler received an empty pool or a zero total weight.
    #[error("sampling pool is empty or has zero total weight")]
    EmptyPool,
}

impl QuoteError {
    /// Text shown to the user who invoked the command.
    pub fn user_message(&self) -> String {
        match self {
            QuoteError::NotFound => "Couldn't find any messages by that user".into(),
            QuoteError::Permission { .. } => self.to_string(),
            QuoteError::ChannelList { .. } | QuoteError::Fetch { .. } | QuoteError::EmptyPool => {
                "Could not retrieve messages".into()
            }
        }
    }
}
