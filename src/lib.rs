//! Quotebot: a community chat bot whose core recalls reaction-weighted quotes
//! from a guild's message history.

pub mod commands;
pub mod config;
pub mod error;
pub mod messaging;
pub mod quote;
pub mod welcome;

pub use error::{Error, Result};

/// Message identifier (Discord snowflake, increases with creation time).
pub type MessageId = u64;

/// Channel identifier type.
pub type ChannelId = u64;

/// User identifier type.
pub type UserId = u64;

/// Guild identifier type.
pub type GuildId = u64;
