//! Chat platform trait consumed by the quote engine and command handlers.

use crate::error::Result;
use crate::quote::{ChannelInfo, HistoryQuery, Message, QuoteCard};
use crate::{ChannelId, GuildId, MessageId};

/// A titled rich message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
}

/// Operations the bot needs from a chat platform.
///
/// Read operations feed the quote engine; the send operations are used by
/// command handlers to deliver results.
pub trait ChatPlatform: Send + Sync + 'static {
    /// Unique name for this platform.
    fn name(&self) -> &str;

    /// List every channel in a guild.
    fn list_channels(
        &self,
        guild_id: GuildId,
    ) -> impl std::future::Future<Output = Result<Vec<ChannelInfo>>> + Send;

    /// Whether the bot's own identity may read `channel`.
    fn can_read(
        &self,
        channel: &ChannelInfo,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Fetch one page of channel history. Order of the returned page is
    /// unspecified.
    fn channel_messages(
        &self,
        channel_id: ChannelId,
        query: HistoryQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Message>>> + Send;

    /// Channel where the guild posts join notices, if it has one.
    fn system_channel(
        &self,
        guild_id: GuildId,
    ) -> impl std::future::Future<Output = Result<Option<ChannelId>>> + Send;

    /// Send a plain text message.
    fn send_message(
        &self,
        channel_id: ChannelId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send a rendered quote as a rich embed.
    fn send_quote(
        &self,
        channel_id: ChannelId,
        card: &QuoteCard,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send a titled embed.
    fn send_embed(
        &self,
        channel_id: ChannelId,
        embed: &Embed,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Add a unicode reaction to a message.
    fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
