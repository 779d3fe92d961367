//! In-process chat platform backed by plain collections.
//!
//! Holds guild channels and per-channel history in memory and records every
//! history request and outbound message. Used for dry runs and tests of the
//! quote engine without a gateway connection.

use crate::messaging::traits::{ChatPlatform, Embed};
use crate::quote::{ChannelInfo, HistoryQuery, Message, QuoteCard};
use crate::{ChannelId, GuildId, MessageId};

use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Something the bot sent through the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text {
        channel_id: ChannelId,
        text: String,
    },
    Quote {
        channel_id: ChannelId,
        card: QuoteCard,
    },
    Embed {
        channel_id: ChannelId,
        embed: Embed,
    },
    Reaction {
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: String,
    },
}

/// In-memory platform state.
#[derive(Default)]
pub struct InMemoryPlatform {
    guilds: RwLock<HashMap<GuildId, Vec<ChannelInfo>>>,
    histories: RwLock<HashMap<ChannelId, Vec<Message>>>,
    unreadable: RwLock<HashSet<ChannelId>>,
    broken_permissions: RwLock<HashSet<ChannelId>>,
    broken_history: RwLock<HashSet<ChannelId>>,
    broken_guilds: RwLock<HashSet<GuildId>>,
    system_channels: RwLock<HashMap<GuildId, ChannelId>>,
    fetches: RwLock<Vec<(ChannelId, HistoryQuery)>>,
    outbox: RwLock<Vec<Outbound>>,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel to a guild's listing.
    pub async fn add_channel(&self, guild_id: GuildId, channel: ChannelInfo) {
        self.guilds
            .write()
            .await
            .entry(guild_id)
            .or_default()
            .push(channel);
    }

    /// Append a message to a channel's history.
    pub async fn push_message(&self, channel_id: ChannelId, message: Message) {
        self.histories
            .write()
            .await
            .entry(channel_id)
            .or_default()
            .push(message);
    }

    /// Toggle the bot's read permission on a channel.
    pub async fn set_readable(&self, channel_id: ChannelId, readable: bool) {
        let mut unreadable = self.unreadable.write().await;
        if readable {
            unreadable.remove(&channel_id);
        } else {
            unreadable.insert(channel_id);
        }
    }

    /// Make permission lookups for a channel fail.
    pub async fn break_permissions(&self, channel_id: ChannelId) {
        self.broken_permissions.write().await.insert(channel_id);
    }

    /// Make history requests for a channel fail (or succeed again).
    pub async fn set_history_broken(&self, channel_id: ChannelId, broken: bool) {
        let mut broken_history = self.broken_history.write().await;
        if broken {
            broken_history.insert(channel_id);
        } else {
            broken_history.remove(&channel_id);
        }
    }

    /// Make channel listing for a guild fail.
    pub async fn break_guild(&self, guild_id: GuildId) {
        self.broken_guilds.write().await.insert(guild_id);
    }

    /// Set the channel a guild posts join notices to.
    pub async fn set_system_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.system_channels.write().await.insert(guild_id, channel_id);
    }

    /// Every history request served so far, in order.
    pub async fn fetches(&self) -> Vec<(ChannelId, HistoryQuery)> {
        self.fetches.read().await.clone()
    }

    /// History requests served for one channel.
    pub async fn fetch_count(&self, channel_id: ChannelId) -> usize {
        self.fetches
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id == channel_id)
            .count()
    }

    /// Everything sent so far, in order.
    pub async fn outbox(&self) -> Vec<Outbound> {
        self.outbox.read().await.clone()
    }
}

impl ChatPlatform for InMemoryPlatform {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_channels(&self, guild_id: GuildId) -> crate::Result<Vec<ChannelInfo>> {
        if self.broken_guilds.read().await.contains(&guild_id) {
            return Err(anyhow::anyhow!("guild {guild_id} is unavailable").into());
        }
        Ok(self
            .guilds
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn can_read(&self, channel: &ChannelInfo) -> crate::Result<bool> {
        if self.broken_permissions.read().await.contains(&channel.id) {
            return Err(anyhow::anyhow!("permissions unavailable for {}", channel.id).into());
        }
        Ok(!self.unreadable.read().await.contains(&channel.id))
    }

    async fn channel_messages(
        &self,
        channel_id: ChannelId,
        query: HistoryQuery,
    ) -> crate::Result<Vec<Message>> {
        self.fetches.write().await.push((channel_id, query));

        if self.broken_history.read().await.contains(&channel_id) {
            return Err(anyhow::anyhow!("history unavailable for {channel_id}").into());
        }

        let histories = self.histories.read().await;
        let mut page: Vec<Message> = histories
            .get(&channel_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|message| query.after.is_none_or(|after| message.id > after))
                    .filter(|message| query.before.is_none_or(|before| message.id < before))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let limit = usize::from(query.limit);
        if query.after.is_some() {
            // Pages after a cursor start right after it.
            page.sort_by_key(|message| message.id);
            page.truncate(limit);
            page.reverse();
        } else {
            page.sort_by_key(|message| std::cmp::Reverse(message.id));
            page.truncate(limit);
        }

        Ok(page)
    }

    async fn system_channel(&self, guild_id: GuildId) -> crate::Result<Option<ChannelId>> {
        if self.broken_guilds.read().await.contains(&guild_id) {
            return Err(anyhow::anyhow!("guild {guild_id} is unavailable").into());
        }
        Ok(self.system_channels.read().await.get(&guild_id).copied())
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> crate::Result<()> {
        self.outbox.write().await.push(Outbound::Text {
            channel_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_quote(&self, channel_id: ChannelId, card: &QuoteCard) -> crate::Result<()> {
        self.outbox.write().await.push(Outbound::Quote {
            channel_id,
            card: card.clone(),
        });
        Ok(())
    }

    async fn send_embed(&self, channel_id: ChannelId, embed: &Embed) -> crate::Result<()> {
        self.outbox.write().await.push(Outbound::Embed {
            channel_id,
            embed: embed.clone(),
        });
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> crate::Result<()> {
        self.outbox.write().await.push(Outbound::Reaction {
            channel_id,
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }
}
