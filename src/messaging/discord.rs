//! Discord messaging adapter using serenity.

use crate::commands::{CommandHandler, Invocation};
use crate::messaging::traits::{ChatPlatform, Embed};
use crate::quote::{
    Attachment, Author, ChannelInfo, ChannelKind, HistoryQuery, Message, QuoteCard, Reaction,
};
use crate::welcome::Welcomer;
use crate::{ChannelId, GuildId, MessageId};

use anyhow::Context as _;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use serenity::all as discord;
use std::sync::Arc;

/// `ChatPlatform` over serenity's HTTP client and gateway cache.
#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<discord::Http>,
    cache: Arc<discord::Cache>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<discord::Http>, cache: Arc<discord::Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &discord::Context) -> Self {
        Self::new(ctx.http.clone(), ctx.cache.clone())
    }

    fn cache_http(&self) -> (&Arc<discord::Cache>, &discord::Http) {
        (&self.cache, self.http.as_ref())
    }

    async fn guild_channel(
        &self,
        channel_id: discord::ChannelId,
    ) -> crate::Result<discord::GuildChannel> {
        let channel = channel_id
            .to_channel(self.cache_http())
            .await
            .with_context(|| format!("failed to fetch channel {channel_id}"))?;
        Ok(channel
            .guild()
            .with_context(|| format!("channel {channel_id} is not a guild channel"))?)
    }
}

impl ChatPlatform for DiscordPlatform {
    fn name(&self) -> &str {
        "discord"
    }

    async fn list_channels(&self, guild_id: GuildId) -> crate::Result<Vec<ChannelInfo>> {
        let channels = discord::GuildId::new(guild_id)
            .channels(&self.http)
            .await
            .with_context(|| format!("failed to list channels of guild {guild_id}"))?;

        let mut channels: Vec<discord::GuildChannel> = channels.into_values().collect();
        channels.sort_by_key(|channel| (channel.position, channel.id));

        Ok(channels.iter().map(channel_info).collect())
    }

    async fn can_read(&self, channel: &ChannelInfo) -> crate::Result<bool> {
        let bot_id = self.cache.current_user().id;
        let guild_channel = self
            .guild_channel(discord::ChannelId::new(channel.id))
            .await?;
        let member = guild_channel
            .guild_id
            .member(self.cache_http(), bot_id)
            .await
            .with_context(|| format!("failed to fetch bot member in channel {}", channel.id))?;

        let guild = self
            .cache
            .guild(guild_channel.guild_id)
            .with_context(|| format!("guild of channel {} is not cached", channel.id))?;
        let permissions = guild.user_permissions_in(&guild_channel, &member);

        Ok(permissions.contains(
            discord::Permissions::VIEW_CHANNEL | discord::Permissions::READ_MESSAGE_HISTORY,
        ))
    }

    async fn channel_messages(
        &self,
        channel_id: ChannelId,
        query: HistoryQuery,
    ) -> crate::Result<Vec<Message>> {
        let mut builder = discord::GetMessages::new().limit(query.limit);
        if let Some(after) = query.after {
            builder = builder.after(discord::MessageId::new(after));
        } else if let Some(before) = query.before {
            builder = builder.before(discord::MessageId::new(before));
        }

        let messages = discord::ChannelId::new(channel_id)
            .messages(self.cache_http(), builder)
            .await
            .with_context(|| format!("failed to fetch history of channel {channel_id}"))?;

        Ok(messages.iter().map(convert_message).collect())
    }

    async fn system_channel(&self, guild_id: GuildId) -> crate::Result<Option<ChannelId>> {
        let guild_id = discord::GuildId::new(guild_id);
        let cached = self
            .cache
            .guild(guild_id)
            .map(|guild| guild.system_channel_id);
        let system_channel_id = match cached {
            Some(channel_id) => channel_id,
            None => {
                guild_id
                    .to_partial_guild(&self.http)
                    .await
                    .with_context(|| format!("failed to fetch guild {guild_id}"))?
                    .system_channel_id
            }
        };
        Ok(system_channel_id.map(|channel_id| channel_id.get()))
    }

    async fn send_message(&self, channel_id: ChannelId, text: &str) -> crate::Result<()> {
        discord::ChannelId::new(channel_id)
            .say(self.cache_http(), text)
            .await
            .context("failed to send discord message")?;
        Ok(())
    }

    async fn send_quote(&self, channel_id: ChannelId, card: &QuoteCard) -> crate::Result<()> {
        let mut author = discord::CreateEmbedAuthor::new(&card.author_name);
        if let Some(icon) = &card.author_icon {
            author = author.icon_url(icon);
        }

        let mut embed = discord::CreateEmbed::new()
            .author(author)
            .title(&card.title)
            .description(&card.description);
        if let Some(image) = &card.image {
            embed = embed.image(image);
        }

        discord::ChannelId::new(channel_id)
            .send_message(self.cache_http(), discord::CreateMessage::new().embed(embed))
            .await
            .context("failed to send discord quote embed")?;
        Ok(())
    }

    async fn send_embed(&self, channel_id: ChannelId, embed: &Embed) -> crate::Result<()> {
        let embed = discord::CreateEmbed::new()
            .title(&embed.title)
            .description(&embed.description);

        discord::ChannelId::new(channel_id)
            .send_message(self.cache_http(), discord::CreateMessage::new().embed(embed))
            .await
            .context("failed to send discord embed")?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> crate::Result<()> {
        let reaction = discord::ReactionType::Unicode(emoji.to_string());
        self.http
            .create_reaction(
                discord::ChannelId::new(channel_id),
                discord::MessageId::new(message_id),
                &reaction,
            )
            .await
            .context("failed to add discord reaction")?;
        Ok(())
    }
}

fn channel_info(channel: &discord::GuildChannel) -> ChannelInfo {
    let kind = match channel.kind {
        discord::ChannelType::Text => ChannelKind::Text,
        discord::ChannelType::Voice | discord::ChannelType::Stage => ChannelKind::Voice,
        discord::ChannelType::Category => ChannelKind::Category,
        _ => ChannelKind::Other,
    };
    ChannelInfo {
        id: channel.id.get(),
        name: channel.name.clone(),
        kind,
    }
}

fn convert_author(user: &discord::User) -> Author {
    Author {
        id: user.id.get(),
        name: user.name.clone(),
        avatar_url: user.avatar_url(),
    }
}

fn convert_message(message: &discord::Message) -> Message {
    Message {
        id: message.id.get(),
        author: convert_author(&message.author),
        content: message.content.clone(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| Attachment {
                url: attachment.url.clone(),
                filename: attachment.filename.clone(),
                content_type: attachment.content_type.clone(),
                width: attachment.width,
            })
            .collect(),
        reactions: message
            .reactions
            .iter()
            .map(|reaction| Reaction {
                emoji: reaction.reaction_type.to_string(),
                count: reaction.count,
            })
            .collect(),
        mentions: message.mentions.iter().map(convert_author).collect(),
        timestamp: chrono::DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
    }
}

/// Gateway event handler: turns inbound messages into command invocations
/// and member joins into welcome posts.
struct Handler {
    commands: CommandHandler,
    welcomer: Welcomer,
}

#[async_trait::async_trait]
impl discord::EventHandler for Handler {
    async fn ready(&self, _ctx: discord::Context, ready: discord::Ready) {
        tracing::info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord connected"
        );
    }

    async fn guild_member_addition(&self, ctx: discord::Context, member: discord::Member) {
        if member.user.bot {
            return;
        }

        let guild_id = member.guild_id.get();
        let user_id = member.user.id.get();
        let platform = DiscordPlatform::from_context(&ctx);
        let mut rng = StdRng::from_os_rng();
        if let Err(error) = self
            .welcomer
            .greet(&platform, guild_id, user_id, &mut rng)
            .await
        {
            tracing::error!(%error, guild_id, user_id, "failed to welcome new member");
        }
    }

    async fn message(&self, ctx: discord::Context, message: discord::Message) {
        if message.author.bot {
            return;
        }

        let invocation = Invocation {
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
            content: message.content.clone(),
            mentions: message.mentions.iter().map(|user| user.id.get()).collect(),
        };

        let platform = DiscordPlatform::from_context(&ctx);
        if let Err(error) = self.commands.handle(&platform, &invocation).await {
            tracing::error!(
                %error,
                channel_id = invocation.channel_id,
                "failed to handle discord command"
            );
        }
    }
}

/// Discord gateway connection.
pub struct DiscordAdapter {
    token: String,
    commands: CommandHandler,
    welcomer: Welcomer,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>, commands: CommandHandler, welcomer: Welcomer) -> Self {
        Self {
            token: token.into(),
            commands,
            welcomer,
        }
    }

    /// Connect and process events until the gateway closes or Ctrl-C.
    pub async fn run(self) -> crate::Result<()> {
        let intents = discord::GatewayIntents::GUILDS
            | discord::GatewayIntents::GUILD_MEMBERS
            | discord::GatewayIntents::GUILD_MESSAGES
            | discord::GatewayIntents::MESSAGE_CONTENT;

        let mut client = discord::Client::builder(&self.token, intents)
            .event_handler(Handler {
                commands: self.commands,
                welcomer: self.welcomer,
            })
            .await?;

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shard_manager.shutdown_all().await;
            }
        });

        client.start().await?;
        tracing::info!("discord adapter shut down");
        Ok(())
    }
}
