//! Prefix command parsing and dispatch.

use crate::error::{QuoteError, Result};
use crate::messaging::{ChatPlatform, Embed};
use crate::quote::{QuoteEngine, QuoteRequest};
use crate::{ChannelId, GuildId, MessageId, UserId};

/// Title of the `help` embed.
const HELP_TITLE: &str = "Quotebot Commands";

/// Reaction added to a `quote` invocation that failed for a reason other
/// than finding nothing.
const FAILURE_REACTION: &str = "⚠️";

/// Commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Help,
    Quote,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Ping, Command::Help, Command::Quote];

    pub fn name(self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Help => "help",
            Command::Quote => "quote",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::Ping => "Check that the bot is alive",
            Command::Help => "List the available commands",
            Command::Quote => {
                "Quote a random message. Mention a user to quote them, mention a channel to only search there"
            }
        }
    }

    /// Parse `content` as a command. The prefix must come first and the
    /// command word ends at the first whitespace.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        let word = rest.split_whitespace().next()?;
        if !rest.starts_with(word) {
            return None;
        }
        Self::ALL.into_iter().find(|command| command.name() == word)
    }
}

/// An inbound message that might be a command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub content: String,
    /// Users the platform reports as mentioned, in order.
    pub mentions: Vec<UserId>,
}

/// Dispatches commands to their handlers.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    prefix: String,
    guild_id: GuildId,
    engine: QuoteEngine,
}

impl CommandHandler {
    /// `guild_id` is the guild `quote` samples from.
    pub fn new(prefix: impl Into<String>, guild_id: GuildId, engine: QuoteEngine) -> Self {
        Self {
            prefix: prefix.into(),
            guild_id,
            engine,
        }
    }

    /// Handle a message. Returns the command that ran, if any.
    pub async fn handle<P: ChatPlatform>(
        &self,
        platform: &P,
        invocation: &Invocation,
    ) -> Result<Option<Command>> {
        let Some(command) = Command::parse(&self.prefix, &invocation.content) else {
            return Ok(None);
        };

        tracing::debug!(
            command = command.name(),
            channel_id = invocation.channel_id,
            platform = platform.name(),
            "handling command"
        );

        match command {
            Command::Ping => {
                platform.send_message(invocation.channel_id, "pong").await?;
            }
            Command::Help => {
                platform
                    .send_embed(invocation.channel_id, &self.help_embed())
                    .await?;
            }
            Command::Quote => self.quote(platform, invocation).await?,
        }

        Ok(Some(command))
    }

    pub fn help_embed(&self) -> Embed {
        let mut description = String::new();
        for command in Command::ALL {
            description.push_str(&format!(
                "**`{}{}`**: {}\n",
                self.prefix,
                command.name(),
                command.description()
            ));
        }
        Embed {
            title: HELP_TITLE.into(),
            description,
        }
    }

    async fn quote<P: ChatPlatform>(&self, platform: &P, invocation: &Invocation) -> Result<()> {
        let request = QuoteRequest::new(self.guild_id, invocation.content.clone());
        let target = invocation.mentions.first().copied().or(request.target_user);
        let request = request.with_target(target);

        match self.engine.recall(platform, &request).await {
            Ok(quote) => {
                platform
                    .send_quote(invocation.channel_id, &quote.card)
                    .await?;
            }
            Err(error) => {
                platform
                    .send_message(invocation.channel_id, &error.user_message())
                    .await?;
                if !matches!(error, QuoteError::NotFound) {
                    platform
                        .add_reaction(
                            invocation.channel_id,
                            invocation.message_id,
                            FAILURE_REACTION,
                        )
                        .await?;
                }
            }
        }

        Ok(())
    }
}
