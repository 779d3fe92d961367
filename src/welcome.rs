//! Welcome post for members joining the public server.

use crate::error::Result;
use crate::messaging::{ChatPlatform, Embed};
use crate::{GuildId, UserId};

use rand::Rng;
use rand::seq::IndexedRandom as _;

/// Title of every welcome embed.
pub const WELCOME_TITLE: &str = "Welcome!";

/// Placeholder replaced by the new member's mention.
pub const USER_PLACEHOLDER: &str = "{user}";

/// Greets new members of one guild with a randomly chosen template.
#[derive(Debug, Clone)]
pub struct Welcomer {
    guild_id: GuildId,
    templates: Vec<String>,
}

impl Welcomer {
    pub fn new(guild_id: GuildId, templates: Vec<String>) -> Self {
        Self {
            guild_id,
            templates,
        }
    }

    /// Render a template for `user_id`.
    pub fn render(template: &str, user_id: UserId) -> String {
        template.replace(USER_PLACEHOLDER, &format!("<@{user_id}>"))
    }

    /// Post a welcome for `user_id` joining `guild_id`. Returns whether
    /// anything was sent.
    pub async fn greet<P: ChatPlatform, R: Rng + Send>(
        &self,
        platform: &P,
        guild_id: GuildId,
        user_id: UserId,
        rng: &mut R,
    ) -> Result<bool> {
        if guild_id != self.guild_id {
            return Ok(false);
        }
        let Some(template) = self.templates.choose(rng) else {
            return Ok(false);
        };

        let Some(channel_id) = platform.system_channel(guild_id).await? else {
            tracing::debug!(guild_id, "guild has no system channel, skipping welcome");
            return Ok(false);
        };

        let embed = Embed {
            title: WELCOME_TITLE.into(),
            description: Self::render(template, user_id),
        };
        platform.send_embed(channel_id, &embed).await?;

        tracing::info!(guild_id, user_id, channel_id, "welcomed new member");
        Ok(true)
    }
}
