//! QuoteEngine: filter, select, sample, render.

use crate::config::QuoteConfig;
use crate::error::QuoteError;
use crate::messaging::ChatPlatform;
use crate::quote::cache::CacheRegistry;
use crate::quote::filter;
use crate::quote::render::QuoteCard;
use crate::quote::sampler;
use crate::quote::selection::{CandidateSet, ChannelSelector};
use crate::quote::types::{ChannelInfo, Message};
use crate::{GuildId, UserId};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// One `quote` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub guild_id: GuildId,
    /// Full text of the invoking message; channel mentions narrow the search.
    pub content: String,
    /// Only quote this user's messages.
    pub target_user: Option<UserId>,
}

impl QuoteRequest {
    /// Build a request, taking the first user mentioned in `content` as the target.
    pub fn new(guild_id: GuildId, content: impl Into<String>) -> Self {
        let content = content.into();
        let target_user = filter::mentioned_users(&content).first().copied();
        Self {
            guild_id,
            content,
            target_user,
        }
    }

    pub fn with_target(mut self, target_user: Option<UserId>) -> Self {
        self.target_user = target_user;
        self
    }
}

/// A recalled quote, ready to send.
#[derive(Debug, Clone)]
pub struct Quote {
    pub card: QuoteCard,
    pub message: Arc<Message>,
    pub channel: ChannelInfo,
}

/// Quote recall engine. Clones share one cache registry.
#[derive(Debug, Clone)]
pub struct QuoteEngine {
    config: Arc<QuoteConfig>,
    registry: Arc<CacheRegistry>,
}

impl QuoteEngine {
    pub fn new(config: QuoteConfig) -> Self {
        let registry = Arc::new(CacheRegistry::new(config.cache_capacity));
        Self {
            config: Arc::new(config),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<CacheRegistry> {
        &self.registry
    }

    /// Recall a quote using OS-seeded randomness.
    pub async fn recall<P: ChatPlatform>(
        &self,
        platform: &P,
        request: &QuoteRequest,
    ) -> Result<Quote, QuoteError> {
        let mut rng = StdRng::from_os_rng();
        self.recall_with_rng(platform, request, &mut rng).await
    }

    /// Recall a quote with a caller-supplied random source.
    #[tracing::instrument(
        skip_all,
        fields(guild_id = request.guild_id, target_user = ?request.target_user)
    )]
    pub async fn recall_with_rng<P: ChatPlatform, R: Rng + Send>(
        &self,
        platform: &P,
        request: &QuoteRequest,
        rng: &mut R,
    ) -> Result<Quote, QuoteError> {
        let result = self.run(platform, request, rng).await;
        match &result {
            Ok(quote) => tracing::info!(
                channel_id = quote.channel.id,
                message_id = quote.message.id,
                "quote recalled"
            ),
            Err(QuoteError::NotFound) => tracing::info!("no quote found"),
            Err(error) => tracing::warn!(%error, "quote recall failed"),
        }
        result
    }

    async fn run<P: ChatPlatform, R: Rng + Send>(
        &self,
        platform: &P,
        request: &QuoteRequest,
        rng: &mut R,
    ) -> Result<Quote, QuoteError> {
        let channels = platform
            .list_channels(request.guild_id)
            .await
            .map_err(|error| QuoteError::ChannelList {
                guild_id: request.guild_id,
                reason: error.to_string(),
            })?;

        let eligible =
            filter::eligible_channels(platform, channels, &self.config.blacklist).await?;

        let mut candidates = CandidateSet::new(eligible);
        if let Some(channel_id) = filter::mentioned_channel(&request.content, candidates.channels())
        {
            candidates.narrow_to(channel_id);
            tracing::debug!(channel_id, "search narrowed to mentioned channel");
        }

        let selector = ChannelSelector {
            platform,
            registry: &self.registry,
            prefix: &self.config.prefix,
            page_size: self.config.page_size,
        };
        let selection = selector
            .select(candidates, request.target_user, rng)
            .await?;

        let message =
            sampler::sample(&selection.pool, self.config.default_message_weight, rng)?.clone();
        let card = QuoteCard::from_message(&message, &selection.channel);

        Ok(Quote {
            card,
            message,
            channel: selection.channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_targets_first_mentioned_user() {
        let request = QuoteRequest::new(1, "!quote <@42> <@43> <#7>");
        assert_eq!(request.target_user, Some(42));
        assert_eq!(QuoteRequest::new(1, "!quote").target_user, None);
        assert_eq!(
            QuoteRequest::new(1, "!quote <@42>").with_target(None).target_user,
            None
        );
    }

    #[test]
    fn clones_share_the_registry() {
        let engine = QuoteEngine::new(QuoteConfig::default());
        let clone = engine.clone();
        assert!(Arc::ptr_eq(engine.registry(), clone.registry()));
        assert_eq!(engine.registry().capacity(), 1000);
    }
}
