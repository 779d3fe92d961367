//! Channel selection loop: random channel picks with bounded backoff.

use crate::error::QuoteError;
use crate::messaging::ChatPlatform;
use crate::quote::cache::CacheRegistry;
use crate::quote::types::{ChannelInfo, Message};
use crate::{ChannelId, UserId};

use rand::Rng;
use std::sync::Arc;

/// Channels still worth trying during one recall.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    channels: Vec<ChannelInfo>,
    eligible_count: usize,
}

impl CandidateSet {
    pub fn new(channels: Vec<ChannelInfo>) -> Self {
        let eligible_count = channels.len();
        Self {
            channels,
            eligible_count,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Channels that can be abandoned for lacking the target's messages
    /// before giving up: half the eligible count, at least one.
    ///
    /// Based on the count before any narrowing.
    pub fn retry_budget(&self) -> usize {
        (self.eligible_count / 2).max(1)
    }

    /// Most history fetches one recall may issue: the retry budget plus
    /// two fetches for channels that turn out to hold no messages at all.
    pub fn fetch_limit(&self) -> usize {
        self.retry_budget() + 2
    }

    /// Uniformly random index, `None` once drained.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }
        Some(rng.random_range(0..self.channels.len()))
    }

    pub fn get(&self, index: usize) -> Option<&ChannelInfo> {
        self.channels.get(index)
    }

    /// Drop a channel so it is not picked again. Order is not preserved.
    pub fn remove(&mut self, index: usize) -> ChannelInfo {
        self.channels.swap_remove(index)
    }

    /// Keep only `channel_id`. Returns false, leaving the set unchanged, if
    /// it is not a candidate.
    pub fn narrow_to(&mut self, channel_id: ChannelId) -> bool {
        let Some(index) = self.channels.iter().position(|c| c.id == channel_id) else {
            return false;
        };
        let channel = self.channels.swap_remove(index);
        self.channels = vec![channel];
        true
    }
}

/// The channel a pool was drawn from, and the pool itself (never empty).
#[derive(Debug, Clone)]
pub struct Selection {
    pub channel: ChannelInfo,
    pub pool: Vec<Arc<Message>>,
}

/// Messages by `user` worth quoting: non-blank and not a bot command.
pub fn user_pool(messages: &[Arc<Message>], user: UserId, prefix: &str) -> Vec<Arc<Message>> {
    messages
        .iter()
        .filter(|message| message.author.id == user)
        .filter(|message| {
            let content = message.content.trim();
            !content.is_empty() && !content.starts_with(prefix)
        })
        .cloned()
        .collect()
}

/// Runs the pick, sync, filter cycle over a candidate set.
pub struct ChannelSelector<'a, P> {
    pub platform: &'a P,
    pub registry: &'a CacheRegistry,
    pub prefix: &'a str,
    pub page_size: u8,
}

impl<P: ChatPlatform> ChannelSelector<'_, P> {
    /// Find a channel with something to quote.
    ///
    /// Channels whose cache is empty are dropped without using up the retry
    /// budget. Channels with messages but none by `target` are dropped and
    /// charged against it. Every pick costs one fetch and the number of
    /// fetches never exceeds [`CandidateSet::fetch_limit`]. Fetch errors
    /// abort immediately.
    pub async fn select<R: Rng + Send>(
        &self,
        mut candidates: CandidateSet,
        target: Option<UserId>,
        rng: &mut R,
    ) -> Result<Selection, QuoteError> {
        let budget = candidates.retry_budget();
        let fetch_limit = candidates.fetch_limit();
        let mut attempts = 0;
        let mut fetches = 0;

        while attempts < budget && fetches < fetch_limit {
            let Some(index) = candidates.pick(rng) else {
                break;
            };
            let Some(channel_id) = candidates.get(index).map(|channel| channel.id) else {
                break;
            };

            let cached = self
                .registry
                .sync(self.platform, channel_id, self.page_size)
                .await?;
            fetches += 1;

            if cached.is_empty() {
                tracing::debug!(channel_id, "channel has no messages, skipping");
                candidates.remove(index);
                continue;
            }

            let pool = match target {
                Some(user) => user_pool(&cached, user, self.prefix),
                None => cached,
            };

            if pool.is_empty() {
                attempts += 1;
                candidates.remove(index);
                tracing::debug!(
                    channel_id,
                    attempts,
                    budget,
                    remaining = candidates.len(),
                    "no messages by target user, trying another channel"
                );
                continue;
            }

            let channel = candidates.remove(index);
            return Ok(Selection { channel, pool });
        }

        tracing::debug!(
            attempts,
            budget,
            fetches,
            fetch_limit,
            "channel selection exhausted"
        );
        Err(QuoteError::NotFound)
    }
}
