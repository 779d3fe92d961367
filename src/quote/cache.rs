//! Bounded per-channel message cache with incremental refresh.

use crate::error::QuoteError;
use crate::messaging::ChatPlatform;
use crate::quote::types::{HistoryQuery, Message};
use crate::{ChannelId, MessageId};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Recently seen messages of one channel, oldest first.
///
/// Holds at most `capacity` messages. `cursor` is the id of the newest
/// message merged so far; merges only accept messages strictly newer than it,
/// so the cache never holds duplicates and the cursor never moves backwards.
#[derive(Debug)]
pub struct ChannelCache {
    messages: VecDeque<Arc<Message>>,
    capacity: usize,
    cursor: Option<MessageId>,
}

impl ChannelCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> Option<MessageId> {
        self.cursor
    }

    /// Cached messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Message>> {
        self.messages.iter()
    }

    pub fn snapshot(&self) -> Vec<Arc<Message>> {
        self.messages.iter().cloned().collect()
    }

    /// Merge a fetched page and return how many messages were appended.
    ///
    /// The page may arrive in any order and may overlap what is already
    /// cached. Oldest entries are evicted once the capacity is exceeded,
    /// regardless of their reactions.
    pub fn merge(&mut self, fetched: Vec<Message>) -> usize {
        let cursor = self.cursor;
        let mut fresh: Vec<Message> = fetched
            .into_iter()
            .filter(|message| cursor.is_none_or(|cursor| message.id > cursor))
            .collect();
        fresh.sort_by_key(|message| message.id);
        fresh.dedup_by_key(|message| message.id);

        let Some(newest) = fresh.last().map(|message| message.id) else {
            return 0;
        };

        let appended = fresh.len();
        self.messages.extend(fresh.into_iter().map(Arc::new));
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        self.cursor = Some(newest);

        appended
    }
}

/// Process-wide map of channel caches, shared by every concurrent recall.
///
/// Each channel has its own lock, so refreshes of different channels never
/// wait on each other. Locks are never held across a platform call.
#[derive(Debug)]
pub struct CacheRegistry {
    channels: RwLock<HashMap<ChannelId, Arc<Mutex<ChannelCache>>>>,
    capacity: usize,
}

impl CacheRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    async fn entry(&self, channel_id: ChannelId) -> Option<Arc<Mutex<ChannelCache>>> {
        self.channels.read().await.get(&channel_id).cloned()
    }

    async fn entry_or_insert(&self, channel_id: ChannelId) -> Arc<Mutex<ChannelCache>> {
        if let Some(entry) = self.entry(channel_id).await {
            return entry;
        }
        self.channels
            .write()
            .await
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(ChannelCache::new(self.capacity))))
            .clone()
    }

    pub async fn contains(&self, channel_id: ChannelId) -> bool {
        self.channels.read().await.contains_key(&channel_id)
    }

    /// Snapshot of a channel's cached messages, `None` when never populated.
    pub async fn get(&self, channel_id: ChannelId) -> Option<Vec<Arc<Message>>> {
        let entry = self.entry(channel_id).await?;
        let cache = entry.lock().await;
        Some(cache.snapshot())
    }

    /// Number of cached messages for a channel.
    pub async fn len(&self, channel_id: ChannelId) -> usize {
        match self.entry(channel_id).await {
            Some(entry) => entry.lock().await.len(),
            None => 0,
        }
    }

    pub async fn cursor(&self, channel_id: ChannelId) -> Option<MessageId> {
        let entry = self.entry(channel_id).await?;
        entry.lock().await.cursor()
    }

    /// Merge fetched messages into a channel, creating its entry on first use.
    pub async fn refresh(&self, channel_id: ChannelId, fetched: Vec<Message>) -> usize {
        let entry = self.entry_or_insert(channel_id).await;
        let mut cache = entry.lock().await;
        cache.merge(fetched)
    }

    /// Bring a channel's cache up to date and return its contents.
    ///
    /// A channel with no cursor gets the newest `page_size` messages; otherwise
    /// only messages after the cursor are requested. A failed fetch leaves the
    /// cache exactly as it was.
    pub async fn sync<P: ChatPlatform>(
        &self,
        platform: &P,
        channel_id: ChannelId,
        page_size: u8,
    ) -> Result<Vec<Arc<Message>>, QuoteError> {
        let query = match self.cursor(channel_id).await {
            Some(cursor) => HistoryQuery::after(page_size, cursor),
            None => HistoryQuery::latest(page_size),
        };

        let fetched = platform
            .channel_messages(channel_id, query)
            .await
            .map_err(|error| QuoteError::Fetch {
                channel_id,
                reason: error.to_string(),
            })?;
        let fetched_count = fetched.len();

        let entry = self.entry_or_insert(channel_id).await;
        let mut cache = entry.lock().await;
        let appended = cache.merge(fetched);

        tracing::debug!(
            channel_id,
            fetched = fetched_count,
            appended,
            cached = cache.len(),
            initial = query.after.is_none(),
            "channel cache synced"
        );

        Ok(cache.snapshot())
    }
}
