//! Platform-neutral message and channel records.

use crate::{ChannelId, MessageId, UserId};

/// A fetched chat message. Never mutated after it enters a cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub reactions: Vec<Reaction>,
    /// Users mentioned in `content`, used to render mention tokens as names.
    pub mentions: Vec<Author>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Message {
    /// Total reactions across all emoji.
    pub fn reaction_count(&self) -> u64 {
        self.reactions
            .iter()
            .fold(0u64, |total, reaction| total.saturating_add(reaction.count))
    }
}

/// Message author (or mentioned user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// File attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
    /// Pixel width; only images carry one.
    pub width: Option<u32>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.width.is_some_and(|width| width > 0)
            || self
                .content_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// One emoji and how many users applied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: String,
    pub count: u64,
}

/// Channel kinds we distinguish. Only `Text` channels are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    Other,
}

/// A guild channel as listed by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
}

impl ChannelInfo {
    /// Inline mention token, e.g. `<#1234>`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// Pagination for a history request. `after` and `before` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: u8,
    pub after: Option<MessageId>,
    pub before: Option<MessageId>,
}

impl HistoryQuery {
    /// Newest `limit` messages.
    pub fn latest(limit: u8) -> Self {
        Self {
            limit,
            after: None,
            before: None,
        }
    }

    /// Up to `limit` messages strictly newer than `cursor`.
    pub fn after(limit: u8, cursor: MessageId) -> Self {
        Self {
            limit,
            after: Some(cursor),
            before: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(width: Option<u32>, content_type: Option<&str>) -> Attachment {
        Attachment {
            url: "https://cdn.example/file".into(),
            filename: "file".into(),
            content_type: content_type.map(Into::into),
            width,
        }
    }

    #[test]
    fn image_detection() {
        assert!(attachment(Some(640), None).is_image());
        assert!(attachment(None, Some("image/png")).is_image());
        assert!(!attachment(Some(0), Some("application/pdf")).is_image());
        assert!(!attachment(None, None).is_image());
    }

    #[test]
    fn channel_mention_token() {
        let channel = ChannelInfo {
            id: 55,
            name: "general".into(),
            kind: ChannelKind::Text,
        };
        assert_eq!(channel.mention(), "<#55>");
    }
}
