//! Channel eligibility: blacklist, channel kind, and bot read permission.

use crate::error::QuoteError;
use crate::messaging::ChatPlatform;
use crate::quote::types::{ChannelInfo, ChannelKind};
use crate::{ChannelId, UserId};

use regex::Regex;
use std::sync::LazyLock;

pub(crate) static USER_MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>").expect("hardcoded user mention regex"));

/// Channels a quote may be drawn from.
///
/// Blacklisted and non-text channels are dropped before any permission
/// lookup. A failed lookup aborts the whole call.
pub async fn eligible_channels<P: ChatPlatform>(
    platform: &P,
    channels: Vec<ChannelInfo>,
    blacklist: &[ChannelId],
) -> Result<Vec<ChannelInfo>, QuoteError> {
    if channels.is_empty() {
        tracing::warn!("guild has no channels to quote from");
        return Err(QuoteError::NotFound);
    }

    let mut eligible = Vec::with_capacity(channels.len());
    for channel in channels {
        if blacklist.contains(&channel.id) || channel.kind != ChannelKind::Text {
            continue;
        }

        let readable = platform
            .can_read(&channel)
            .await
            .map_err(|error| QuoteError::Permission {
                channel_id: channel.id,
                reason: error.to_string(),
            })?;

        if readable {
            eligible.push(channel);
        }
    }

    if eligible.is_empty() {
        tracing::warn!("no readable, non-blacklisted text channels");
        return Err(QuoteError::NotFound);
    }

    Ok(eligible)
}

/// First eligible channel whose mention token appears in `content`.
pub fn mentioned_channel(content: &str, eligible: &[ChannelInfo]) -> Option<ChannelId> {
    eligible
        .iter()
        .find(|channel| content.contains(&channel.mention()))
        .map(|channel| channel.id)
}

/// Users mentioned in `content`, in order of appearance.
pub fn mentioned_users(content: &str) -> Vec<UserId> {
    USER_MENTION_REGEX
        .captures_iter(content)
        .filter_map(|captures| captures.get(1)?.as_str().parse().ok())
        .collect()
}
