//! Presentation of a chosen quote.

use crate::quote::filter::USER_MENTION_REGEX;
use crate::quote::types::{ChannelInfo, Message};

/// Discord's limit on embed titles, in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

const DATE_FORMAT: &str = "%d/%m/%y";

/// Platform-neutral embed for a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteCard {
    pub author_name: String,
    pub author_icon: Option<String>,
    /// The quoted text, mentions resolved to names.
    pub title: String,
    /// `*dd/mm/yy in #channel*`
    pub description: String,
    /// First image attachment, if any.
    pub image: Option<String>,
}

impl QuoteCard {
    pub fn from_message(message: &Message, channel: &ChannelInfo) -> Self {
        let content = replace_user_mentions(message);
        Self {
            author_name: message.author.name.clone(),
            author_icon: message.author.avatar_url.clone(),
            title: truncate(&content, MAX_TITLE_LENGTH),
            description: format!(
                "*{} in #{}*",
                message.timestamp.format(DATE_FORMAT),
                channel.name
            ),
            image: message
                .attachments
                .first()
                .filter(|attachment| attachment.is_image())
                .map(|attachment| attachment.url.clone()),
        }
    }
}

/// Replace `<@id>` tokens with `@name` for users the message mentions.
/// Unknown ids are left as they are.
fn replace_user_mentions(message: &Message) -> String {
    USER_MENTION_REGEX
        .replace_all(&message.content, |captures: &regex::Captures<'_>| {
            let name = captures[1].parse::<u64>().ok().and_then(|id| {
                message
                    .mentions
                    .iter()
                    .find(|user| user.id == id)
                    .map(|user| user.name.as_str())
            });
            match name {
                Some(name) => format!("@{name}"),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::types::{Attachment, Author, ChannelKind};
    use chrono::TimeZone as _;

    fn author(id: u64, name: &str) -> Author {
        Author {
            id,
            name: name.into(),
            avatar_url: Some(format!("https://cdn.example/{id}.png")),
        }
    }

    fn message(content: &str) -> Message {
        Message {
            id: 1,
            author: author(5, "ada"),
            content: content.into(),
            attachments: Vec::new(),
            reactions: Vec::new(),
            mentions: vec![author(6, "grace")],
            timestamp: chrono::Utc.with_ymd_and_hms(2019, 3, 7, 12, 0, 0).unwrap(),
        }
    }

    fn channel() -> ChannelInfo {
        ChannelInfo {
            id: 10,
            name: "general".into(),
            kind: ChannelKind::Text,
        }
    }

    fn attachment(url: &str, width: Option<u32>) -> Attachment {
        Attachment {
            url: url.into(),
            filename: "file".into(),
            content_type: None,
            width,
        }
    }

    #[test]
    fn renders_author_date_and_channel() {
        let card = QuoteCard::from_message(&message("hello"), &channel());
        assert_eq!(card.author_name, "ada");
        assert_eq!(card.author_icon.as_deref(), Some("https://cdn.example/5.png"));
        assert_eq!(card.title, "hello");
        assert_eq!(card.description, "*07/03/19 in #general*");
        assert_eq!(card.image, None);
    }

    #[test]
    fn resolves_known_mentions_only() {
        let card = QuoteCard::from_message(&message("hi <@6> and <@!6>, not <@7>"), &channel());
        assert_eq!(card.title, "hi @grace and @grace, not <@7>");
    }

    #[test]
    fn long_content_is_truncated() {
        let long = "é".repeat(300);
        let card = QuoteCard::from_message(&message(&long), &channel());
        assert_eq!(card.title.chars().count(), MAX_TITLE_LENGTH);
        assert!(card.title.ends_with("..."));
    }

    #[test]
    fn only_first_attachment_is_considered() {
        let mut with_image = message("look");
        with_image.attachments = vec![
            attachment("https://cdn.example/cat.png", Some(640)),
            attachment("https://cdn.example/notes.txt", None),
        ];
        let card = QuoteCard::from_message(&with_image, &channel());
        assert_eq!(card.image.as_deref(), Some("https://cdn.example/cat.png"));

        let mut file_first = message("look");
        file_first.attachments = vec![
            attachment("https://cdn.example/notes.txt", None),
            attachment("https://cdn.example/cat.png", Some(640)),
        ];
        let card = QuoteCard::from_message(&file_first, &channel());
        assert_eq!(card.image, None);
    }
}
