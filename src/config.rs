//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use crate::{ChannelId, GuildId};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Largest page Discord returns from a single history request.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Quotebot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot behavior settings.
    pub bot: BotConfig,

    /// Discord connection settings.
    pub discord: DiscordConfig,

    /// Quote recall settings.
    pub quote: QuoteConfig,
}

/// Bot behavior configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Command prefix, e.g. `!`.
    pub prefix: String,
}

/// Discord connection configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token (from the file or `DISCORD_TOKEN`).
    pub token: String,

    /// Guild that `quote` samples from and whose new members are welcomed.
    pub public_server: GuildId,

    /// Welcome templates; `{user}` becomes the new member's mention.
    pub welcome_messages: Vec<String>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[redacted]")
            .field("public_server", &self.public_server)
            .field("welcome_messages", &self.welcome_messages)
            .finish()
    }
}

/// Quote recall engine configuration.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Command prefix; messages starting with it are never quoted.
    pub prefix: String,

    /// Channels that are never sampled.
    pub blacklist: Vec<ChannelId>,

    /// Weight every message gets on top of its reaction count. Always >= 1.
    pub default_message_weight: u64,

    /// Messages requested per history fetch.
    pub page_size: u8,

    /// Maximum messages kept per channel.
    pub cache_capacity: usize,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            prefix: "!".into(),
            blacklist: Vec::new(),
            default_message_weight: 1,
            page_size: MAX_PAGE_SIZE,
            cache_capacity: 1000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    bot: TomlBotConfig,
    #[serde(default)]
    discord: TomlDiscordConfig,
    #[serde(default)]
    quote: TomlQuoteConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBotConfig {
    prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDiscordConfig {
    token: Option<String>,
    public_server: Option<GuildId>,
    #[serde(default)]
    welcome_messages: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlQuoteConfig {
    #[serde(default)]
    blacklist: Vec<ChannelId>,
    default_message_weight: Option<i64>,
    page_size: Option<i64>,
    cache_capacity: Option<i64>,
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("quotebot").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Load from a specific config file path. `DISCORD_TOKEN` overrides the
    /// token in the file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Load {
            path: path.display().to_string(),
            source: Arc::new(error),
        })?;

        Self::from_toml(&content, std::env::var("DISCORD_TOKEN").ok())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str, token_override: Option<String>) -> Result<Self> {
        let raw: TomlConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

        let prefix = raw.bot.prefix.unwrap_or_else(|| "!".into());
        if prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("bot.prefix must not be empty".into()).into());
        }

        let token = token_override
            .filter(|token| !token.trim().is_empty())
            .or(raw.discord.token)
            .ok_or_else(|| ConfigError::MissingKey("discord.token".into()))?;

        let public_server = raw
            .discord
            .public_server
            .ok_or_else(|| ConfigError::MissingKey("discord.public_server".into()))?;
        if public_server == 0 {
            return Err(ConfigError::Invalid("discord.public_server must not be 0".into()).into());
        }

        let welcome_messages = raw.discord.welcome_messages;
        if welcome_messages
            .iter()
            .any(|template| template.trim().is_empty())
        {
            return Err(
                ConfigError::Invalid("discord.welcome_messages must not contain blanks".into())
                    .into(),
            );
        }

        let quote = resolve_quote_config(raw.quote, &prefix)?;

        Ok(Self {
            bot: BotConfig { prefix },
            discord: DiscordConfig {
                token,
                public_server,
                welcome_messages,
            },
            quote,
        })
    }
}

fn resolve_quote_config(raw: TomlQuoteConfig, prefix: &str) -> Result<QuoteConfig> {
    let defaults = QuoteConfig::default();

    let default_message_weight = match raw.default_message_weight {
        None => defaults.default_message_weight,
        Some(weight) if weight >= 1 => weight as u64,
        Some(weight) => {
            return Err(ConfigError::Invalid(format!(
                "quote.default_message_weight must be at least 1, got {weight}"
            ))
            .into());
        }
    };

    let page_size = match raw.page_size {
        None => defaults.page_size,
        Some(size) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&size) => size as u8,
        Some(size) => {
            return Err(ConfigError::Invalid(format!(
                "quote.page_size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
            ))
            .into());
        }
    };

    let cache_capacity = match raw.cache_capacity {
        None => defaults.cache_capacity.max(usize::from(page_size)),
        Some(capacity) if capacity >= i64::from(page_size) => capacity as usize,
        Some(capacity) => {
            return Err(ConfigError::Invalid(format!(
                "quote.cache_capacity must be at least the page size ({page_size}), got {capacity}"
            ))
            .into());
        }
    };

    Ok(QuoteConfig {
        prefix: prefix.to_string(),
        blacklist: raw.blacklist,
        default_message_weight,
        page_size,
        cache_capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use indoc::indoc;
    use std::io::Write as _;

    const MINIMAL: &str = indoc! {r#"
        [discord]
        token = "file-token"
        public_server = 1234
    "#};

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_toml(MINIMAL, None).unwrap();
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.discord.token, "file-token");
        assert_eq!(config.discord.public_server, 1234);
        assert_eq!(config.quote.default_message_weight, 1);
        assert_eq!(config.quote.page_size, 100);
        assert_eq!(config.quote.cache_capacity, 1000);
        assert!(config.quote.blacklist.is_empty());
        assert_eq!(config.quote.prefix, "!");
        assert!(config.discord.welcome_messages.is_empty());
    }

    #[test]
    fn full_config_is_parsed() {
        let toml = indoc! {r#"
            [bot]
            prefix = "?"

            [discord]
            token = "abc"
            public_server = 99
            welcome_messages = ["Hi {user}!", "Welcome, {user}"]

            [quote]
            blacklist = [10, 20]
            default_message_weight = 3
            page_size = 50
            cache_capacity = 200
        "#};

        let config = Config::from_toml(toml, None).unwrap();
        assert_eq!(config.bot.prefix, "?");
        assert_eq!(config.quote.prefix, "?");
        assert_eq!(config.quote.blacklist, vec![10, 20]);
        assert_eq!(config.quote.default_message_weight, 3);
        assert_eq!(config.quote.page_size, 50);
        assert_eq!(config.quote.cache_capacity, 200);
        assert_eq!(
            config.discord.welcome_messages,
            vec!["Hi {user}!".to_string(), "Welcome, {user}".to_string()]
        );
    }

    #[test]
    fn blank_welcome_template_is_rejected() {
        let toml = "[discord]\ntoken = \"t\"\npublic_server = 1\nwelcome_messages = [\"hi {user}\", \"  \"]\n";
        assert!(matches!(
            Config::from_toml(toml, None).unwrap_err(),
            Error::Config(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn token_override_wins() {
        let config = Config::from_toml(MINIMAL, Some("env-token".into())).unwrap();
        assert_eq!(config.discord.token, "env-token");

        let config = Config::from_toml(MINIMAL, Some("  ".into())).unwrap();
        assert_eq!(config.discord.token, "file-token");
    }

    #[test]
    fn zero_weight_is_rejected() {
        let toml = format!("{MINIMAL}\n[quote]\ndefault_message_weight = 0\n");
        let error = Config::from_toml(&toml, None).unwrap_err();
        assert!(matches!(error, Error::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_weight_is_rejected() {
        let toml = format!("{MINIMAL}\n[quote]\ndefault_message_weight = -5\n");
        assert!(Config::from_toml(&toml, None).is_err());
    }

    #[test]
    fn page_size_out_of_range_is_rejected() {
        let toml = format!("{MINIMAL}\n[quote]\npage_size = 101\n");
        assert!(Config::from_toml(&toml, None).is_err());

        let toml = format!("{MINIMAL}\n[quote]\npage_size = 0\n");
        assert!(Config::from_toml(&toml, None).is_err());
    }

    #[test]
    fn capacity_below_page_size_is_rejected() {
        let toml = format!("{MINIMAL}\n[quote]\npage_size = 100\ncache_capacity = 10\n");
        assert!(Config::from_toml(&toml, None).is_err());
    }

    #[test]
    fn missing_token_is_reported() {
        let toml = "[discord]\npublic_server = 1\n";
        let error = Config::from_toml(toml, None).unwrap_err();
        assert!(
            matches!(error, Error::Config(ConfigError::MissingKey(ref key)) if key == "discord.token")
        );
    }

    #[test]
    fn missing_guild_is_reported() {
        let toml = "[discord]\ntoken = \"t\"\n";
        let error = Config::from_toml(toml, None).unwrap_err();
        assert!(
            matches!(error, Error::Config(ConfigError::MissingKey(ref key)) if key == "discord.public_server")
        );
    }

    #[test]
    fn zero_guild_is_rejected() {
        let toml = "[discord]\ntoken = \"t\"\npublic_server = 0\n";
        assert!(matches!(
            Config::from_toml(toml, None).unwrap_err(),
            Error::Config(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let toml = format!("[bot]\nprefix = \" \"\n{MINIMAL}");
        assert!(Config::from_toml(&toml, None).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = format!("{MINIMAL}\n[quote]\nweight = 2\n");
        assert!(matches!(
            Config::from_toml(&toml, None).unwrap_err(),
            Error::Config(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        // Token may be overridden by the environment; the guild never is.
        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.discord.public_server, 1234);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let error = Config::load_from_path(Path::new("/nonexistent/quotebot.toml")).unwrap_err();
        assert!(matches!(error, Error::Config(ConfigError::Load { .. })));
    }
}
