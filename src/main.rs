//! Quotebot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quotebot")]
#[command(about = "A community Discord bot that recalls reaction-weighted quotes")]
struct Cli {
    /// Path to config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("quotebot=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Quotebot...");

    let config_path = cli
        .config
        .unwrap_or_else(quotebot::config::Config::default_path);
    let config = quotebot::config::Config::load_from_path(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    tracing::info!(
        config = %config_path.display(),
        guild_id = config.discord.public_server,
        blacklisted = config.quote.blacklist.len(),
        welcome_templates = config.discord.welcome_messages.len(),
        "Configuration loaded"
    );

    let engine = quotebot::quote::QuoteEngine::new(config.quote.clone());
    let commands = quotebot::commands::CommandHandler::new(
        config.bot.prefix.clone(),
        config.discord.public_server,
        engine,
    );

    let welcomer = quotebot::welcome::Welcomer::new(
        config.discord.public_server,
        config.discord.welcome_messages.clone(),
    );

    quotebot::messaging::discord::DiscordAdapter::new(
        config.discord.token.clone(),
        commands,
        welcomer,
    )
    .run()
    .await
    .context("discord adapter failed")?;

    tracing::info!("Quotebot stopped");
    Ok(())
}
