#![forbid(unsafe_code)]

mod chain;
mod commands;
mod config;
mod constants;
mod eligibility;
mod error;
mod messages;
mod persistence;
mod post_url;
mod relative_time;
mod voting_power;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use chain::RecordedChain;
use config::{ConfigStore, Parameter};
use constants::config::CONFIG_ENV_VAR;
use constants::logging::LEVEL_ENV_VAR;

#[derive(Parser)]
#[command(name = "upvote-bot")]
#[command(about = "Chat upvote bot: runtime config and vote eligibility", long_about = None)]
struct Cli {
    /// Default config file (defaults to the platform config dir)
    #[arg(short, long, value_name = "FILE", env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Chat user id issuing the command
    #[arg(short, long, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the help reply
    Help,

    /// Show or change a config parameter
    Config {
        /// `<name>` or `<name> <value...>`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },

    /// Upvote a post if it is eligible
    Upvote {
        /// Post URL
        url: Option<String>,

        /// JSON snapshot of the post as returned by `get_content`
        #[arg(long, value_name = "FILE")]
        content: Option<PathBuf>,

        /// JSON-lines file receiving accepted votes
        #[arg(long, value_name = "FILE")]
        outbox: Option<PathBuf>,
    },

    /// Print the bot account's voting power status line
    VotingPower {
        /// JSON snapshot of the account as returned by `get_accounts`
        #[arg(long, value_name = "FILE")]
        account: PathBuf,
    },
}

fn init_logging() -> Result<()> {
    let log_level = match std::env::var(LEVEL_ENV_VAR)
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    // Replies go to stdout, logs stay on stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config_path = cli.config.unwrap_or_else(ConfigStore::default_path);
    let mut store = ConfigStore::load(&config_path)
        .with_context(|| format!("Failed to start with config {:?}", config_path))?;
    let now = Utc::now();

    let (command, params, chain) = match cli.command {
        Commands::Help => ("help", Vec::new(), RecordedChain::new()),
        Commands::Config { params } => ("config", params, RecordedChain::new()),
        Commands::Upvote { url, content, outbox } => {
            let mut chain = RecordedChain::new();
            if let Some(path) = content {
                chain = chain.with_content(path);
            }
            if let Some(path) = outbox {
                chain = chain.with_outbox(path);
            }
            ("upvote", url.into_iter().collect(), chain)
        }
        Commands::VotingPower { account } => {
            let chain = RecordedChain::new().with_account(account);
            let username = store.text(Parameter::Username).unwrap_or_default();
            let status = commands::voting_power_status(&chain, username, now)?;
            println!("{status}");
            return Ok(());
        }
    };

    let reply = commands::dispatch(&mut store, &chain, &cli.user, command, &params, now);
    println!("{}", reply.text);

    if let Some(pending) = reply.pending {
        match pending.wait() {
            Ok(()) => info!(path = %store.overrides_path().display(), "Config change saved"),
            Err(e) => error!(error = ?e, "Config change was not saved"),
        }
    }

    Ok(())
}
