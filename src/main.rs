//! `panplay` CLI - search video sites and resolve cloud-drive playback

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_config, cmd_detail, cmd_play, cmd_search, Context};

#[derive(Parser)]
#[command(name = "panplay")]
#[command(about = "Video listing aggregator with cloud-drive playback")]
#[command(version)]
struct Cli {
    /// Configuration directory (default: the user config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Site catalog file, overriding the configured catalog
    #[arg(long, global = true)]
    sites: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every searchable site
    Search {
        keyword: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a video's detail with share links resolved
    Detail {
        /// Video id on the site
        id: String,

        /// Site key from the catalog (default: the current site)
        #[arg(long)]
        site: Option<String>,

        /// Print the detail record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve one play-list entry into a playable URL
    Play {
        /// Play label, e.g. `quarknormal#01` or `direct`
        flag: String,
        /// Entry id from the play list
        id: String,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print settings and drive credential status
    Show,

    /// Store the session cookie of a drive
    SetCookie {
        /// Drive id (quark, ali, uc)
        drive: String,
        cookie: String,
    },

    /// Set how many sites are searched at once
    SetConcurrency { limit: usize },

    /// Select the site `detail` uses by default
    SetSite {
        /// Site key from the catalog
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("panplay=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let ctx = Context::load(cli.config_dir, cli.sites)?;

    match cli.command {
        Commands::Search { keyword, json } => cmd_search(&ctx, &keyword, json).await?,
        Commands::Detail { id, site, json } => cmd_detail(&ctx, site.as_deref(), &id, json).await?,
        Commands::Play { flag, id } => cmd_play(&ctx, &flag, &id).await?,
        Commands::Config { action } => cmd_config(ctx, action).await?,
    }

    Ok(())
}
