pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trustcheck")]
#[command(about = "Look up review ratings for websites", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/trustcheck/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rating cache database (default: <data dir>/trustcheck/trustcheck.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up the rating of one or more sites
    Lookup {
        /// Page URLs or bare domains
        #[arg(required = true)]
        targets: Vec<String>,

        /// Ignore cached ratings
        #[arg(short, long)]
        refresh: bool,

        /// Look up the exact host instead of its root domain
        #[arg(long)]
        full_domain: bool,

        /// Open the review profile in a browser
        #[arg(short, long)]
        open: bool,
    },
    /// Inspect or modify the rating cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Inspect or modify the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached domains
    List,
    /// Show freshness of one cached domain
    Info { domain: String },
    /// Remove one domain, or everything
    Clear { domain: Option<String> },
    /// Restart the expiry clock of a cached domain
    ResetTtl {
        domain: String,

        /// New lifetime in seconds (default: configured cache_ttl_secs)
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Drop every expired entry
    Sweep,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Change one setting
    Set { key: String, value: String },
    /// Restore the default configuration
    Reset,
}
