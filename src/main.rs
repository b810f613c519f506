use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trustcheck::app::AppContext;
use trustcheck::cli::{commands, CacheAction, Cli, Commands, ConfigAction};
use trustcheck::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    match cli.command {
        Commands::Lookup {
            targets,
            refresh,
            full_domain,
            open,
        } => {
            let ctx = context(&config_path, cli.db)?;
            commands::lookup(&ctx, &targets, refresh, full_domain, open).await?;
        }
        Commands::Cache { action } => {
            let ctx = context(&config_path, cli.db)?;
            match action {
                CacheAction::List => commands::list_cache(&ctx)?,
                CacheAction::Info { domain } => commands::cache_info(&ctx, &domain)?,
                CacheAction::Clear { domain } => commands::clear_cache(&ctx, domain.as_deref())?,
                CacheAction::ResetTtl { domain, ttl } => commands::reset_ttl(&ctx, &domain, ttl)?,
                CacheAction::Sweep => commands::sweep_cache(&ctx)?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::show_config(&Config::load_or_create(&config_path)?)?,
            ConfigAction::Path => println!("{}", config_path.display()),
            ConfigAction::Set { key, value } => commands::set_config(&config_path, &key, &value)?,
            ConfigAction::Reset => commands::reset_config(&config_path)?,
        },
    }

    Ok(())
}

fn context(config_path: &Path, db_path: Option<PathBuf>) -> anyhow::Result<AppContext> {
    let config = Config::load_or_create(config_path)?;
    Ok(AppContext::new(config, db_path)?)
}
