use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use futures::future::join_all;

use crate::app::{AppContext, Result, TrustError};
use crate::cache::CacheInfo;
use crate::config::{Config, ConfigError};
use crate::domain::{effective_domain, normalize_domain, Rating};
use crate::lookup::LookupOutcome;

/// Domain to look up for a page URL or a bare hostname.
pub fn target_domain(input: &str, use_root_domain: bool) -> Option<String> {
    let input = input.trim();
    if input.contains("://") {
        return effective_domain(input, use_root_domain);
    }

    let domain = normalize_domain(input)?;
    effective_domain(&format!("https://{}/", domain), use_root_domain)
}

/// Distinct lookup domains for `targets`, in first-seen order. Invalid
/// targets are reported and skipped.
pub fn target_domains(targets: &[String], use_root_domain: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();

    for target in targets {
        match target_domain(target, use_root_domain) {
            Some(domain) => {
                if seen.insert(domain.clone()) {
                    domains.push(domain);
                }
            }
            None => eprintln!("Not a valid URL or domain: {}", target),
        }
    }

    domains
}

pub async fn lookup(
    ctx: &AppContext,
    targets: &[String],
    refresh: bool,
    full_domain: bool,
    open: bool,
) -> Result<()> {
    let use_root_domain = ctx.config.lookup.use_root_domain && !full_domain;
    let domains = target_domains(targets, use_root_domain);

    let outcomes = join_all(
        domains
            .iter()
            .map(|domain| ctx.lookup.lookup(domain, refresh)),
    )
    .await;

    for (domain, outcome) in domains.iter().zip(outcomes) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("{}: {}", domain, e);
                continue;
            }
        };

        match &outcome {
            LookupOutcome::Cached(rating) | LookupOutcome::Fetched(rating) => {
                println!("{}", format_rating(rating, outcome.is_cached()));
                if open {
                    if let Err(e) = open::that(&rating.url) {
                        tracing::warn!("Failed to open {}: {}", rating.url, e);
                    }
                }
            }
            LookupOutcome::NotFound => println!("No rating found for {}", domain),
            LookupOutcome::InFlight => println!("{}: lookup already in progress", domain),
            LookupOutcome::TimedOut => eprintln!("{}: lookup timed out", domain),
        }
    }

    Ok(())
}

pub fn list_cache(ctx: &AppContext) -> Result<()> {
    let entries = ctx.cache.entries();

    if entries.is_empty() {
        println!("No cached ratings");
        return Ok(());
    }

    for (domain, rating, info) in entries {
        println!("{:<32} {:>4.1}  {}", domain, rating.rating, format_info(&info));
    }

    Ok(())
}

pub fn cache_info(ctx: &AppContext, domain: &str) -> Result<()> {
    let domain = parse_domain(domain)?;

    match ctx.cache.cache_info(&domain) {
        Some(info) => println!("{}: {}", domain, format_info(&info)),
        None => println!("No cache entry for {}", domain),
    }

    Ok(())
}

pub fn clear_cache(ctx: &AppContext, domain: Option<&str>) -> Result<()> {
    match domain {
        Some(domain) => {
            let domain = parse_domain(domain)?;
            ctx.cache.clear(Some(&domain))?;
            println!("Cleared {}", domain);
        }
        None => {
            let count = ctx.cache.len();
            ctx.cache.clear(None)?;
            println!("Cleared {} cached ratings", count);
        }
    }

    Ok(())
}

pub fn reset_ttl(ctx: &AppContext, domain: &str, ttl_secs: Option<u64>) -> Result<()> {
    let domain = parse_domain(domain)?;

    if ctx.cache.cache_info(&domain).is_none() {
        println!("No cache entry for {}", domain);
        return Ok(());
    }

    ctx.cache
        .reset_ttl(&domain, ttl_secs.map(Duration::from_secs))?;

    if let Some(info) = ctx.cache.cache_info(&domain) {
        println!("{}: {}", domain, format_info(&info));
    }

    Ok(())
}

pub fn sweep_cache(ctx: &AppContext) -> Result<()> {
    let removed = ctx.cache.purge_expired()?;
    println!("Removed {} expired entries", removed);
    Ok(())
}

pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    print!("{}", rendered);
    Ok(())
}

pub fn set_config(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_create(path)?;
    config.set(key, value)?;
    config.save_to(path)?;
    println!("Set {} = {}", key, value.trim());
    Ok(())
}

pub fn reset_config(path: &Path) -> Result<()> {
    Config::create_default_config(path)?;
    println!("Configuration reset to defaults: {}", path.display());
    Ok(())
}

fn parse_domain(input: &str) -> Result<String> {
    normalize_domain(input).ok_or_else(|| TrustError::InvalidDomain(input.to_string()))
}

fn format_rating(rating: &Rating, cached: bool) -> String {
    format!(
        "{}: {:.1}/5 from {} reviews, TrustScore {}{}\n  {}",
        rating.domain,
        rating.rating,
        rating.review_count,
        rating.display_trust_score(),
        if cached { " (cached)" } else { "" },
        rating.url
    )
}

fn format_info(info: &CacheInfo) -> String {
    if info.cached {
        format!(
            "age {}, expires in {}",
            format_duration(info.age),
            format_duration(info.expires_in)
        )
    } else {
        format!(
            "expired (age {}, ttl {})",
            format_duration(info.age),
            format_duration(info.ttl)
        )
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
