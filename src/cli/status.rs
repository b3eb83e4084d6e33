//! Status command implementation

use colored::Colorize;

use crate::cache::SqliteCacheStorage;
use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::cli::context::{load_config, resolve_cache_dir};
use crate::config::Config;
use crate::error::Result;
use crate::output::{FieldRow, format_json, format_size, format_table};
use crate::registration::{RegisteredVersion, Registration};

/// Run the status command to display configuration and registration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let config_path = Config::resolve_path(opts.config_ref())?;
    let config = load_config(opts)?;
    let cache_dir = resolve_cache_dir(&config)?;
    let registration = Registration::load(&cache_dir)?;
    let storage = SqliteCacheStorage::open_at(&cache_dir)?;
    let summaries = storage.summaries()?;
    let state = registration.state_of(&config.version_tag);

    if opts.format == OutputFormat::Json {
        let json = serde_json::json!({
            "config_path": config_path.display().to_string(),
            "config_exists": config_path.exists(),
            "version_tag": config.version_tag,
            "origin": config.origin,
            "fallback_path": config.fallback_path,
            "manifest": config.manifest,
            "state": state.to_string(),
            "registration": registration,
            "cache_dir": cache_dir.display().to_string(),
            "caches": summaries,
        });
        println!("{}", format_json(&json)?);
        return Ok(());
    }

    if opts.format == OutputFormat::Table {
        let version_of = |slot: &Option<RegisteredVersion>| {
            slot.as_ref()
                .map(|v| v.version_tag.clone())
                .unwrap_or_else(|| "-".to_string())
        };
        let total: usize = summaries.iter().map(|s| s.size_bytes).sum();
        let rows = vec![
            FieldRow::new("Config file", config_path.display()),
            FieldRow::new("Cache dir", cache_dir.display()),
            FieldRow::new("Version tag", &config.version_tag),
            FieldRow::new("State", state),
            FieldRow::new("Origin", &config.origin),
            FieldRow::new("Manifest URLs", config.manifest.len()),
            FieldRow::new("Fallback", &config.fallback_path),
            FieldRow::new("Active", version_of(&registration.active)),
            FieldRow::new("Waiting", version_of(&registration.waiting)),
            FieldRow::new("Caches", summaries.len()),
            FieldRow::new("Total size", format_size(total)),
        ];
        println!("{}", format_table(&rows));
        return Ok(());
    }

    println!("{}\n", "offcache Status".bold());

    if config_path.exists() {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().cyan(),
            "(not found, using defaults)".dimmed()
        );
    }
    println!("Cache dir:   {}", cache_dir.display().to_string().cyan());
    println!();

    println!("Version tag: {} ({})", config.version_tag.bold(), state);
    println!("Origin:      {}", config.origin);
    println!(
        "Manifest:    {} URLs, fallback {}",
        config.manifest.len(),
        config.fallback_path
    );
    println!();

    match &registration.active {
        Some(active) => println!(
            "{} Active: {} (since {})",
            "✓".green(),
            active.version_tag.bold(),
            active.since.format("%Y-%m-%d %H:%M")
        ),
        None => {
            println!("{} No active version", "✗".red());
            println!("  → Run 'offcache install' then 'offcache activate'");
        }
    }
    if let Some(waiting) = &registration.waiting {
        println!(
            "{} Waiting: {} (run 'offcache activate')",
            "⚠".yellow(),
            waiting.version_tag.bold()
        );
    }

    let stale: Vec<_> = summaries
        .iter()
        .filter(|s| s.name != config.version_tag)
        .collect();
    let total: usize = summaries.iter().map(|s| s.size_bytes).sum();
    println!(
        "{} {} caches ({})",
        "○".dimmed(),
        summaries.len(),
        format_size(total)
    );
    if !stale.is_empty() {
        println!(
            "{} {} stale caches will be deleted on next activation",
            "⚠".yellow(),
            stale.len()
        );
    }

    Ok(())
}
