//! Cache registry commands

use colored::Colorize;

use crate::cache::{CacheStorage, SqliteCacheStorage};
use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::cli::context::{load_config, resolve_cache_dir};
use crate::error::{Error, Result};
use crate::output::{CacheRow, EntryRow, FieldRow, format_json, format_size, format_table};
use crate::registration::Registration;

/// List every named cache
pub fn list(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    let storage = SqliteCacheStorage::open_at(&resolve_cache_dir(&config)?)?;
    let summaries = storage.summaries()?;

    match opts.format {
        OutputFormat::Json => println!("{}", format_json(&summaries)?),
        OutputFormat::Table => {
            let rows: Vec<CacheRow> = summaries
                .iter()
                .map(|s| CacheRow::from_summary(s, &config.version_tag))
                .collect();
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            if summaries.is_empty() {
                println!("No caches");
            }
            for summary in &summaries {
                let marker = if summary.name == config.version_tag {
                    "●".green()
                } else {
                    "○".dimmed()
                };
                println!(
                    "{} {}  {} entries, {}",
                    marker,
                    summary.name.bold(),
                    summary.entries,
                    format_size(summary.size_bytes)
                );
            }
        }
    }

    Ok(())
}

/// List the entries of one cache, the current one by default
pub async fn entries(opts: &GlobalOptions, name: Option<String>) -> Result<()> {
    let config = load_config(opts)?;
    let storage = SqliteCacheStorage::open_at(&resolve_cache_dir(&config)?)?;
    let name = name.unwrap_or(config.version_tag);
    if !storage.has(&name).await? {
        return Err(Error::Other(format!("No cache named '{}'", name)));
    }
    let entries = storage.entries(&name)?;

    match opts.format {
        OutputFormat::Json => println!("{}", format_json(&entries)?),
        OutputFormat::Table => {
            let rows: Vec<EntryRow> = entries.iter().map(EntryRow::from).collect();
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            println!("{} ({} entries)", name.bold(), entries.len());
            for entry in &entries {
                println!(
                    "  {} {} {}",
                    entry.status.to_string().cyan(),
                    entry.url,
                    format_size(entry.size_bytes).dimmed()
                );
            }
        }
    }

    Ok(())
}

/// Delete every cache and forget the registration
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    let cache_dir = resolve_cache_dir(&config)?;
    let storage = SqliteCacheStorage::open_at(&cache_dir)?;
    let stats = storage.clear_all()?;
    Registration::default().save(&cache_dir)?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "caches_removed": stats.caches_removed,
                "entries_removed": stats.entries_removed,
                "success": true,
            });
            println!("{}", format_json(&json)?);
        }
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Caches removed", stats.caches_removed),
                FieldRow::new("Entries removed", stats.entries_removed),
            ];
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            if stats.caches_removed > 0 {
                println!(
                    "Cleared {} caches ({} entries)",
                    stats.caches_removed, stats.entries_removed
                );
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Show cache path and total size
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let config = load_config(opts)?;
    let cache_dir = resolve_cache_dir(&config)?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "path": cache_dir.display().to_string() });
            println!("{}", format_json(&json)?);
        }
        // A bare path is already the tabular form
        OutputFormat::Pretty | OutputFormat::Table => {
            println!("{}", cache_dir.display());
            if cache_dir.exists() {
                let storage = SqliteCacheStorage::open_at(&cache_dir)?;
                let total: usize = storage.summaries()?.iter().map(|s| s.size_bytes).sum();
                eprintln!("{}", format!("{} cached", format_size(total)).dimmed());
            }
        }
    }

    Ok(())
}
