//! Init command implementation

use colored::Colorize;

use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::output::{FieldRow, format_json, format_table};

/// Write a default configuration, applying any `--origin` override
pub fn run(opts: &GlobalOptions, force: bool) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.display().to_string()).into());
    }

    let mut config = Config::default();
    if let Some(origin) = &opts.origin {
        config.origin = origin.clone();
    }
    config.validate()?;
    config.save_to(&path)?;

    match opts.format {
        OutputFormat::Json => println!("{}", format_json(&config)?),
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Config file", path.display()),
                FieldRow::new("Version tag", &config.version_tag),
                FieldRow::new("Origin", &config.origin),
                FieldRow::new("Manifest URLs", config.manifest.len()),
                FieldRow::new("Fallback", &config.fallback_path),
            ];
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            println!(
                "{} Configuration written to {}",
                "✓".green(),
                path.display().to_string().cyan()
            );
            println!("  Version tag: {}", config.version_tag.bold());
            println!("  Origin:      {}", config.origin);
            println!("  Manifest:    {} URLs", config.manifest.len());
            println!("\n  → Edit the manifest, then run 'offcache install'");
        }
    }

    Ok(())
}
