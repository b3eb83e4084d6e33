//! Install and activate commands

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cache::CacheStorage;
use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::cli::context::HostContext;
use crate::controller::LifecycleState;
use crate::error::{ControllerError, Result};
use crate::output::{CacheActionRow, FieldRow, format_json, format_size, format_table};

/// Deliver an install event for the configured version.
///
/// Every install starts a fresh controller instance. On success the version
/// is recorded as waiting; on failure the waiting slot is cleared and the
/// active generation, if any, keeps serving.
pub async fn install(opts: &GlobalOptions) -> Result<()> {
    let mut ctx = HostContext::new(opts)?;
    let controller = ctx.controller().with_state(LifecycleState::Parsed);

    let config = controller.config();
    let spinner = spinner(
        ctx.format,
        format!(
            "Installing {} ({} URLs from {})",
            config.version_tag,
            config.manifest.len(),
            config.origin
        ),
    );
    let result = controller.install().await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => {
            ctx.registration
                .record_installed(&ctx.config.version_tag, &ctx.config.fallback_path);
            ctx.save_registration()?;
            report
        }
        Err(err) => {
            ctx.registration.record_install_failed();
            ctx.save_registration()?;
            return Err(err);
        }
    };

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&report)?),
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Cache", &report.cache_name),
                FieldRow::new("Entries", report.entries),
                FieldRow::new("Size", format_size(report.size_bytes)),
                FieldRow::new("State", LifecycleState::Installed),
            ];
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            println!(
                "{} Installed {}: {} entries ({})",
                "✓".green(),
                report.cache_name.bold(),
                report.entries,
                format_size(report.size_bytes)
            );
            println!("  → Run 'offcache activate' to take control");
        }
    }

    Ok(())
}

/// Deliver an activate event for the configured version
pub async fn activate(opts: &GlobalOptions) -> Result<()> {
    let mut ctx = HostContext::new(opts)?;
    let controller = ctx.controller();
    if controller.state() == LifecycleState::Parsed
        || !ctx.storage.has(&ctx.config.version_tag).await?
    {
        return Err(ControllerError::NothingToActivate.into());
    }

    let report = controller.activate().await?;
    ctx.registration.promote(&ctx.config.version_tag);
    ctx.save_registration()?;

    match ctx.format {
        OutputFormat::Json => println!("{}", format_json(&report)?),
        OutputFormat::Table => {
            let mut rows = vec![CacheActionRow {
                name: report.current.clone(),
                action: "activated".to_string(),
            }];
            rows.extend(report.deleted.iter().map(|name| CacheActionRow {
                name: name.clone(),
                action: "deleted".to_string(),
            }));
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            println!("{} Activated {}", "✓".green(), report.current.bold());
            if report.deleted.is_empty() {
                println!("{} No stale caches", "○".dimmed());
            } else {
                for name in &report.deleted {
                    println!("  {} deleted {}", "✗".red(), name);
                }
            }
        }
    }

    Ok(())
}

/// Spinner on stderr for human-readable output only
fn spinner(format: OutputFormat, message: String) -> Option<ProgressBar> {
    if format != OutputFormat::Pretty {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
