//! Fetch command: answer one request through the active controller

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::{GlobalOptions, OutputFormat};
use crate::cli::context::HostContext;
use crate::controller::fetch::classify;
use crate::controller::{FetchOutcome, ResponseSource, Strategy};
use crate::error::Result;
use crate::models::{Request, RequestMode};
use crate::network::Network;
use crate::output::{FieldRow, format_json, format_size, format_table};

/// Fetch command arguments
#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub target: String,
    pub navigate: bool,
    pub mode: Option<RequestMode>,
    pub output: Option<String>,
    pub include: bool,
}

#[derive(Debug, Serialize)]
struct FetchSummary<'a> {
    url: &'a str,
    status: u16,
    strategy: Strategy,
    source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a str>,
}

/// Json and table output print a summary on stdout; the body is only kept
/// with `--output` then.
pub async fn run(opts: &GlobalOptions, args: FetchArgs) -> Result<()> {
    let ctx = HostContext::new(opts)?;
    let request = build_request(&ctx, &args)?;

    let outcome = match ctx.active_controller() {
        Some(controller) => controller.handle_fetch(&request).await?,
        None => {
            // Nothing controls the origin yet: behave like an uncontrolled page
            log::info!("No active cache generation, requesting from network");
            let response = ctx.network.fetch(&request).await?;
            FetchOutcome {
                strategy: classify(&request),
                source: ResponseSource::Network,
                response,
            }
        }
    };

    let response = &outcome.response;
    if let Some(path) = &args.output {
        std::fs::write(path, &response.body)?;
    }

    match ctx.format {
        OutputFormat::Json => {
            let summary = FetchSummary {
                url: request.url.as_str(),
                status: response.status,
                strategy: outcome.strategy,
                source: outcome.source,
                content_type: response.content_type(),
                size_bytes: response.body.len(),
                output: args.output.as_deref(),
            };
            println!("{}", format_json(&summary)?);
        }
        OutputFormat::Table => {
            let mut rows = vec![
                FieldRow::new("URL", &request.url),
                FieldRow::new("Status", response.status),
                FieldRow::new("Strategy", strategy_label(outcome.strategy)),
                FieldRow::new("Source", outcome.source),
                FieldRow::new("Size", format_size(response.body.len())),
            ];
            if args.include {
                rows.extend(
                    response
                        .headers
                        .iter()
                        .map(|(name, value)| FieldRow::new(name, value)),
                );
            }
            println!("{}", format_table(&rows));
        }
        OutputFormat::Pretty => {
            let source = match outcome.source {
                ResponseSource::Network => outcome.source.to_string().green(),
                ResponseSource::Cache => outcome.source.to_string().cyan(),
                ResponseSource::Fallback => outcome.source.to_string().yellow(),
            };
            eprintln!(
                "{} {} from {} ({})",
                response.status.to_string().bold(),
                format_size(response.body.len()),
                source,
                strategy_label(outcome.strategy).dimmed()
            );

            if args.output.is_none() {
                let mut stdout = std::io::stdout().lock();
                if args.include {
                    writeln!(stdout, "HTTP {}", response.status)?;
                    for (name, value) in &response.headers {
                        writeln!(stdout, "{}: {}", name, value)?;
                    }
                    writeln!(stdout)?;
                }
                stdout.write_all(&response.body)?;
                stdout.flush()?;
            }
        }
    }

    Ok(())
}

fn build_request(ctx: &HostContext, args: &FetchArgs) -> Result<Request> {
    let url = ctx.config.resolve(&args.target)?;
    let request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::get(url).with_mode(args.mode.unwrap_or_default())
    };
    Ok(request)
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::NetworkFirst => "network-first",
        Strategy::CacheFirst => "cache-first",
    }
}
