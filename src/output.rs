//! Output formatting for CLI results

use chrono::Utc;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::cache::{CacheSummary, EntrySummary};

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub timestamp: String,
    pub version: String,
}

impl<T> JsonOutput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Format data as pretty-printed JSON inside the metadata envelope
pub fn format_json<T: Serialize + ?Sized>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(data))
}

/// Format rows as a rounded table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Format bytes as human-readable size
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format a unix timestamp in local time
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|d| {
            d.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Row of `offcache cache list`
#[derive(Debug, Tabled)]
pub struct CacheRow {
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "ENTRIES")]
    pub entries: usize,
    #[tabled(rename = "SIZE")]
    pub size: String,
    #[tabled(rename = "CREATED")]
    pub created: String,
    #[tabled(rename = "STATUS")]
    pub status: String,
}

impl CacheRow {
    /// `status` marks the current generation and anything activation would delete
    pub fn from_summary(summary: &CacheSummary, current: &str) -> Self {
        let status = if summary.name == current {
            "current"
        } else {
            "stale"
        };
        Self {
            name: summary.name.clone(),
            entries: summary.entries,
            size: format_size(summary.size_bytes),
            created: format_timestamp(summary.created_at),
            status: status.to_string(),
        }
    }
}

/// Row of `offcache cache entries`
#[derive(Debug, Tabled)]
pub struct EntryRow {
    #[tabled(rename = "METHOD")]
    pub method: String,
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "STATUS")]
    pub status: u16,
    #[tabled(rename = "SIZE")]
    pub size: String,
}

impl From<&EntrySummary> for EntryRow {
    fn from(entry: &EntrySummary) -> Self {
        Self {
            method: entry.method.clone(),
            url: entry.url.clone(),
            status: entry.status,
            size: format_size(entry.size_bytes),
        }
    }
}

/// Two-column row for single-record results (`status`, `install`, `fetch`)
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "FIELD")]
    pub field: String,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Row of `offcache activate`: what happened to each cache
#[derive(Debug, Tabled)]
pub struct CacheActionRow {
    #[tabled(rename = "CACHE")]
    pub name: String,
    #[tabled(rename = "ACTION")]
    pub action: String,
}
