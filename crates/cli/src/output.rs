//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Utilization above which a node is shown as hot
const HOT_UTILIZATION: f64 = 80.0;
/// Utilization below which a node is shown as over-provisioned
const COLD_UTILIZATION: f64 = 40.0;

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format megabytes as a human-readable string
pub fn format_mb(mb: u64) -> String {
    if mb >= 1024 {
        format!("{:.2}Gi", mb as f64 / 1024.0)
    } else {
        format!("{}Mi", mb)
    }
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}

/// Render a usage history compactly, oldest first
pub fn format_history(history: &[f64]) -> String {
    if history.is_empty() {
        return "-".to_string();
    }
    history
        .iter()
        .map(|v| format!("{:.0}", v))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Format a unix timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ts.to_string(),
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "ready" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "not ready" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color utilization: red when hot, blue when over-provisioned
pub fn color_utilization(percent: f64) -> String {
    let formatted = format_percent(percent);
    if percent > HOT_UTILIZATION {
        formatted.red().to_string()
    } else if percent < COLD_UTILIZATION {
        formatted.blue().to_string()
    } else {
        formatted.green().to_string()
    }
}
