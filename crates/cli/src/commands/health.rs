//! Autoscaler health commands

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::client::{ApiClient, HealthResponse, ReadinessResponse};
use crate::output::{color_status, format_timestamp, print_info, print_json, OutputFormat};

/// Show liveness and readiness of the autoscaler
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let (_, health): (u16, HealthResponse) = client.get_report("healthz").await?;
    let (_, readiness): (u16, ReadinessResponse) = client.get_report("readyz").await?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "health": health,
            "readiness": readiness,
        }))?,
        OutputFormat::Table => {
            println!("{}", "Autoscaler Health".bold());
            println!("{}", "=".repeat(50));
            println!("Status:     {}", color_status(&health.status));
            let ready = if readiness.ready { "ready" } else { "not ready" };
            println!("Readiness:  {}", color_status(ready));
            if let Some(reason) = &readiness.reason {
                println!("Reason:     {}", reason);
            }
            println!();

            if health.components.is_empty() {
                print_info("No components registered");
                return Ok(());
            }

            println!("{}", "Components".bold());
            println!("{}", "-".repeat(50));
            let mut components: Vec<_> = health.components.iter().collect();
            components.sort_by(|a, b| a.0.cmp(b.0));
            for (name, component) in components {
                println!(
                    "{:<12} {:<10} {}  {}",
                    name,
                    color_status(&component.status),
                    format_timestamp(component.last_check_timestamp),
                    component.message.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}
