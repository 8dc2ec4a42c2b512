//! Fleet inspection commands

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, FleetStatus, NodeDetail};
use crate::output::{
    color_utilization, format_history, format_mb, format_timestamp, print_json, print_warning,
    OutputFormat,
};

/// Row for the fleet table
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    id: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Util")]
    utilization: String,
}

/// List every node with its capacity and usage
pub async fn list_nodes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let fleet: FleetStatus = client.get("api/v1/nodes").await?;

    match format {
        OutputFormat::Json => print_json(&fleet)?,
        OutputFormat::Table => {
            if fleet.nodes.is_empty() {
                print_warning("No nodes reported");
                return Ok(());
            }

            let rows: Vec<NodeRow> = fleet
                .nodes
                .iter()
                .map(|n| NodeRow {
                    id: format!("{:02}", n.id),
                    total: format_mb(n.total_mb),
                    used: format_mb(n.used_mb),
                    utilization: color_utilization(n.utilization_percent),
                })
                .collect();

            println!("{}", Table::new(rows).with(Style::rounded()));

            let total: u64 = fleet.nodes.iter().map(|n| n.total_mb).sum();
            let used: u64 = fleet.nodes.iter().map(|n| n.used_mb).sum();
            println!(
                "\n{} nodes, {} provisioned, {} in use (as of {})",
                fleet.nodes.len(),
                format_mb(total),
                format_mb(used),
                format_timestamp(fleet.generated_at)
            );
        }
    }

    Ok(())
}

/// Show one node with its usage history and forecast
pub async fn show_node(client: &ApiClient, id: u32, format: OutputFormat) -> Result<()> {
    let path = format!("api/v1/nodes/{}", id);
    let detail: NodeDetail = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&detail)?,
        OutputFormat::Table => {
            let status = &detail.status;
            println!("{}", format!("Node {:02}", status.id).bold());
            println!("{}", "=".repeat(50));
            println!("Total:        {}", format_mb(status.total_mb));
            println!("Used:         {}", format_mb(status.used_mb));
            println!(
                "Utilization:  {}",
                color_utilization(status.utilization_percent)
            );
            println!();
            println!("{}", "Forecast".bold());
            println!("{}", "-".repeat(50));
            println!(
                "History:      {} ({}/{} samples)",
                format_history(&detail.history),
                detail.history.len(),
                detail.window
            );
            println!("Next usage:   {:.0}MB", detail.forecast_mb);
        }
    }

    Ok(())
}
