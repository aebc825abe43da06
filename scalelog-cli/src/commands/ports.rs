//! Port listing command.

use anyhow::Result;
use console::style;
use scalelog::{PlatformKind, confirmed_ports, discover_candidates};

fn ports_json(platform: PlatformKind, ports: &[String], probed: bool) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = ports
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "platform": platform.to_string(),
                "confirmed": probed,
            })
        })
        .collect();
    serde_json::Value::Array(entries)
}

/// List ports command implementation.
pub(crate) fn cmd_list_ports(json: bool, all: bool) -> Result<()> {
    let platform = PlatformKind::current()?;
    let ports = if all {
        discover_candidates(platform)
    } else {
        confirmed_ports(platform)
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ports_json(platform, &ports, !all))?
        );
        return Ok(());
    }

    let header = if all {
        "Candidate serial ports:"
    } else {
        "Available serial ports:"
    };
    eprintln!("{}", style(header).bold().underlined());

    if ports.is_empty() {
        eprintln!(
            "  {}",
            style("No ports found. Make sure the scale is connected and you have permission to use the port.")
                .dim()
        );
    } else {
        for port in &ports {
            println!("{port}");
        }
    }

    Ok(())
}
