//! Output formatting module
//!
//! Handles:
//! - Human-readable device listing and coverage summary
//! - Property/value overview of a single device
//! - JSON output of the filtered devices together with the inventory summary

use anyhow::{Context, Result};
use serde::Serialize;

use devicescope::models::{MergedDevice, Source};
use devicescope::report::{parse_memory_gb, InventorySummary};

/// JSON document printed with `--json`
#[derive(Debug, Serialize)]
pub struct InventoryOutput<'a> {
    pub devices: Vec<&'a MergedDevice>,
    pub summary: &'a InventorySummary,
}

const MISSING: &str = "-";

/// Print the filtered devices as JSON
pub fn format_json(devices: Vec<&MergedDevice>, summary: &InventorySummary) -> Result<()> {
    let output = InventoryOutput { devices, summary };
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize inventory")?
    );
    Ok(())
}

/// Print the filtered devices followed by the inventory summary
pub fn format_human(devices: &[&MergedDevice], summary: &InventorySummary) -> Result<()> {
    if devices.is_empty() {
        println!("No devices match the selected filters.");
    } else {
        let name_width = devices
            .iter()
            .map(|d| d.name.as_str().len())
            .max()
            .unwrap_or(0)
            .max("NAME".len());
        let context_width = devices
            .iter()
            .map(|d| d.presence.contexts.len())
            .max()
            .unwrap_or(0)
            .max("SOURCES".len());

        println!("Found {} devices:\n", devices.len());
        println!(
            "{:<name_width$}  {:<context_width$}  {:<24}  {:<12}  FLAGS",
            "NAME", "SOURCES", "OS", "TYPE"
        );

        for device in devices {
            let mut flags = Vec::new();
            if device.multi_instance {
                flags.push("multi-instance");
            }
            if device.entra.hybrid_id_mismatch_exists {
                flags.push("hybrid-id-mismatch");
            }
            if device.intune.link_mismatches > 0 {
                flags.push("intune-link-mismatch");
            }
            if device.is_degraded() {
                flags.push("degraded");
            }

            println!(
                "{:<name_width$}  {:<context_width$}  {:<24}  {:<12}  {}",
                device.name.as_str(),
                device.presence.contexts,
                device.attributes.os.as_deref().unwrap_or(MISSING),
                device.attributes.device_type.as_deref().unwrap_or(MISSING),
                flags.join(", ")
            );
        }
        println!();
    }

    format_summary(summary)
}

/// Print the coverage summary
pub fn format_summary(summary: &InventorySummary) -> Result<()> {
    println!("Inventory Summary:");
    println!("  Devices: {}", summary.total_devices);
    println!("  In all sources: {}", summary.devices_in_all_sources);
    println!("  Multi-instance: {}", summary.multi_instance_devices);
    if summary.degraded_devices > 0 {
        println!("  Degraded: {}", summary.degraded_devices);
    }

    println!("\n  Per source:");
    for source in Source::ALL {
        let coverage = summary.per_source.get(&source).cloned().unwrap_or_default();
        println!(
            "    {:<7} {:>6} present {:>6} exclusive",
            source.prefix(),
            coverage.present,
            coverage.exclusive
        );
    }

    println!("\n  Overlap:");
    let header: Vec<String> = Source::ALL.iter().map(|s| format!("{:>7}", s.prefix())).collect();
    println!("    {:<7}{}", "", header.join(""));
    for a in Source::ALL {
        let row: Vec<String> = Source::ALL
            .iter()
            .map(|b| format!("{:>7}", summary.overlap_between(a, *b)))
            .collect();
        println!("    {:<7}{}", a.prefix(), row.join(""));
    }

    println!("\n  By number of sources:");
    for (count, devices) in &summary.by_source_count {
        println!("    {}: {}", count, devices);
    }

    Ok(())
}

/// Print every merged column of one device as a property/value list
pub fn format_device(device: &MergedDevice) -> Result<()> {
    let value = serde_json::to_value(device).context("Failed to serialize device")?;
    let properties = value
        .as_object()
        .context("Merged device did not serialize to an object")?;

    let width = properties.keys().map(String::len).max().unwrap_or(0);
    println!("Device overview: {}\n", device.name);
    for (property, value) in properties {
        let text = match value {
            serde_json::Value::Null => MISSING.to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("  {:<width$}  {}", property, text);
    }

    if let Some(gb) = device.kace_snapshot.ram_total.as_ref().and_then(parse_memory_gb) {
        println!("  {:<width$}  {:.1}", "KACE_Machine_RAM_GB", gb);
    }

    Ok(())
}
