//! Structured run logging
//!
//! Routes the `log` facade into a `tracing-subscriber` formatter on stderr
//! and emits the run-level events as `message | {json}` lines so they can
//! be grepped and parsed.

use anyhow::{anyhow, Result};
use log::{Level, LevelFilter};
use serde_json::json;
use std::path::Path;
use tracing_subscriber::filter::LevelFilter as SubscriberLevel;

use crate::input::SourcePaths;
use crate::merge::MergeOptions;
use crate::models::{MergeStats, MergedDevice, Source, SourceRecords};

fn subscriber_level(level: LevelFilter) -> SubscriberLevel {
    match level {
        LevelFilter::Off => SubscriberLevel::OFF,
        LevelFilter::Error => SubscriberLevel::ERROR,
        LevelFilter::Warn => SubscriberLevel::WARN,
        LevelFilter::Info => SubscriberLevel::INFO,
        LevelFilter::Debug => SubscriberLevel::DEBUG,
        LevelFilter::Trace => SubscriberLevel::TRACE,
    }
}

/// Install the stderr subscriber and bridge `log` records into it.
/// Fails if a global logger is already installed.
pub fn init(level: LevelFilter) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(subscriber_level(level))
        .try_init()
        .map_err(|e| anyhow!("Failed to set logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}

fn log_structured(level: Level, message: &str, data: &serde_json::Value) {
    log::log!(level, "{} | {}", message, data);
}

fn path_text(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

/// Log the start of a merge run
pub fn log_run_started(paths: &SourcePaths, options: &MergeOptions) {
    let message = json!({
        "event": "run_started",
        "input_dir": path_text(paths.input_dir.as_deref()),
        "entra": path_text(paths.get(Source::Entra)),
        "intune": path_text(paths.get(Source::Intune)),
        "ad": path_text(paths.get(Source::Ad)),
        "sophos": path_text(paths.get(Source::Sophos)),
        "kace": path_text(paths.get(Source::Kace)),
        "kace_duplicate_detection": options.kace_duplicate_detection,
        "parallel": options.parallel,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    log_structured(Level::Info, "Merge run started", &message);
}

/// Log per-source record counts after loading
pub fn log_sources_loaded(records: &SourceRecords) {
    let message = json!({
        "event": "sources_loaded",
        "entra": records.entra.len(),
        "intune": records.intune.len(),
        "ad": records.ad.len(),
        "sophos": records.sophos.len(),
        "kace": records.kace.len(),
        "total": records.total(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    log_structured(
        Level::Info,
        &format!("Loaded {} records", records.total()),
        &message,
    );
}

/// Log every degraded device with its reason
pub fn log_degraded_devices(devices: &[MergedDevice]) {
    for device in devices.iter().filter(|d| d.is_degraded()) {
        let message = json!({
            "event": "key_degraded",
            "name": device.name.as_str(),
            "contexts": device.presence.contexts,
            "reason": device.degraded,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        log_structured(
            Level::Warn,
            &format!("Device {} merged with reduced detail", device.name),
            &message,
        );
    }
}

/// Log the outcome of a merge run
pub fn log_run_completed(stats: &MergeStats, devices: usize, duration_ms: u64) {
    let message = json!({
        "event": "run_completed",
        "keys": stats.keys,
        "devices": devices,
        "degraded": stats.degraded,
        "indexed": stats.indexed,
        "skipped_unnamed": stats.skipped_unnamed,
        "duration_ms": duration_ms,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    let level = if stats.degraded > 0 {
        Level::Warn
    } else {
        Level::Info
    };
    log_structured(
        level,
        &format!("Merged {} devices in {} ms", devices, duration_ms),
        &message,
    );
}
