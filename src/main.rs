#![forbid(unsafe_code)]

mod cli;
mod output;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use std::time::Instant;

use devicescope::config::{parse_log_level, AppConfiguration};
use devicescope::models::{KeyStrategy, MergedDevice};
use devicescope::normalize::normalize;
use devicescope::report::summarize;
use devicescope::{input, logging, merge};

fn main() -> Result<()> {
    let run = cli::parse_args()?;
    let config = AppConfiguration::load(run.config_path.as_deref())?;

    let level = if run.quiet_mode {
        LevelFilter::Error
    } else if let Some(level) = &run.log_level {
        parse_log_level(level)?
    } else {
        config.log_level()?
    };
    logging::init(level)?;

    let mut paths = config.sources.clone();
    paths.overlay(&run.sources);
    let paths = paths.resolve();
    if paths.configured() == 0 {
        return Err(anyhow!(
            "No source exports found; pass --entra/--intune/--ad/--sophos/--kace or --input-dir"
        ));
    }

    let mut options = config.merge_options();
    if run.kace_duplicates {
        options.kace_duplicate_detection = true;
    }
    if run.sequential {
        options.parallel = false;
    }

    logging::log_run_started(&paths, &options);
    let records = input::load_sources(&paths, &config.flatten_options())
        .context("Failed to load source exports")?;
    logging::log_sources_loaded(&records);

    let start_time = Instant::now();
    let (mut devices, stats) = merge::merge_with_stats(&records, &options);
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    let duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);

    logging::log_degraded_devices(&devices);
    logging::log_run_completed(&stats, devices.len(), duration_ms);

    if let Some(name) = &run.device {
        let device = find_device(&devices, name)
            .ok_or_else(|| anyhow!("Device not found: {}", name))?;
        if run.json_output {
            println!("{}", serde_json::to_string_pretty(device)?);
        } else {
            output::format_device(device)?;
        }
        return Ok(());
    }

    // Filters narrow the listing; the summary always covers the whole inventory
    let selected = run.filter.apply(&devices);
    let summary = summarize(&devices);

    if run.summary_only {
        if run.json_output {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            output::format_summary(&summary)?;
        }
    } else if run.json_output {
        output::format_json(selected, &summary)?;
    } else {
        output::format_human(&selected, &summary)?;
    }

    Ok(())
}

/// Look a device up by the name a user would type, FQDNs included
fn find_device<'a>(devices: &'a [MergedDevice], name: &str) -> Option<&'a MergedDevice> {
    let wanted = name.trim();
    let key = normalize(KeyStrategy::ComputerName, wanted);
    devices.iter().find(|d| {
        d.name.as_str().eq_ignore_ascii_case(wanted) || Some(&d.name) == key.as_ref()
    })
}
