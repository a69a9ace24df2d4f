//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap, including:
//! - Source export selection (per-source files or a discovery directory)
//! - Device filters (context, device type, OS, duplicates)
//! - Output mode selection (human/JSON, summary, single device)
//! - Merge and logging overrides

use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use devicescope::filter::{ContextFilter, DeviceFilter, DuplicateFilter};
use devicescope::input::SourcePaths;
use devicescope::models::Source;

const VERSION: &str = concat!(env!("DEVICESCOPE_VERSION"), " (", env!("GIT_HASH"), ")");

/// Settings for one invocation, before the config file is applied
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub config_path: Option<PathBuf>,
    /// Export paths given on the command line; they override the config file
    pub sources: SourcePaths,
    pub filter: DeviceFilter,
    pub device: Option<String>,
    pub json_output: bool,
    pub summary_only: bool,
    pub quiet_mode: bool,
    pub kace_duplicates: bool,
    pub sequential: bool,
    pub log_level: Option<String>,
}

fn source_id(source: Source) -> &'static str {
    match source {
        Source::Entra => "entra",
        Source::Intune => "intune",
        Source::Ad => "ad",
        Source::Sophos => "sophos",
        Source::Kace => "kace",
    }
}

fn source_arg(source: Source) -> Arg {
    Arg::new(source_id(source))
        .long(source_id(source))
        .value_name("FILE")
        .help(format!("{} export (JSON)", source))
        .value_parser(clap::value_parser!(PathBuf))
}

/// Build the command definition
pub fn build_command() -> Command {
    let mut command = Command::new("devicescope")
        .version(VERSION)
        .about("Reconcile device inventory exports into one row per physical device")
        .long_about(
            "Merges device exports from Entra ID, Intune, Active Directory, Sophos Central and \
             KACE by normalized device name, reports where each device is known, flags \
             duplicate registrations and reconciles descriptive attributes across sources.",
        );

    for source in Source::ALL {
        command = command.arg(source_arg(source));
    }

    command
        .arg(
            Arg::new("input-dir")
                .short('i')
                .long("input-dir")
                .value_name("DIR")
                .help("Directory searched for the newest <Source>*.json export of each source")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: <config dir>/devicescope/config.toml)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("summary")
                .short('s')
                .long("summary")
                .help("Print only the coverage summary of the whole inventory (filters do not apply)")
                .action(ArgAction::SetTrue)
                .conflicts_with("device"),
        )
        .arg(
            Arg::new("device")
                .short('d')
                .long("device")
                .value_name("NAME")
                .help("Show every merged property of one device"),
        )
        .arg(
            Arg::new("context")
                .long("context")
                .value_name("SOURCE|all")
                .help("Only devices present in SOURCE, or in all five sources")
                .value_parser(|s: &str| s.parse::<ContextFilter>()),
        )
        .arg(
            Arg::new("exclusive")
                .long("exclusive")
                .help("With --context SOURCE, only devices present in no other source")
                .action(ArgAction::SetTrue)
                .requires("context"),
        )
        .arg(
            Arg::new("duplicates")
                .long("duplicates")
                .value_name("all|only|none")
                .help("Select by duplicate status")
                .default_value("all")
                .value_parser(|s: &str| s.parse::<DuplicateFilter>()),
        )
        .arg(
            Arg::new("device-type")
                .long("device-type")
                .value_name("PATTERN")
                .help("Filter by device type (exact or glob pattern, repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("os")
                .long("os")
                .value_name("PATTERN")
                .help("Filter by operating system (exact or glob pattern, repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("kace-duplicates")
                .long("kace-duplicates")
                .help("Count KACE instances and include them in duplicate detection")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help("Merge devices on a single thread")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("log-level"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("off, error, warn, info, debug or trace"),
        )
}

/// Turn parsed matches into a run configuration
pub fn config_from_matches(matches: &ArgMatches) -> Result<RunConfig> {
    let mut sources = SourcePaths {
        input_dir: matches.get_one::<PathBuf>("input-dir").cloned(),
        ..Default::default()
    };
    for source in Source::ALL {
        if let Some(path) = matches.get_one::<PathBuf>(source_id(source)) {
            if !path.exists() {
                return Err(anyhow!("{} export does not exist: {}", source, path.display()));
            }
            sources.set(source, Some(path.clone()));
        }
    }
    if let Some(dir) = &sources.input_dir {
        if !dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {}", dir.display()));
        }
    }

    let collect = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };

    let filter = DeviceFilter {
        context: matches.get_one::<ContextFilter>("context").copied(),
        exclusive: matches.get_flag("exclusive"),
        device_types: collect("device-type"),
        operating_systems: collect("os"),
        duplicates: matches
            .get_one::<DuplicateFilter>("duplicates")
            .copied()
            .unwrap_or_default(),
    };
    filter.validate()?;

    Ok(RunConfig {
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        sources,
        filter,
        device: matches.get_one::<String>("device").cloned(),
        json_output: matches.get_flag("json"),
        summary_only: matches.get_flag("summary"),
        quiet_mode: matches.get_flag("quiet"),
        kace_duplicates: matches.get_flag("kace-duplicates"),
        sequential: matches.get_flag("sequential"),
        log_level: matches.get_one::<String>("log-level").cloned(),
    })
}

/// Parse command line arguments and return configuration
pub fn parse_args() -> Result<RunConfig> {
    config_from_matches(&build_command().get_matches())
}
