//! Export loading and configuration handling

mod helpers;

use helpers::ExportDir;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use devicescope::config::AppConfiguration;
use devicescope::flatten::FlattenOptions;
use devicescope::input::{discover_source_files, load_source_file, load_sources, SourcePaths};
use devicescope::merge::merge;
use devicescope::models::{FieldValue, InputError, Source};

#[test]
fn test_discovery_picks_one_file_per_source() {
    let dir = ExportDir::with_fleet();
    let paths = discover_source_files(dir.path());
    assert_eq!(paths.configured(), 5);
    assert_eq!(paths.get(Source::Ad), Some(dir.path().join("AD.json").as_path()));
}

#[test]
fn test_discovery_with_missing_sources() {
    let dir = ExportDir::new();
    dir.write("Sophos-2026-10-01.json", &json!([]));

    let paths = discover_source_files(dir.path());
    assert_eq!(paths.configured(), 1);

    let records = load_sources(&paths, &FlattenOptions::default()).unwrap();
    assert_eq!(records.total(), 0);
}

#[test]
fn test_dictionary_properties_reach_the_resolver() {
    let dir = ExportDir::new();
    let path = dir.write(
        "Entra.json",
        &json!([{
            "DisplayName": "PC9",
            "extensionAttributes": {"extensionAttribute1": "Finance", "extensionAttribute2": null}
        }]),
    );

    let options = FlattenOptions {
        dictionary_properties: vec!["extensionAttributes".to_string()],
    };
    let records = load_source_file(&path, Source::Entra, &options).unwrap();
    assert_eq!(
        records[0].get("Entra.extensionAttributes.extensionAttribute1"),
        Some(&FieldValue::from("Finance"))
    );
    assert_eq!(
        records[0].get("Entra.extensionAttributes.extensionAttribute2"),
        Some(&FieldValue::Null)
    );
}

#[test]
fn test_malformed_export_reports_path() {
    let dir = ExportDir::new();
    let path = dir.write_raw("Intune.json", "{\"value\": [");

    let err = load_source_file(&path, Source::Intune, &FlattenOptions::default()).unwrap_err();
    assert!(matches!(err, InputError::Json { .. }));
    assert!(err.to_string().contains("Intune.json"));
}

#[test]
fn test_config_drives_loading_and_merge() {
    let dir = ExportDir::with_fleet();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            "[merge]\nkace_duplicate_detection = true\nparallel = false\n\n[sources]\ninput_dir = {:?}\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfiguration::load(Some(&config_path)).unwrap();
    let options = config.merge_options();
    assert!(options.kace_duplicate_detection);
    assert!(!options.parallel);

    let paths = config.sources.resolve();
    assert_eq!(paths.configured(), 5);

    let records = load_sources(&paths, &config.flatten_options()).unwrap();
    let devices = merge(&records, &options);
    let lab = devices
        .iter()
        .find(|d| d.name.as_str() == "LAB-PC")
        .unwrap();
    assert_eq!(lab.kace.instance_count, Some(1));
}

#[test]
fn test_command_line_paths_override_config() {
    let mut paths = SourcePaths {
        input_dir: Some(PathBuf::from("/srv/exports")),
        entra: Some(PathBuf::from("/srv/exports/Entra-old.json")),
        ..Default::default()
    };
    paths.overlay(&SourcePaths {
        entra: Some(PathBuf::from("/tmp/Entra-new.json")),
        ..Default::default()
    });

    assert_eq!(paths.entra, Some(PathBuf::from("/tmp/Entra-new.json")));
    assert_eq!(paths.input_dir, Some(PathBuf::from("/srv/exports")));
}

#[test]
fn test_invalid_log_level_in_config_is_rejected() {
    let dir = ExportDir::new();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

    let err = AppConfiguration::load(Some(&path)).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid log level"));
}
