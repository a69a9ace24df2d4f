//! Coverage summary and filtering over a merged fleet

mod helpers;

use helpers::ExportDir;

use devicescope::filter::{ContextFilter, DeviceFilter, DuplicateFilter};
use devicescope::flatten::FlattenOptions;
use devicescope::input::{discover_source_files, load_sources};
use devicescope::merge::{merge, MergeOptions};
use devicescope::models::{MergedDevice, Source};
use devicescope::report::{parse_memory_gb, summarize, summarize_selected};

fn merged_fleet() -> Vec<MergedDevice> {
    let dir = ExportDir::with_fleet();
    let paths = discover_source_files(dir.path());
    let records = load_sources(&paths, &FlattenOptions::default()).unwrap();
    let mut devices = merge(&records, &MergeOptions::default());
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    devices
}

#[test]
fn test_fleet_merges_to_three_devices() {
    let devices = merged_fleet();
    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["LAB-PC", "LAPTOP-042", "WKS01"]);

    let wks = &devices[2];
    assert_eq!(wks.presence.contexts, "Entra | AD | Sophos");
    assert_eq!(wks.presence.bits, 13);
    assert!(wks.entra.duplicate);
    assert!(wks.entra.hybrid_id_matches_ad);
    assert!(!wks.entra.hybrid_id_mismatch_exists);
    assert_eq!(wks.sophos.instance_count, 2);
    assert_eq!(wks.attributes.os.as_deref(), Some("Windows 10 Enterprise"));

    let laptop = &devices[1];
    assert_eq!(laptop.intune.link_matches_entra, 1);
    assert_eq!(laptop.attributes.os.as_deref(), Some("Windows 11 Pro"));
    assert_eq!(laptop.serial_number.as_deref(), Some("SN-042"));
}

#[test]
fn test_summary_counts_duplicates() {
    let summary = summarize(&merged_fleet());

    // 3 devices, plus one extra Entra and one extra Sophos instance on WKS01
    assert_eq!(summary.total_devices, 5);
    assert_eq!(summary.devices_in_all_sources, 0);
    assert_eq!(summary.multi_instance_devices, 1);
    assert_eq!(summary.per_source[&Source::Kace].exclusive, 1);
    assert_eq!(summary.per_source[&Source::Entra].present, 2);
    assert_eq!(summary.overlap_between(Source::Entra, Source::Ad), 2);
    assert_eq!(summary.overlap_between(Source::Ad, Source::Sophos), 2);
    assert_eq!(summary.overlap_between(Source::Entra, Source::Sophos), 3);
    assert_eq!(summary.by_source_count[&1], 1);
    assert_eq!(summary.by_source_count[&2], 1);
    assert_eq!(summary.by_source_count[&3], 3);
}

#[test]
fn test_filtered_summary() {
    let devices = merged_fleet();
    let filter = DeviceFilter {
        operating_systems: vec!["Windows*".to_string()],
        duplicates: DuplicateFilter::Exclude,
        ..Default::default()
    };
    filter.validate().unwrap();

    let selected = filter.apply(&devices);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name.as_str(), "LAPTOP-042");

    let summary = summarize_selected(&selected);
    assert_eq!(summary.total_devices, 1);
    assert_eq!(summary.overlap_between(Source::Entra, Source::Intune), 1);
}

#[test]
fn test_exclusive_context() {
    let devices = merged_fleet();
    let filter = DeviceFilter {
        context: Some(ContextFilter::Source(Source::Kace)),
        exclusive: true,
        ..Default::default()
    };
    let selected = filter.apply(&devices);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name.as_str(), "LAB-PC");

    let ram = selected[0].kace_snapshot.ram_total.as_ref().and_then(parse_memory_gb);
    assert_eq!(ram, Some(16.0));
}
