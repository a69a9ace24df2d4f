//! Inventory report module
//!
//! Aggregates merged devices into the coverage figures shown on the
//! inventory dashboard. Device totals count every extra Entra and Sophos
//! instance as its own device, so a duplicate registration shows up in the
//! numbers instead of being folded into one row.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::models::{FieldValue, MergedDevice, Source};

const MB_PER_GB: f64 = 1024.0;

static MEMORY_AMOUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").ok());

/// Devices seen by one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoverage {
    /// Devices present in this source
    pub present: usize,
    /// Devices present in this source and no other
    pub exclusive: usize,
}

/// Coverage summary of one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_devices: usize,
    pub devices_in_all_sources: usize,
    pub multi_instance_devices: usize,
    pub degraded_devices: usize,
    pub per_source: BTreeMap<Source, SourceCoverage>,
    /// Devices present in both sources of each pair, duplicate-adjusted
    pub overlap: BTreeMap<Source, BTreeMap<Source, usize>>,
    /// Devices grouped by how many sources report them
    pub by_source_count: BTreeMap<usize, usize>,
}

impl InventorySummary {
    pub fn overlap_between(&self, a: Source, b: Source) -> usize {
        self.overlap
            .get(&a)
            .and_then(|row| row.get(&b))
            .copied()
            .unwrap_or(0)
    }
}

/// Instances beyond the first reported by a duplicate-prone source
fn extra_instances(device: &MergedDevice, source: Source) -> usize {
    device.instance_count(source).saturating_sub(1)
}

/// Count devices, adding one for every extra Entra and Sophos instance
pub fn adjusted_count<'a, I>(devices: I) -> usize
where
    I: IntoIterator<Item = &'a MergedDevice>,
{
    devices
        .into_iter()
        .map(|d| 1 + extra_instances(d, Source::Entra) + extra_instances(d, Source::Sophos))
        .sum()
}

fn overlap_cell(devices: &[&MergedDevice], a: Source, b: Source) -> usize {
    let both: Vec<&MergedDevice> = devices
        .iter()
        .copied()
        .filter(|d| d.presence.contains(a) && d.presence.contains(b))
        .collect();

    let mut count = both.len();
    if a == Source::Entra || b == Source::Entra {
        count += both.iter().map(|d| extra_instances(d, Source::Entra)).sum::<usize>();
    }
    if a == Source::Sophos || b == Source::Sophos {
        count += both.iter().map(|d| extra_instances(d, Source::Sophos)).sum::<usize>();
    }
    count
}

/// Build the coverage summary for a set of merged devices
pub fn summarize(devices: &[MergedDevice]) -> InventorySummary {
    let selected: Vec<&MergedDevice> = devices.iter().collect();
    summarize_selected(&selected)
}

/// Like [`summarize`], over a filtered selection
pub fn summarize_selected(devices: &[&MergedDevice]) -> InventorySummary {
    let per_source = Source::ALL
        .iter()
        .map(|&source| {
            let present = devices.iter().filter(|d| d.presence.contains(source)).count();
            let exclusive = devices
                .iter()
                .filter(|d| d.presence.contains(source) && d.presence.count() == 1)
                .count();
            (source, SourceCoverage { present, exclusive })
        })
        .collect();

    let overlap = Source::ALL
        .iter()
        .map(|&a| {
            let row = Source::ALL
                .iter()
                .map(|&b| (b, overlap_cell(devices, a, b)))
                .collect();
            (a, row)
        })
        .collect();

    let by_source_count = (1..=Source::ALL.len())
        .map(|n| {
            let count = adjusted_count(
                devices
                    .iter()
                    .copied()
                    .filter(|d| d.presence.count() == n),
            );
            (n, count)
        })
        .collect();

    InventorySummary {
        total_devices: adjusted_count(devices.iter().copied()),
        devices_in_all_sources: adjusted_count(
            devices
                .iter()
                .copied()
                .filter(|d| d.presence.count() == Source::ALL.len()),
        ),
        multi_instance_devices: devices.iter().filter(|d| d.multi_instance).count(),
        degraded_devices: devices.iter().filter(|d| d.is_degraded()).count(),
        per_source,
        overlap,
        by_source_count,
    }
}

/// Parse a KACE RAM value such as `"16384 MB"` into gigabytes
pub fn parse_memory_gb(value: &FieldValue) -> Option<f64> {
    let text = value.to_string();
    let amount = MEMORY_AMOUNT.as_ref()?.find(&text)?;
    let megabytes: f64 = amount.as_str().parse().ok()?;
    Some(megabytes / MB_PER_GB)
}
