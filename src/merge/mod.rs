//! Merge engine
//!
//! Correlates the five per-source record lists by name key and produces one
//! [`MergedDevice`] per key:
//! - presence flags, bit-field and context label
//! - duplication diagnostics for Entra, Intune, Sophos (and optionally KACE)
//! - hybrid-join and Intune link identity checks
//! - descriptive attributes resolved over source-priority rules
//! - per-source snapshot columns
//!
//! Keys are independent, so they are processed in parallel with rayon over
//! read-only indexes. A key with malformed input is still emitted, marked
//! as degraded, with every analysis that did succeed.

pub mod attributes;
pub mod duplication;
pub mod snapshot;

use std::collections::{BTreeSet, HashSet};

use log::debug;
use rayon::prelude::*;

use crate::constants::LIST_SEPARATOR;
use crate::index::SourceIndex;
use crate::models::{
    AdSnapshot, EntraDuplication, EntraSnapshot, FlatRecord, IntuneDuplication, IntuneSnapshot,
    KaceDuplication, KaceSnapshot, MergeError, MergeStats, MergedDevice, NameKey, Presence,
    SophosDuplication, SophosSnapshot, Source, SourceRecords,
};

/// Options for one merge run
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Count KACE instances and flag KACE duplicates. Off by default since
    /// KACE machine names are managed centrally.
    pub kace_duplicate_detection: bool,
    /// Process keys on the rayon thread pool
    pub parallel: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            kace_duplicate_detection: false,
            parallel: true,
        }
    }
}

/// Indexes for all five sources of one run
#[derive(Debug)]
pub struct SourceIndexes<'a> {
    indexes: [SourceIndex<'a>; 5],
}

impl<'a> SourceIndexes<'a> {
    pub fn build(records: &'a SourceRecords) -> Self {
        Self {
            indexes: Source::ALL.map(|source| SourceIndex::build(source, records.get(source))),
        }
    }

    pub fn get(&self, source: Source) -> &SourceIndex<'a> {
        &self.indexes[source.index()]
    }

    /// Union of the keys of every source's full index
    pub fn all_keys(&self) -> Vec<NameKey> {
        let keys: BTreeSet<&NameKey> = self.indexes.iter().flat_map(|i| i.keys()).collect();
        keys.into_iter().cloned().collect()
    }

    /// Collect what every source reports for one key
    pub fn view(&self, key: &NameKey) -> KeyView<'a> {
        KeyView {
            representatives: Source::ALL.map(|s| self.get(s).representative(key)),
            instances: Source::ALL.map(|s| self.get(s).instances(key).to_vec()),
        }
    }
}

/// Records of every source for a single key; an absent source has no
/// representative and no instances
#[derive(Debug, Clone)]
pub struct KeyView<'a> {
    representatives: [Option<&'a FlatRecord>; 5],
    instances: [Vec<&'a FlatRecord>; 5],
}

impl<'a> KeyView<'a> {
    pub fn representative(&self, source: Source) -> Option<&'a FlatRecord> {
        self.representatives[source.index()]
    }

    pub fn instances(&self, source: Source) -> &[&'a FlatRecord] {
        &self.instances[source.index()]
    }

    pub fn presence(&self) -> Presence {
        Presence::from_flags(self.representatives.map(|r| r.is_some()))
    }
}

/// Merge one run's records into consolidated devices
pub fn merge(records: &SourceRecords, options: &MergeOptions) -> Vec<MergedDevice> {
    merge_with_stats(records, options).0
}

/// Like [`merge`], also returning per-run counters
pub fn merge_with_stats(
    records: &SourceRecords,
    options: &MergeOptions,
) -> (Vec<MergedDevice>, MergeStats) {
    let indexes = SourceIndexes::build(records);
    let mut stats = MergeStats::default();

    for source in Source::ALL {
        let index = indexes.get(source);
        debug!(
            "Indexed {} {} records under {} keys ({} without a name)",
            index.indexed(),
            source,
            index.key_count(),
            index.skipped()
        );
        stats.indexed.insert(source, index.indexed());
        stats.skipped_unnamed.insert(source, index.skipped());
    }

    let keys = indexes.all_keys();
    let devices: Vec<MergedDevice> = if options.parallel {
        keys.par_iter()
            .map(|key| merge_key(&indexes, key, options))
            .collect()
    } else {
        keys.iter()
            .map(|key| merge_key(&indexes, key, options))
            .collect()
    };

    stats.keys = keys.len();
    stats.degraded = devices.iter().filter(|d| d.is_degraded()).count();

    (devices, stats)
}

fn merge_key(indexes: &SourceIndexes<'_>, key: &NameKey, options: &MergeOptions) -> MergedDevice {
    build_device(key, &indexes.view(key), options)
}

/// Analyse one key.
///
/// Every analysis runs on its own. A failed analysis reduces only its own
/// source to instance counts and its error is recorded in `degraded`;
/// everything that succeeded is kept.
pub fn build_device(key: &NameKey, view: &KeyView<'_>, options: &MergeOptions) -> MergedDevice {
    let mut failures: Vec<MergeError> = Vec::new();

    let entra_instances = view.instances(Source::Entra);
    let (entra, entra_ids) =
        match duplication::analyze_entra(entra_instances, view.instances(Source::Ad)) {
            Ok(analysis) => (analysis.duplication, Some(analysis.device_ids)),
            Err(err) => {
                failures.push(err);
                (entra_counts(entra_instances.len()), None)
            }
        };

    let intune_instances = view.instances(Source::Intune);
    let intune = match &entra_ids {
        Some(ids) => duplication::analyze_intune(intune_instances, ids),
        // Without the Entra ids the link check has nothing to compare to
        None => duplication::analyze_intune(intune_instances, &HashSet::new())
            .map(without_link_check),
    }
    .unwrap_or_else(|err| {
        failures.push(err);
        intune_counts(intune_instances.len())
    });

    let sophos_instances = view.instances(Source::Sophos);
    let sophos = duplication::analyze_sophos(sophos_instances).unwrap_or_else(|err| {
        failures.push(err);
        sophos_counts(sophos_instances.len())
    });

    let kace = if options.kace_duplicate_detection {
        let kace_instances = view.instances(Source::Kace);
        duplication::analyze_kace(kace_instances).unwrap_or_else(|err| {
            failures.push(err);
            kace_counts(kace_instances.len())
        })
    } else {
        KaceDuplication::default()
    };

    let (serial_number, attributes, attribute_failures) = attributes::resolve_attributes(view);
    failures.extend(attribute_failures);

    let multi_instance = is_multi_instance(
        entra.instance_count,
        intune.instance_count,
        sophos.instance_count,
        &kace,
    );

    let degraded = if failures.is_empty() {
        None
    } else {
        let reasons: Vec<String> = failures.iter().map(ToString::to_string).collect();
        Some(reasons.join(LIST_SEPARATOR))
    };

    MergedDevice {
        name: key.clone(),
        serial_number,
        presence: view.presence(),
        entra,
        intune,
        sophos,
        kace,
        multi_instance,
        attributes,
        entra_snapshot: EntraSnapshot::from_record(view.representative(Source::Entra)),
        intune_snapshot: IntuneSnapshot::from_record(view.representative(Source::Intune)),
        ad_snapshot: AdSnapshot::from_record(view.representative(Source::Ad)),
        sophos_snapshot: SophosSnapshot::from_record(view.representative(Source::Sophos)),
        kace_snapshot: KaceSnapshot::from_record(view.representative(Source::Kace)),
        degraded,
    }
}

fn entra_counts(count: usize) -> EntraDuplication {
    EntraDuplication {
        instance_count: count,
        duplicate: count > 1,
        ..Default::default()
    }
}

fn intune_counts(count: usize) -> IntuneDuplication {
    IntuneDuplication {
        instance_count: count,
        duplicate: count > 1,
        ..Default::default()
    }
}

fn without_link_check(intune: IntuneDuplication) -> IntuneDuplication {
    IntuneDuplication {
        link_matches_entra: 0,
        link_mismatches: 0,
        duplicate: intune.instance_count > 1,
        ..intune
    }
}

fn sophos_counts(count: usize) -> SophosDuplication {
    SophosDuplication {
        instance_count: count,
        duplicate: count > 1,
        ..Default::default()
    }
}

fn kace_counts(count: usize) -> KaceDuplication {
    KaceDuplication {
        instance_count: Some(count),
        ids: None,
        duplicate: Some(count > 1),
    }
}

fn is_multi_instance(entra: usize, intune: usize, sophos: usize, kace: &KaceDuplication) -> bool {
    entra > 1 || intune > 1 || sophos > 1 || kace.instance_count.is_some_and(|n| n > 1)
}
