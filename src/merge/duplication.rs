//! Duplication analysis per source
//!
//! Each analysis looks at every instance a source reports for one name key.
//! Identifier fields must be scalars; anything else is reported as
//! [`MergeError::MalformedField`] so the caller can degrade just that key.

use std::collections::HashSet;

use uuid::Uuid;

use crate::constants::{ENTRA_TRUST_HYBRID, ENTRA_TRUST_REGISTERED, LIST_SEPARATOR};
use crate::models::{
    EntraDuplication, FlatRecord, IntuneDuplication, KaceDuplication, MergeError,
    SophosDuplication,
};
use crate::resolve::display_text;

pub const ENTRA_DEVICE_ID: &str = "Entra.DeviceId";
pub const ENTRA_TRUST_TYPE: &str = "Entra.TrustType";
pub const ENTRA_JOIN_TYPE: &str = "Entra.JoinType";
pub const AD_OBJECT_GUID: &str = "AD.ObjectGUID";
pub const INTUNE_AZURE_AD_DEVICE_ID: &str = "Intune.azureADDeviceId";
pub const SOPHOS_ID: &str = "Sophos.id";
pub const KACE_ID: &str = "KACE.Id";

/// How an Entra device object is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Hybrid-joined: backed by an on-premises computer object
    Hybrid,
    /// Workplace-registered (personal or BYOD)
    Registered,
    Other,
}

/// Result of the Entra analysis, including the canonical device-id set
/// needed by the Intune link check
#[derive(Debug, Clone, Default)]
pub struct EntraAnalysis {
    pub duplication: EntraDuplication,
    pub device_ids: HashSet<String>,
}

/// Classify an Entra record by its trust type and join type
pub fn classify_join(record: &FlatRecord) -> Result<JoinKind, MergeError> {
    let trust_type = scalar_text(record, ENTRA_TRUST_TYPE)?.unwrap_or_default();
    let join_type = scalar_text(record, ENTRA_JOIN_TYPE)?
        .unwrap_or_default()
        .to_ascii_lowercase();

    if trust_type.eq_ignore_ascii_case(ENTRA_TRUST_HYBRID) || join_type.contains("hybrid") {
        Ok(JoinKind::Hybrid)
    } else if trust_type.eq_ignore_ascii_case(ENTRA_TRUST_REGISTERED)
        || join_type.contains("registered")
    {
        Ok(JoinKind::Registered)
    } else {
        Ok(JoinKind::Other)
    }
}

/// Partition Entra instances by join kind and cross-check hybrid device
/// ids against the AD object GUIDs reported for the same key
pub fn analyze_entra(
    entra: &[&FlatRecord],
    ad: &[&FlatRecord],
) -> Result<EntraAnalysis, MergeError> {
    let mut duplication = EntraDuplication {
        instance_count: entra.len(),
        ..Default::default()
    };
    let mut device_ids = DistinctIds::default();
    let mut hybrid_ids = Vec::new();

    for record in entra {
        let device_id = scalar_text(record, ENTRA_DEVICE_ID)?;

        match classify_join(record)? {
            JoinKind::Hybrid => {
                duplication.hybrid_count += 1;
                if let Some(id) = device_id.as_deref().and_then(canonical_id) {
                    hybrid_ids.push(id);
                }
            }
            JoinKind::Registered => duplication.registered_count += 1,
            JoinKind::Other => duplication.other_count += 1,
        }

        if let Some(id) = device_id {
            device_ids.push(id);
        }
    }

    // An AD object without a GUID still counts: its hybrid ids are unmatched
    let ad_guids = collect_ids(ad, AD_OBJECT_GUID)?;
    if !hybrid_ids.is_empty() && !ad.is_empty() {
        duplication.hybrid_id_matches_ad = hybrid_ids.iter().any(|id| ad_guids.contains(id));
        duplication.hybrid_id_mismatch_exists =
            hybrid_ids.iter().any(|id| !ad_guids.contains(id));
    }

    duplication.duplicate = duplication.instance_count > 1
        || (duplication.hybrid_count > 0 && duplication.registered_count > 0)
        || duplication.hybrid_count > 1;
    duplication.device_ids = device_ids.joined();

    Ok(EntraAnalysis {
        duplication,
        device_ids: device_ids.canonical,
    })
}

/// Count Intune instances and check their Entra device links
pub fn analyze_intune(
    intune: &[&FlatRecord],
    entra_ids: &HashSet<String>,
) -> Result<IntuneDuplication, MergeError> {
    let mut links = DistinctIds::default();
    for record in intune {
        if let Some(id) = scalar_text(record, INTUNE_AZURE_AD_DEVICE_ID)? {
            // Never-registered devices report the nil GUID
            if Uuid::parse_str(id.trim()).is_ok_and(|uuid| uuid.is_nil()) {
                continue;
            }
            links.push(id);
        }
    }

    let link_matches_entra = links.canonical.iter().filter(|id| entra_ids.contains(*id)).count();
    let link_mismatches = links.canonical.len() - link_matches_entra;

    Ok(IntuneDuplication {
        instance_count: intune.len(),
        azure_ad_device_ids: links.joined(),
        link_matches_entra,
        link_mismatches,
        duplicate: intune.len() > 1 || link_mismatches > 0,
    })
}

pub fn analyze_sophos(sophos: &[&FlatRecord]) -> Result<SophosDuplication, MergeError> {
    let ids = distinct_ids(sophos, SOPHOS_ID)?;
    Ok(SophosDuplication {
        instance_count: sophos.len(),
        ids: ids.joined(),
        duplicate: sophos.len() > 1,
    })
}

pub fn analyze_kace(kace: &[&FlatRecord]) -> Result<KaceDuplication, MergeError> {
    let ids = distinct_ids(kace, KACE_ID)?;
    Ok(KaceDuplication {
        instance_count: Some(kace.len()),
        ids: ids.joined(),
        duplicate: Some(kace.len() > 1),
    })
}

/// Canonical form used to compare identifiers across sources: GUIDs as
/// lowercase hyphenated text, anything else trimmed
pub fn canonical_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Uuid::parse_str(trimmed) {
        Ok(uuid) => Some(uuid.hyphenated().to_string()),
        Err(_) => Some(trimmed.to_string()),
    }
}

/// Display text of an identifier field, rejecting list and map values
pub fn scalar_text(record: &FlatRecord, field: &str) -> Result<Option<String>, MergeError> {
    match record.get_present(field) {
        None => Ok(None),
        Some(value) if !value.is_scalar() => Err(MergeError::MalformedField {
            origin: record.source(),
            field: field.to_string(),
            found: value.kind(),
        }),
        Some(value) => Ok(display_text(value)),
    }
}

fn collect_ids(records: &[&FlatRecord], field: &str) -> Result<HashSet<String>, MergeError> {
    Ok(distinct_ids(records, field)?.canonical)
}

fn distinct_ids(records: &[&FlatRecord], field: &str) -> Result<DistinctIds, MergeError> {
    let mut ids = DistinctIds::default();
    for record in records {
        if let Some(id) = scalar_text(record, field)? {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Identifiers deduplicated on their canonical form, first spelling kept
#[derive(Debug, Default)]
struct DistinctIds {
    canonical: HashSet<String>,
    ordered: Vec<String>,
}

impl DistinctIds {
    fn push(&mut self, raw: String) {
        if let Some(id) = canonical_id(&raw) {
            if self.canonical.insert(id) {
                self.ordered.push(raw.trim().to_string());
            }
        }
    }

    fn joined(&self) -> Option<String> {
        if self.ordered.is_empty() {
            None
        } else {
            Some(self.ordered.join(LIST_SEPARATOR))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::{flatten, FlattenOptions};
    use crate::models::Source;
    use serde_json::{json, Value};

    const GUID_A: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";
    const GUID_B: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

    fn records(source: Source, values: &[Value]) -> Vec<FlatRecord> {
        values
            .iter()
            .map(|v| flatten(v, source, &FlattenOptions::default()))
            .collect()
    }

    fn refs(records: &[FlatRecord]) -> Vec<&FlatRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_classify_join_kinds() {
        let entra = records(
            Source::Entra,
            &[
                json!({"TrustType": "ServerAd"}),
                json!({"JoinType": "Hybrid Azure AD joined"}),
                json!({"trustType": "workplace"}),
                json!({"JoinType": "Azure AD registered"}),
                json!({"TrustType": "AzureAd"}),
                json!({}),
            ],
        );
        let kinds: Vec<JoinKind> = entra
            .iter()
            .map(|r| classify_join(r).expect("scalar fields"))
            .collect();
        assert_eq!(
            kinds,
            vec![
                JoinKind::Hybrid,
                JoinKind::Hybrid,
                JoinKind::Registered,
                JoinKind::Registered,
                JoinKind::Other,
                JoinKind::Other,
            ]
        );
    }

    #[test]
    fn test_hybrid_plus_registered_is_duplicate() {
        let entra = records(
            Source::Entra,
            &[
                json!({"DeviceId": GUID_A, "TrustType": "ServerAd"}),
                json!({"DeviceId": GUID_B, "TrustType": "Workplace"}),
            ],
        );
        let analysis = analyze_entra(&refs(&entra), &[]).expect("well-formed");
        let dup = analysis.duplication;

        assert_eq!(dup.instance_count, 2);
        assert_eq!(dup.hybrid_count, 1);
        assert_eq!(dup.registered_count, 1);
        assert!(dup.duplicate);
        assert_eq!(dup.device_ids, Some(format!("{}; {}", GUID_A, GUID_B)));
        assert!(!dup.hybrid_id_matches_ad);
        assert!(!dup.hybrid_id_mismatch_exists);
    }

    #[test]
    fn test_single_instance_is_not_duplicate() {
        let entra = records(Source::Entra, &[json!({"DeviceId": GUID_A, "TrustType": "AzureAd"})]);
        let dup = analyze_entra(&refs(&entra), &[]).expect("well-formed").duplication;
        assert_eq!(dup.other_count, 1);
        assert!(!dup.duplicate);
    }

    #[test]
    fn test_hybrid_ids_checked_against_ad_guids() {
        let entra = records(
            Source::Entra,
            &[
                json!({"DeviceId": GUID_A.to_uppercase(), "TrustType": "ServerAd"}),
                json!({"DeviceId": GUID_B, "TrustType": "ServerAd"}),
            ],
        );
        let ad = records(Source::Ad, &[json!({"Name": "WKS01", "ObjectGUID": GUID_A})]);
        let dup = analyze_entra(&refs(&entra), &refs(&ad)).expect("well-formed").duplication;

        assert_eq!(dup.hybrid_count, 2);
        assert!(dup.duplicate);
        assert!(dup.hybrid_id_matches_ad);
        assert!(dup.hybrid_id_mismatch_exists);
    }

    #[test]
    fn test_ad_object_without_guid_leaves_hybrid_ids_unmatched() {
        let entra = records(Source::Entra, &[json!({"DeviceId": GUID_A, "TrustType": "ServerAd"})]);
        let ad = records(Source::Ad, &[json!({"Name": "PC8$"})]);
        let dup = analyze_entra(&refs(&entra), &refs(&ad)).expect("well-formed").duplication;

        assert!(!dup.hybrid_id_matches_ad);
        assert!(dup.hybrid_id_mismatch_exists);

        // No AD instance at all: nothing to compare against
        let dup = analyze_entra(&refs(&entra), &[]).expect("well-formed").duplication;
        assert!(!dup.hybrid_id_mismatch_exists);
    }

    #[test]
    fn test_intune_links_against_entra_ids() {
        let entra_ids: HashSet<String> = [GUID_A.to_string()].into_iter().collect();
        let intune = records(
            Source::Intune,
            &[
                json!({"azureADDeviceId": GUID_A}),
                json!({"azureADDeviceId": "00000000-0000-0000-0000-000000000000"}),
            ],
        );
        let dup = analyze_intune(&refs(&intune), &entra_ids).expect("well-formed");
        assert_eq!(dup.instance_count, 2);
        assert_eq!(dup.link_matches_entra, 1);
        assert_eq!(dup.link_mismatches, 0);
        assert_eq!(dup.azure_ad_device_ids, Some(GUID_A.to_string()));
        assert!(dup.duplicate);

        let intune = records(Source::Intune, &[json!({"azureADDeviceId": GUID_B})]);
        let dup = analyze_intune(&refs(&intune), &entra_ids).expect("well-formed");
        assert_eq!(dup.link_mismatches, 1);
        assert!(dup.duplicate);
    }

    #[test]
    fn test_sophos_and_kace_ids_are_distinct_and_ordered() {
        let sophos = records(
            Source::Sophos,
            &[json!({"id": "s-2"}), json!({"id": "s-1"}), json!({"id": "s-2"})],
        );
        let dup = analyze_sophos(&refs(&sophos)).expect("well-formed");
        assert_eq!(dup.instance_count, 3);
        assert_eq!(dup.ids, Some("s-2; s-1".to_string()));
        assert!(dup.duplicate);

        let kace = records(Source::Kace, &[json!({"ID": 118})]);
        let dup = analyze_kace(&refs(&kace)).expect("well-formed");
        assert_eq!(dup.instance_count, Some(1));
        assert_eq!(dup.ids, Some("118".to_string()));
        assert_eq!(dup.duplicate, Some(false));
    }

    #[test]
    fn test_non_scalar_identifier_is_malformed() {
        let options = FlattenOptions {
            dictionary_properties: vec!["meta".to_string()],
        };
        let entra = vec![flatten(
            &json!({"meta": {"DeviceId": ["a", "b"]}}),
            Source::Entra,
            &options,
        )];
        let err = scalar_text(&entra[0], "Entra.meta.DeviceId").expect_err("list is not a scalar");
        assert_eq!(
            err,
            MergeError::MalformedField {
                origin: Source::Entra,
                field: "Entra.meta.DeviceId".to_string(),
                found: "list",
            }
        );
    }

    #[test]
    fn test_canonical_id_normalizes_guids() {
        assert_eq!(canonical_id(&format!(" {} ", GUID_A.to_uppercase())), Some(GUID_A.to_string()));
        assert_eq!(canonical_id("{3F2504E0-4F89-11D3-9A0C-0305E82C3301}"), Some(GUID_A.to_string()));
        assert_eq!(canonical_id("abc"), Some("abc".to_string()));
        assert_eq!(canonical_id("  "), None);
    }
}
