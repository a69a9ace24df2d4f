//! Data models module
//!
//! Defines core data structures:
//! - Source: the five inventory systems and their fixed properties
//! - FieldValue / FlatRecord: flattened, source-tagged device payloads
//! - NameKey: canonical cross-source join key
//! - MergedDevice: one consolidated row per physical device
//! - MergeError / InputError: engine and input failures

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{CONTEXT_SEPARATOR, LIST_SEPARATOR};


/// The inventory systems a device can be reported by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    Entra,
    Intune,
    #[serde(rename = "AD")]
    Ad,
    Sophos,
    #[serde(rename = "KACE")]
    Kace,
}

/// How a source's designated name field is turned into a join key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// Hostname-style: strip `$`, uppercase, keep the host label of an FQDN
    ComputerName,
    /// Display-name-style: uppercase, strip `$`, never split at dots
    DisplayName,
}

impl Source {
    /// All sources in bit order
    pub const ALL: [Source; 5] = [
        Source::Entra,
        Source::Intune,
        Source::Ad,
        Source::Sophos,
        Source::Kace,
    ];

    /// Prefix given to every flattened key of this source
    pub fn prefix(self) -> &'static str {
        match self {
            Source::Entra => "Entra",
            Source::Intune => "Intune",
            Source::Ad => "AD",
            Source::Sophos => "Sophos",
            Source::Kace => "KACE",
        }
    }

    /// Weight of this source in the presence bit-field
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Position of this source in [`Source::ALL`]
    pub fn index(self) -> usize {
        match self {
            Source::Entra => 0,
            Source::Intune => 1,
            Source::Ad => 2,
            Source::Sophos => 3,
            Source::Kace => 4,
        }
    }

    /// Flattened field holding the device name used for correlation
    pub fn name_field(self) -> &'static str {
        match self {
            Source::Entra => "Entra.DisplayName",
            Source::Intune => "Intune.deviceName",
            Source::Ad => "AD.Name",
            Source::Sophos => "Sophos.hostname",
            Source::Kace => "KACE.Name",
        }
    }

    /// Key normalization strategy bound to this source
    pub fn key_strategy(self) -> KeyStrategy {
        match self {
            Source::Entra => KeyStrategy::DisplayName,
            _ => KeyStrategy::ComputerName,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .iter()
            .copied()
            .find(|source| source.prefix().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source '{}' (expected Entra, Intune, AD, Sophos or KACE)", s))
    }
}

/// Canonical join key correlating records of the same physical device
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameKey(String);

impl NameKey {
    /// Wrap an already-normalized key. Empty keys are rejected.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single attribute value after flattening
///
/// Scalars are what flattening normally produces; `List` and `Map` survive
/// only through dictionary properties and are rendered by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::List(_) | FieldValue::Map(_))
    }

    /// Short type name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }

    /// Text of a string value, or `None` for every other variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => FieldValue::Number(n.clone()),
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Default string form of a value
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(LIST_SEPARATOR)?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            FieldValue::Map(_) => {
                let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

/// One flattened device payload, tagged with the source that reported it
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    source: Source,
    fields: HashMap<String, FieldValue>,
}

impl FlatRecord {
    pub fn new(source: Source, fields: HashMap<String, FieldValue>) -> Self {
        Self { source, fields }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Look up a dotted field name.
    ///
    /// Exact matches win; otherwise the first ASCII case-insensitive match
    /// is returned, since the same payload arrives both PascalCased and
    /// camelCased depending on the export path.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Like [`FlatRecord::get`] but treats an explicit null as absent
    pub fn get_present(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).filter(|value| !value.is_null())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }
}

/// Flattened record lists for one merge run, one list per source.
/// An absent source is simply an empty list.
#[derive(Debug, Clone, Default)]
pub struct SourceRecords {
    pub entra: Vec<FlatRecord>,
    pub intune: Vec<FlatRecord>,
    pub ad: Vec<FlatRecord>,
    pub sophos: Vec<FlatRecord>,
    pub kace: Vec<FlatRecord>,
}

impl SourceRecords {
    pub fn get(&self, source: Source) -> &[FlatRecord] {
        match source {
            Source::Entra => &self.entra,
            Source::Intune => &self.intune,
            Source::Ad => &self.ad,
            Source::Sophos => &self.sophos,
            Source::Kace => &self.kace,
        }
    }

    pub fn set(&mut self, source: Source, records: Vec<FlatRecord>) {
        match source {
            Source::Entra => self.entra = records,
            Source::Intune => self.intune = records,
            Source::Ad => self.ad = records,
            Source::Sophos => self.sophos = records,
            Source::Kace => self.kace = records,
        }
    }

    /// Total number of records across all sources
    pub fn total(&self) -> usize {
        Source::ALL.iter().map(|s| self.get(*s).len()).sum()
    }
}

/// Which sources report a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(rename = "InEntra")]
    pub in_entra: bool,
    #[serde(rename = "InIntune")]
    pub in_intune: bool,
    #[serde(rename = "InAD")]
    pub in_ad: bool,
    #[serde(rename = "InSophos")]
    pub in_sophos: bool,
    #[serde(rename = "InKACE")]
    pub in_kace: bool,
    /// Sum of the bit weights of the present sources
    #[serde(rename = "PresenceBits")]
    pub bits: u8,
    /// Pipe-joined names of the present sources, in bit order
    #[serde(rename = "Contexts")]
    pub contexts: String,
}

impl Presence {
    /// Build presence from per-source flags indexed by [`Source::index`].
    /// Flags, bits and contexts are derived together so they cannot disagree.
    pub fn from_flags(flags: [bool; 5]) -> Self {
        let present: Vec<Source> = Source::ALL
            .iter()
            .copied()
            .filter(|s| flags[s.index()])
            .collect();

        Self {
            in_entra: flags[Source::Entra.index()],
            in_intune: flags[Source::Intune.index()],
            in_ad: flags[Source::Ad.index()],
            in_sophos: flags[Source::Sophos.index()],
            in_kace: flags[Source::Kace.index()],
            bits: present.iter().map(|s| s.bit()).sum(),
            contexts: present
                .iter()
                .map(|s| s.prefix())
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR),
        }
    }

    pub fn contains(&self, source: Source) -> bool {
        match source {
            Source::Entra => self.in_entra,
            Source::Intune => self.in_intune,
            Source::Ad => self.in_ad,
            Source::Sophos => self.in_sophos,
            Source::Kace => self.in_kace,
        }
    }

    /// Number of sources reporting the device
    pub fn count(&self) -> usize {
        Source::ALL.iter().filter(|s| self.contains(**s)).count()
    }
}

/// Entra duplication diagnostics and the hybrid/AD identity cross-check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntraDuplication {
    #[serde(rename = "Entra_InstanceCount")]
    pub instance_count: usize,
    #[serde(rename = "Entra_HybridCount")]
    pub hybrid_count: usize,
    #[serde(rename = "Entra_RegisteredCount")]
    pub registered_count: usize,
    #[serde(rename = "Entra_OtherCount")]
    pub other_count: usize,
    #[serde(rename = "Entra_DeviceIds")]
    pub device_ids: Option<String>,
    #[serde(rename = "Entra_DuplicateFlag")]
    pub duplicate: bool,
    #[serde(rename = "Entra_HybridIdMatchesAD")]
    pub hybrid_id_matches_ad: bool,
    #[serde(rename = "Entra_HybridIdMismatchExists")]
    pub hybrid_id_mismatch_exists: bool,
}

/// Intune duplication diagnostics and the Intune→Entra link check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntuneDuplication {
    #[serde(rename = "Intune_InstanceCount")]
    pub instance_count: usize,
    #[serde(rename = "Intune_AzureADDeviceIds")]
    pub azure_ad_device_ids: Option<String>,
    #[serde(rename = "Intune_LinkMatchesEntraCount")]
    pub link_matches_entra: usize,
    #[serde(rename = "Intune_LinkMismatchCount")]
    pub link_mismatches: usize,
    #[serde(rename = "Intune_DuplicateFlag")]
    pub duplicate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SophosDuplication {
    #[serde(rename = "Sophos_InstanceCount")]
    pub instance_count: usize,
    #[serde(rename = "Sophos_Ids")]
    pub ids: Option<String>,
    #[serde(rename = "Sophos_DuplicateFlag")]
    pub duplicate: bool,
}

/// KACE duplication diagnostics, only populated when enabled in
/// [`crate::merge::MergeOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KaceDuplication {
    #[serde(rename = "KACE_InstanceCount", default, skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<usize>,
    #[serde(rename = "KACE_Ids", default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<String>,
    #[serde(rename = "KACE_DuplicateFlag", default, skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

/// Descriptive attributes reconciled across sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    #[serde(rename = "DeviceType")]
    pub device_type: Option<String>,
    #[serde(rename = "OS")]
    pub os: Option<String>,
    #[serde(rename = "PrimaryUser")]
    pub primary_user: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "LastSeen")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntraSnapshot {
    #[serde(rename = "Entra_TrustType")]
    pub trust_type: Option<FieldValue>,
    #[serde(rename = "Entra_JoinType")]
    pub join_type: Option<FieldValue>,
    #[serde(rename = "Entra_OperatingSystem")]
    pub operating_system: Option<FieldValue>,
    #[serde(rename = "Entra_OperatingSystemVersion")]
    pub operating_system_version: Option<FieldValue>,
    #[serde(rename = "Entra_IsCompliant")]
    pub is_compliant: Option<FieldValue>,
    #[serde(rename = "Entra_IsManaged")]
    pub is_managed: Option<FieldValue>,
    #[serde(rename = "Entra_ApproximateLastSignInDateTime")]
    pub approximate_last_sign_in: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntuneSnapshot {
    #[serde(rename = "Intune_DeviceId")]
    pub device_id: Option<FieldValue>,
    #[serde(rename = "Intune_ManagementAgent")]
    pub management_agent: Option<FieldValue>,
    #[serde(rename = "Intune_ComplianceState")]
    pub compliance_state: Option<FieldValue>,
    #[serde(rename = "Intune_OsVersion")]
    pub os_version: Option<FieldValue>,
    #[serde(rename = "Intune_LastSyncDateTime")]
    pub last_sync: Option<FieldValue>,
    #[serde(rename = "Intune_Manufacturer")]
    pub manufacturer: Option<FieldValue>,
    #[serde(rename = "Intune_Model")]
    pub model: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdSnapshot {
    #[serde(rename = "AD_ObjectGUID")]
    pub object_guid: Option<FieldValue>,
    #[serde(rename = "AD_DNSHostName")]
    pub dns_host_name: Option<FieldValue>,
    #[serde(rename = "AD_Enabled")]
    pub enabled: Option<FieldValue>,
    #[serde(rename = "AD_LastLogonDate")]
    pub last_logon_date: Option<FieldValue>,
    #[serde(rename = "AD_DistinguishedName")]
    pub distinguished_name: Option<FieldValue>,
    #[serde(rename = "AD_OperatingSystemVersion")]
    pub operating_system_version: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SophosSnapshot {
    #[serde(rename = "Sophos_Health")]
    pub health: Option<FieldValue>,
    #[serde(rename = "Sophos_ipv4Addresses")]
    pub ipv4_addresses: Option<FieldValue>,
    #[serde(rename = "Sophos_Type")]
    pub endpoint_type: Option<FieldValue>,
    #[serde(rename = "Sophos_LastSeenAt")]
    pub last_seen_at: Option<FieldValue>,
    #[serde(rename = "Sophos_TamperProtectionEnabled")]
    pub tamper_protection: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KaceSnapshot {
    #[serde(rename = "KACE_ID")]
    pub id: Option<FieldValue>,
    #[serde(rename = "KACE_Os_name")]
    pub os_name: Option<FieldValue>,
    #[serde(rename = "KACE_Machine_Ip")]
    pub ip: Option<FieldValue>,
    #[serde(rename = "KACE_Machine_RAM_Total")]
    pub ram_total: Option<FieldValue>,
    #[serde(rename = "KACE_Last_inventory")]
    pub last_inventory: Option<FieldValue>,
}

/// One consolidated row per physical device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDevice {
    #[serde(rename = "Name")]
    pub name: NameKey,
    #[serde(rename = "SerialNumber")]
    pub serial_number: Option<String>,
    #[serde(flatten)]
    pub presence: Presence,
    #[serde(flatten)]
    pub entra: EntraDuplication,
    #[serde(flatten)]
    pub intune: IntuneDuplication,
    #[serde(flatten)]
    pub sophos: SophosDuplication,
    #[serde(flatten)]
    pub kace: KaceDuplication,
    /// Any duplicate-capable source reports more than one instance
    #[serde(rename = "MultiInstanceFlag")]
    pub multi_instance: bool,
    #[serde(flatten)]
    pub attributes: DeviceAttributes,
    #[serde(flatten)]
    pub entra_snapshot: EntraSnapshot,
    #[serde(flatten)]
    pub intune_snapshot: IntuneSnapshot,
    #[serde(flatten)]
    pub ad_snapshot: AdSnapshot,
    #[serde(flatten)]
    pub sophos_snapshot: SophosSnapshot,
    #[serde(flatten)]
    pub kace_snapshot: KaceSnapshot,
    /// Set when part of this device's analysis failed on malformed input
    #[serde(rename = "Degraded", default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl MergedDevice {
    /// Instance count reported by a source for this device
    pub fn instance_count(&self, source: Source) -> usize {
        match source {
            Source::Entra => self.entra.instance_count,
            Source::Intune => self.intune.instance_count,
            Source::Sophos => self.sophos.instance_count,
            Source::Kace => self
                .kace
                .instance_count
                .unwrap_or(usize::from(self.presence.in_kace)),
            Source::Ad => usize::from(self.presence.in_ad),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Per-run counters collected alongside the merged devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Distinct name keys across all sources
    pub keys: usize,
    /// Devices whose analysis was degraded
    pub degraded: usize,
    /// Records indexed under a name key, per source
    pub indexed: BTreeMap<Source, usize>,
    /// Records dropped because their name field was missing or blank
    pub skipped_unnamed: BTreeMap<Source, usize>,
}

/// Errors raised while building one merged device
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("attribute resolver called without candidate field names")]
    EmptyCandidateList,
    #[error("{origin} field '{field}' holds a {found} where a scalar was expected")]
    MalformedField {
        origin: Source,
        field: String,
        found: &'static str,
    },
}

/// Errors raised while loading a source export
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {} as JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} contains a top-level {found}; expected an array or an object", path.display())]
    UnsupportedShape { path: PathBuf, found: &'static str },
}
