//! Per-source snapshot columns, read directly from the representative record

use crate::models::{
    AdSnapshot, EntraSnapshot, FieldValue, FlatRecord, IntuneSnapshot, KaceSnapshot,
    SophosSnapshot,
};

fn field(record: Option<&FlatRecord>, name: &str) -> Option<FieldValue> {
    record.and_then(|r| r.get_present(name)).cloned()
}

impl EntraSnapshot {
    pub fn from_record(record: Option<&FlatRecord>) -> Self {
        Self {
            trust_type: field(record, "Entra.TrustType"),
            join_type: field(record, "Entra.JoinType"),
            operating_system: field(record, "Entra.OperatingSystem"),
            operating_system_version: field(record, "Entra.OperatingSystemVersion"),
            is_compliant: field(record, "Entra.IsCompliant"),
            is_managed: field(record, "Entra.IsManaged"),
            approximate_last_sign_in: field(record, "Entra.ApproximateLastSignInDateTime"),
        }
    }
}

impl IntuneSnapshot {
    pub fn from_record(record: Option<&FlatRecord>) -> Self {
        Self {
            device_id: field(record, "Intune.id"),
            management_agent: field(record, "Intune.managementAgent"),
            compliance_state: field(record, "Intune.complianceState"),
            os_version: field(record, "Intune.osVersion"),
            last_sync: field(record, "Intune.lastSyncDateTime"),
            manufacturer: field(record, "Intune.manufacturer"),
            model: field(record, "Intune.model"),
        }
    }
}

impl AdSnapshot {
    pub fn from_record(record: Option<&FlatRecord>) -> Self {
        Self {
            object_guid: field(record, "AD.ObjectGUID"),
            dns_host_name: field(record, "AD.DNSHostName"),
            enabled: field(record, "AD.Enabled"),
            last_logon_date: field(record, "AD.LastLogonDate"),
            distinguished_name: field(record, "AD.DistinguishedName"),
            operating_system_version: field(record, "AD.OperatingSystemVersion"),
        }
    }
}

impl SophosSnapshot {
    pub fn from_record(record: Option<&FlatRecord>) -> Self {
        Self {
            health: field(record, "Sophos.health.overall"),
            ipv4_addresses: field(record, "Sophos.ipv4Addresses"),
            endpoint_type: field(record, "Sophos.type"),
            last_seen_at: field(record, "Sophos.lastSeenAt"),
            tamper_protection: field(record, "Sophos.tamperProtectionEnabled"),
        }
    }
}

impl KaceSnapshot {
    pub fn from_record(record: Option<&FlatRecord>) -> Self {
        Self {
            id: field(record, "KACE.Id"),
            os_name: field(record, "KACE.Os_name"),
            ip: field(record, "KACE.Ip"),
            ram_total: field(record, "KACE.Ram_total"),
            last_inventory: field(record, "KACE.Last_inventory"),
        }
    }
}
