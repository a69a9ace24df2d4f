//! Source-priority rules for the reconciled descriptive attributes

use crate::models::{DeviceAttributes, FlatRecord, MergeError, Source};
use crate::resolve::resolve;

use super::KeyView;

/// Sources to consult, most authoritative first, and the fields to try on each
#[derive(Debug, Clone, Copy)]
pub struct AttributeRule {
    pub sources: &'static [Source],
    pub fields: &'static [&'static str],
}

impl AttributeRule {
    /// Resolve this attribute over the representative records of one key
    pub fn resolve(&self, view: &KeyView<'_>) -> Result<Option<String>, MergeError> {
        let candidates: Vec<Option<&FlatRecord>> = self
            .sources
            .iter()
            .map(|source| view.representative(*source))
            .collect();
        resolve(&candidates, self.fields)
    }
}

pub const DEVICE_TYPE: AttributeRule = AttributeRule {
    sources: &[Source::Intune, Source::Kace, Source::Sophos, Source::Entra],
    fields: &[
        "Intune.chassisType",
        "Intune.deviceType",
        "KACE.Chassis_type",
        "Sophos.type",
        "Entra.ProfileType",
        "Entra.DeviceCategory",
    ],
};

pub const OS: AttributeRule = AttributeRule {
    sources: &[Source::Kace, Source::Ad, Source::Intune, Source::Entra, Source::Sophos],
    fields: &[
        "KACE.Os_name",
        "AD.OperatingSystem",
        "Intune.operatingSystem",
        "Entra.OperatingSystem",
        "Sophos.os.name",
        "Sophos.os.platform",
    ],
};

pub const SERIAL_NUMBER: AttributeRule = AttributeRule {
    sources: &[Source::Intune, Source::Kace, Source::Sophos, Source::Entra],
    fields: &[
        "Intune.serialNumber",
        "KACE.Bios_serial_number",
        "Sophos.serialNumber",
        "Entra.SerialNumber",
    ],
};

pub const PRIMARY_USER: AttributeRule = AttributeRule {
    sources: &[Source::Intune, Source::Kace, Source::Sophos, Source::Entra, Source::Ad],
    fields: &[
        "Intune.userPrincipalName",
        "Intune.userDisplayName",
        "KACE.User",
        "KACE.User_fullname",
        "Sophos.associatedPerson.viaLogin",
        "Sophos.associatedPerson.name",
        "Entra.RegisteredOwners",
        "AD.ManagedBy",
    ],
};

pub const LOCATION: AttributeRule = AttributeRule {
    sources: &[Source::Kace, Source::Ad, Source::Intune],
    fields: &["KACE.Location", "AD.Location", "Intune.deviceCategory"],
};

pub const LAST_SEEN: AttributeRule = AttributeRule {
    sources: &[Source::Sophos, Source::Intune, Source::Entra, Source::Kace, Source::Ad],
    fields: &[
        "Sophos.lastSeenAt",
        "Intune.lastSyncDateTime",
        "Entra.ApproximateLastSignInDateTime",
        "KACE.Last_inventory",
        "AD.LastLogonDate",
    ],
};

/// Serial number plus the descriptive attributes of one key. An attribute
/// that fails to resolve stays unset and its error is returned alongside.
pub fn resolve_attributes(
    view: &KeyView<'_>,
) -> (Option<String>, DeviceAttributes, Vec<MergeError>) {
    let mut failures = Vec::new();
    let mut resolve_rule = |rule: &AttributeRule| {
        rule.resolve(view).unwrap_or_else(|err| {
            failures.push(err);
            None
        })
    };

    let serial_number = resolve_rule(&SERIAL_NUMBER);
    let attributes = DeviceAttributes {
        device_type: resolve_rule(&DEVICE_TYPE),
        os: resolve_rule(&OS),
        primary_user: resolve_rule(&PRIMARY_USER),
        location: resolve_rule(&LOCATION),
        last_seen: resolve_rule(&LAST_SEEN),
    };
    (serial_number, attributes, failures)
}
