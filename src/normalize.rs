//! Join-key normalization
//!
//! Each source is bound to one strategy (see [`Source::key_strategy`]):
//! hostname-bearing sources reduce FQDNs to their host label, while Entra
//! display names keep their dots because they are free-form.
//!
//! [`Source::key_strategy`]: crate::models::Source::key_strategy

use crate::models::{KeyStrategy, NameKey};

/// Normalize a raw name with the given strategy
pub fn normalize(strategy: KeyStrategy, raw: &str) -> Option<NameKey> {
    match strategy {
        KeyStrategy::ComputerName => normalize_computer_name(raw),
        KeyStrategy::DisplayName => normalize_display_name(raw),
    }
}

/// Hostname-style key: `wks01.corp.local`, `WKS01$` and `wks01` all map to `WKS01`.
///
/// Every trailing `$` is dropped, both from the whole name and again from
/// the host label of an FQDN, so `WKS01$$` and `HOST$.corp` map to `WKS01`
/// and `HOST`. This keeps the key stable when it is normalized again.
///
/// A name containing whitespace is never treated as an FQDN.
pub fn normalize_computer_name(raw: &str) -> Option<NameKey> {
    let name = strip_account_suffix(raw).to_uppercase();
    if name.is_empty() {
        return None;
    }

    if name.contains('.') && !name.chars().any(char::is_whitespace) {
        let host = name.split('.').next().unwrap_or_default();
        return NameKey::new(strip_account_suffix(host));
    }

    NameKey::new(name)
}

/// Display-name-style key: uppercased and trimmed, dots preserved
pub fn normalize_display_name(raw: &str) -> Option<NameKey> {
    NameKey::new(strip_account_suffix(raw).to_uppercase())
}

/// Trim and drop the `$` machine-account suffix
fn strip_account_suffix(raw: &str) -> &str {
    raw.trim().trim_end_matches('$').trim_end()
}
