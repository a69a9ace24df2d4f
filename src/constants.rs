//! Global constants for devicescope
//!
//! Centralized location for application-wide constants

/// Application identifier, also the config directory name
pub const APP_NAME: &str = "devicescope";

/// Config file name inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Separator used when several values are folded into one display string
pub const LIST_SEPARATOR: &str = "; ";

/// Separator for the human-readable list of present sources
pub const CONTEXT_SEPARATOR: &str = " | ";

/// Property names probed, in order, when a map value has to be shown as text
pub const DISPLAY_PROBE_KEYS: &[&str] = &[
    "displayName",
    "name",
    "categoryDisplayName",
    "deviceCategoryDisplayName",
    "title",
    "label",
    "value",
    "id",
    "type",
];

/// Entra trust type reported for hybrid-joined devices
pub const ENTRA_TRUST_HYBRID: &str = "ServerAd";

/// Entra trust type reported for workplace-registered devices
pub const ENTRA_TRUST_REGISTERED: &str = "Workplace";

/// Wrapper properties that hold the device array in API responses
pub const PAYLOAD_ARRAY_KEYS: &[&str] = &["value", "items", "Machines"];
