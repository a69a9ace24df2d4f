//! devicescope - device inventory reconciliation library
//!
//! Merges per-source device exports (Entra ID, Intune, Active Directory,
//! Sophos Central, KACE) into one record per physical device, keyed by a
//! normalized device name, with presence, duplication diagnostics and
//! reconciled attributes.

#![forbid(unsafe_code)]

pub mod config;
pub mod constants;
pub mod filter;
pub mod flatten;
pub mod index;
pub mod input;
pub mod logging;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod report;
pub mod resolve;
