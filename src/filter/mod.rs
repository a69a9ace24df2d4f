//! Device filtering module
//!
//! Narrows a merged inventory down to a source context, attribute values
//! and duplicate status, mirroring the selectors of the inventory dashboard.

pub mod pattern_matcher;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{MergedDevice, Source};

use pattern_matcher::{validate_value_filters, value_matches_filters};

/// Which sources a device must be present in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextFilter {
    Source(Source),
    AllSources,
}

impl FromStr for ContextFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(ContextFilter::AllSources)
        } else {
            s.parse::<Source>().map(ContextFilter::Source)
        }
    }
}

impl fmt::Display for ContextFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextFilter::Source(source) => write!(f, "{}", source),
            ContextFilter::AllSources => f.write_str("all"),
        }
    }
}

/// Selection by `MultiInstanceFlag`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateFilter {
    #[default]
    All,
    /// Only devices with more than one instance in some source
    Only,
    /// Only devices with a single instance everywhere
    Exclude,
}

impl FromStr for DuplicateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(DuplicateFilter::All),
            "only" => Ok(DuplicateFilter::Only),
            "none" | "exclude" => Ok(DuplicateFilter::Exclude),
            other => Err(format!(
                "unknown duplicate filter '{}' (expected all, only or none)",
                other
            )),
        }
    }
}

/// Criteria applied to merged devices; all criteria must hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub context: Option<ContextFilter>,
    /// With a single-source context, require that no other source reports the device
    pub exclusive: bool,
    pub device_types: Vec<String>,
    pub operating_systems: Vec<String>,
    pub duplicates: DuplicateFilter,
}

impl DeviceFilter {
    /// Reject malformed glob patterns before any device is inspected
    pub fn validate(&self) -> Result<()> {
        validate_value_filters(&self.device_types)?;
        validate_value_filters(&self.operating_systems)?;
        if self.exclusive && !matches!(self.context, Some(ContextFilter::Source(_))) {
            return Err(anyhow!(
                "Exclusive filtering requires a single-source context"
            ));
        }
        Ok(())
    }

    fn matches_context(&self, device: &MergedDevice) -> bool {
        match self.context {
            None => true,
            Some(ContextFilter::AllSources) => device.presence.count() == Source::ALL.len(),
            Some(ContextFilter::Source(source)) => {
                device.presence.contains(source)
                    && (!self.exclusive || device.presence.count() == 1)
            }
        }
    }

    fn matches_duplicates(&self, device: &MergedDevice) -> bool {
        match self.duplicates {
            DuplicateFilter::All => true,
            DuplicateFilter::Only => device.multi_instance,
            DuplicateFilter::Exclude => !device.multi_instance,
        }
    }

    pub fn matches(&self, device: &MergedDevice) -> bool {
        self.matches_context(device)
            && value_matches_filters(device.attributes.device_type.as_deref(), &self.device_types)
            && value_matches_filters(device.attributes.os.as_deref(), &self.operating_systems)
            && self.matches_duplicates(device)
    }

    /// Devices passing every criterion, in input order
    pub fn apply<'a>(&self, devices: &'a [MergedDevice]) -> Vec<&'a MergedDevice> {
        devices.iter().filter(|d| self.matches(d)).collect()
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.context.is_none()
            && self.device_types.is_empty()
            && self.operating_systems.is_empty()
            && self.duplicates == DuplicateFilter::All
    }
}
