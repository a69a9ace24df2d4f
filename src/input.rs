//! Source export loading and discovery module
//!
//! Responsible for:
//! - Locating the newest export file per source in a directory
//! - Reading an export and unwrapping the array it carries
//! - Flattening every element with the source prefix
//!
//! A source without an export file contributes an empty record list.

use glob::MatchOptions;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::constants::PAYLOAD_ARRAY_KEYS;
use crate::flatten::{flatten, FlattenOptions};
use crate::models::{FlatRecord, InputError, Source, SourceRecords};

/// Export file per source; `None` means the source is absent from this run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    /// Directory searched for exports not named explicitly
    pub input_dir: Option<PathBuf>,
    pub entra: Option<PathBuf>,
    pub intune: Option<PathBuf>,
    pub ad: Option<PathBuf>,
    pub sophos: Option<PathBuf>,
    pub kace: Option<PathBuf>,
}

impl SourcePaths {
    pub fn get(&self, source: Source) -> Option<&Path> {
        match source {
            Source::Entra => self.entra.as_deref(),
            Source::Intune => self.intune.as_deref(),
            Source::Ad => self.ad.as_deref(),
            Source::Sophos => self.sophos.as_deref(),
            Source::Kace => self.kace.as_deref(),
        }
    }

    pub fn set(&mut self, source: Source, path: Option<PathBuf>) {
        match source {
            Source::Entra => self.entra = path,
            Source::Intune => self.intune = path,
            Source::Ad => self.ad = path,
            Source::Sophos => self.sophos = path,
            Source::Kace => self.kace = path,
        }
    }

    /// Take every value set in `overrides`, keeping ours where it is unset
    pub fn overlay(&mut self, overrides: &SourcePaths) {
        if overrides.input_dir.is_some() {
            self.input_dir = overrides.input_dir.clone();
        }
        for source in Source::ALL {
            if let Some(path) = overrides.get(source) {
                self.set(source, Some(path.to_path_buf()));
            }
        }
    }

    /// Fill sources without an explicit file from `input_dir`, if one is set
    pub fn resolve(&self) -> SourcePaths {
        let mut resolved = self.clone();
        if let Some(dir) = &self.input_dir {
            let discovered = discover_source_files(dir);
            for source in Source::ALL {
                if resolved.get(source).is_none() {
                    resolved.set(source, discovered.get(source).map(Path::to_path_buf));
                }
            }
        }
        resolved
    }

    /// Number of sources with an export file
    pub fn configured(&self) -> usize {
        Source::ALL.iter().filter(|s| self.get(**s).is_some()).count()
    }
}

/// Find the newest `<prefix>*.json` export of every source in `dir`
pub fn discover_source_files(dir: &Path) -> SourcePaths {
    let mut found = SourcePaths {
        input_dir: Some(dir.to_path_buf()),
        ..Default::default()
    };
    for source in Source::ALL {
        found.set(source, newest_export(dir, source));
    }
    found
}

fn newest_export(dir: &Path, source: Source) -> Option<PathBuf> {
    let pattern = format!(
        "{}/{}*.json",
        glob::Pattern::escape(&dir.to_string_lossy()),
        source.prefix()
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };

    let entries = match glob::glob_with(&pattern, options) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot search {} for {} exports: {}", dir.display(), source, e);
            return None;
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .max_by_key(|path| {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path.clone())
        })
}

/// Extract the device elements from a parsed export
fn payload_items(value: &Value) -> Result<Vec<&Value>, &'static str> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(map) => {
            let wrapped = PAYLOAD_ARRAY_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array));
            match wrapped {
                Some(items) => Ok(items.iter().collect()),
                None => Ok(vec![value]),
            }
        }
        Value::Null => Ok(Vec::new()),
        Value::Bool(_) => Err("boolean"),
        Value::Number(_) => Err("number"),
        Value::String(_) => Err("string"),
    }
}

/// Flatten every device element of an already-parsed export
pub fn records_from_value(
    value: &Value,
    source: Source,
    options: &FlattenOptions,
    path: &Path,
) -> Result<Vec<FlatRecord>, InputError> {
    let items = payload_items(value).map_err(|found| InputError::UnsupportedShape {
        path: path.to_path_buf(),
        found,
    })?;
    Ok(items
        .into_iter()
        .map(|item| flatten(item, source, options))
        .collect())
}

/// Read and flatten one source export
pub fn load_source_file(
    path: &Path,
    source: Source,
    options: &FlattenOptions,
) -> Result<Vec<FlatRecord>, InputError> {
    let text = fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Windows PowerShell writes UTF-8 with a byte order mark
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        debug!("{} export {} is empty", source, path.display());
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text).map_err(|e| InputError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let records = records_from_value(&value, source, options, path)?;
    debug!("Loaded {} {} records from {}", records.len(), source, path.display());
    Ok(records)
}

/// Load every configured source; unconfigured sources stay empty
pub fn load_sources(
    paths: &SourcePaths,
    options: &FlattenOptions,
) -> Result<SourceRecords, InputError> {
    let mut records = SourceRecords::default();
    for source in Source::ALL {
        match paths.get(source) {
            Some(path) => records.set(source, load_source_file(path, source, options)?),
            None => info!("No {} export configured; treating the source as empty", source),
        }
    }
    Ok(records)
}
