#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use devicescope::flatten::{flatten, FlattenOptions};
use devicescope::models::{FlatRecord, MergedDevice, Source};

/// Flatten a JSON array of raw payloads for one source
pub fn records(source: Source, payloads: Value) -> Vec<FlatRecord> {
    let options = FlattenOptions::default();
    payloads
        .as_array()
        .map(|items| items.iter().map(|item| flatten(item, source, &options)).collect())
        .unwrap_or_default()
}

/// Find a merged device by its name key
pub fn device<'a>(devices: &'a [MergedDevice], name: &str) -> &'a MergedDevice {
    devices
        .iter()
        .find(|d| d.name.as_str() == name)
        .unwrap_or_else(|| panic!("device {} not in merge output", name))
}

/// Temporary directory holding per-source export files
pub struct ExportDir {
    pub temp_dir: TempDir,
}

impl ExportDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a JSON export and return its path
    pub fn write(&self, file_name: &str, contents: &Value) -> PathBuf {
        let path = self.temp_dir.path().join(file_name);
        fs::write(&path, serde_json::to_string_pretty(contents).expect("serialize fixture"))
            .expect("write fixture");
        path
    }

    pub fn write_raw(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(file_name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    /// The standard fixture: a small fleet spread over all five sources
    pub fn with_fleet() -> Self {
        let dir = Self::new();
        dir.write(
            "Entra.json",
            &serde_json::json!({
                "value": [
                    {"DisplayName": "LAPTOP-042", "DeviceId": "11111111-1111-1111-1111-111111111111",
                     "TrustType": "AzureAd", "OperatingSystem": "Windows"},
                    {"DisplayName": "WKS01", "DeviceId": "22222222-2222-2222-2222-222222222222",
                     "TrustType": "ServerAd", "OperatingSystem": "Windows"},
                    {"DisplayName": "WKS01", "DeviceId": "33333333-3333-3333-3333-333333333333",
                     "TrustType": "Workplace", "OperatingSystem": "Windows"}
                ]
            }),
        );
        dir.write(
            "Intune.json",
            &serde_json::json!([
                {"deviceName": "laptop-042.corp.local", "operatingSystem": "Windows 11 Pro",
                 "chassisType": "laptop", "azureADDeviceId": "11111111-1111-1111-1111-111111111111",
                 "serialNumber": "SN-042"}
            ]),
        );
        dir.write(
            "AD.json",
            &serde_json::json!([
                {"Name": "WKS01$", "ObjectGUID": "22222222-2222-2222-2222-222222222222",
                 "OperatingSystem": "Windows 10 Enterprise"}
            ]),
        );
        dir.write(
            "Sophos.json",
            &serde_json::json!({
                "items": [
                    {"id": "s-1", "hostname": "wks01", "health": {"overall": "good"}},
                    {"id": "s-2", "hostname": "WKS01.corp.local", "health": {"overall": "bad"}}
                ]
            }),
        );
        dir.write(
            "KACE.json",
            &serde_json::json!({
                "Machines": [
                    {"Id": 7, "Name": "LAB-PC", "Os_name": "macOS 14", "Ram_total": "16384 MB"}
                ]
            }),
        );
        dir
    }
}

/// The binary under test, isolated from any real user configuration
pub fn devicescope(config_home: &Path) -> Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("devicescope");
    cmd.env("XDG_CONFIG_HOME", config_home).env("HOME", config_home);
    cmd
}
