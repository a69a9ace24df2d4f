//! Degraded keys are reported once, by the run-level event helper

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::HashMap;
use std::sync::Mutex;

use devicescope::logging::log_degraded_devices;
use devicescope::merge::{merge, MergeOptions};
use devicescope::models::{FieldValue, FlatRecord, Source, SourceRecords};

struct CaptureLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

fn mentions(name: &str) -> Vec<(Level, String)> {
    CAPTURE
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, line)| line.contains(name))
        .cloned()
        .collect()
}

#[test]
fn test_degraded_key_is_warned_once() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let mut fields = HashMap::new();
    fields.insert("Entra.DisplayName".to_string(), FieldValue::from("OMEGA"));
    fields.insert(
        "Entra.DeviceId".to_string(),
        FieldValue::List(vec![FieldValue::from("x"), FieldValue::from("y")]),
    );
    let mut sources = SourceRecords::default();
    sources.entra.push(FlatRecord::new(Source::Entra, fields));

    let devices = merge(&sources, &MergeOptions::default());
    assert!(devices[0].is_degraded());
    assert!(mentions("OMEGA").is_empty());

    log_degraded_devices(&devices);
    let lines = mentions("OMEGA");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, Level::Warn);
    assert!(lines[0].1.contains("key_degraded"));
}
