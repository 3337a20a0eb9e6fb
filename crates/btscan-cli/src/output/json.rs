//! JSON-formatted output for CLI.

use serde::Serialize;
use serde_json::{json, Value};

use super::{OutputFormatter, ScanReport};

pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn format_scans(&self, scans: &[ScanReport]) -> String {
        let items: Vec<Value> = scans
            .iter()
            .map(|scan| {
                json!({
                    "mode": scan.mode,
                    "devices": scan.devices,
                    "count": scan.devices.len()
                })
            })
            .collect();
        let total: usize = scans.iter().map(|s| s.devices.len()).sum();

        Self::to_json(&json!({
            "scans": items,
            "count": total,
            "generatedAt": chrono::Utc::now().to_rfc3339()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_record;
    use btscan_core::ScanMode;

    #[test]
    fn test_json_structure() {
        let output = JsonOutput::new().format_scans(&[
            ScanReport {
                mode: ScanMode::Classic,
                devices: vec![test_record("AA:AA:AA:AA:AA:01", Some("Phone"))],
            },
            ScanReport {
                mode: ScanMode::LowEnergy,
                devices: vec![test_record("BB:BB:BB:BB:BB:02", None)],
            },
        ]);

        let value: Value = serde_json::from_str(&output).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["count", "generatedAt", "scans"]);
        assert!(chrono::DateTime::parse_from_rfc3339(value["generatedAt"].as_str().unwrap()).is_ok());

        assert_eq!(value["count"], 2);
        assert_eq!(value["scans"][0]["count"], 1);
        assert_eq!(value["scans"][0]["mode"], "classic");
        assert_eq!(value["scans"][0]["devices"][0]["name"], "Phone");
        assert_eq!(value["scans"][1]["mode"], "low_energy");
        assert!(value["scans"][1]["devices"][0]["name"].is_null());
        assert_eq!(value["scans"][1]["devices"][0]["observations"], 1);
    }
}
