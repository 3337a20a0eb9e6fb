//! Line-oriented output: one `address - name` line per device.

use super::{OutputFormatter, ScanReport};

pub struct PlainOutput;

impl PlainOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for PlainOutput {
    fn format_scans(&self, scans: &[ScanReport]) -> String {
        let with_headers = scans.len() > 1;
        let mut lines = Vec::new();

        for scan in scans {
            if with_headers {
                lines.push(format!("[{}]", scan.mode.display_name()));
            }
            for device in &scan.devices {
                lines.push(format!("{} - {}", device.address, device.display_name()));
            }
            lines.push(format!("Found {} devices.", scan.devices.len()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_record as record;
    use btscan_core::ScanMode;

    #[test]
    fn test_single_scan_lines() {
        let output = PlainOutput::new().format_scans(&[ScanReport {
            mode: ScanMode::Classic,
            devices: vec![
                record("AA:AA:AA:AA:AA:01", Some("Phone")),
                record("BB:BB:BB:BB:BB:02", None),
            ],
        }]);

        assert_eq!(
            output,
            "AA:AA:AA:AA:AA:01 - Phone\nBB:BB:BB:BB:BB:02 - (unknown)\nFound 2 devices."
        );
    }

    #[test]
    fn test_empty_scan_prints_count() {
        let output = PlainOutput::new().format_scans(&[ScanReport {
            mode: ScanMode::LowEnergy,
            devices: vec![],
        }]);
        assert_eq!(output, "Found 0 devices.");
    }

    #[test]
    fn test_multiple_scans_get_headers() {
        let output = PlainOutput::new().format_scans(&[
            ScanReport {
                mode: ScanMode::Classic,
                devices: vec![record("AA:AA:AA:AA:AA:01", Some("Phone"))],
            },
            ScanReport {
                mode: ScanMode::LowEnergy,
                devices: vec![],
            },
        ]);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[Classic]",
                "AA:AA:AA:AA:AA:01 - Phone",
                "Found 1 devices.",
                "[BLE]",
                "Found 0 devices."
            ]
        );
    }
}
