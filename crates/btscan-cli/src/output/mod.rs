//! Output formatting for CLI results.

pub mod json;
pub mod plain;
pub mod table;

pub use json::JsonOutput;
pub use plain::PlainOutput;
pub use table::TableOutput;

use btscan_core::{DeviceRecord, ScanMode};

use crate::cli::FormatArg;

/// Result of one discovery procedure.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub mode: ScanMode,
    pub devices: Vec<DeviceRecord>,
}

/// Output formatter trait
pub trait OutputFormatter {
    /// Format the results of every scan that ran
    fn format_scans(&self, scans: &[ScanReport]) -> String;
}

/// Get the formatter for the requested format; `--json` wins over `--format`.
pub fn get_formatter(format: FormatArg, json: bool) -> Box<dyn OutputFormatter> {
    match (format, json) {
        (_, true) | (FormatArg::Json, _) => Box::new(JsonOutput::new()),
        (FormatArg::Table, false) => Box::new(TableOutput::new()),
        (FormatArg::Plain, false) => Box::new(PlainOutput::new()),
    }
}

#[cfg(test)]
pub(crate) fn test_record(address: &str, name: Option<&str>) -> DeviceRecord {
    DeviceRecord {
        address: address.to_string(),
        name: name.map(str::to_string),
        rssi: None,
        last_seen: chrono::Utc::now(),
        observations: 1,
    }
}
