//! Table-formatted output for CLI.

use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use super::{OutputFormatter, ScanReport};

pub struct TableOutput;

impl TableOutput {
    pub fn new() -> Self {
        Self
    }

    fn rssi_cell(rssi: Option<i16>) -> Cell {
        match rssi {
            Some(v) if v >= -60 => Cell::new(format!("{} dBm", v)).fg(Color::Green),
            Some(v) if v >= -80 => Cell::new(format!("{} dBm", v)).fg(Color::Yellow),
            Some(v) => Cell::new(format!("{} dBm", v)).fg(Color::Red),
            None => Cell::new("N/A"),
        }
    }
}

impl Default for TableOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TableOutput {
    fn format_scans(&self, scans: &[ScanReport]) -> String {
        let mut sections = Vec::new();

        for scan in scans {
            let title = format!("{} scan", scan.mode.display_name()).bold();

            if scan.devices.is_empty() {
                sections.push(format!("{}\nNo devices found.", title));
                continue;
            }

            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["Address", "Name", "RSSI", "Seen"]);

            for device in &scan.devices {
                table.add_row(vec![
                    Cell::new(&device.address),
                    Cell::new(device.display_name()),
                    Self::rssi_cell(device.rssi),
                    Cell::new(device.observations.to_string()),
                ]);
            }

            sections.push(format!(
                "{}\n{}\n\nFound {} device(s)",
                title,
                table,
                scan.devices.len()
            ));
        }

        sections.join("\n\n")
    }
}
