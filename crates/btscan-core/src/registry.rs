//! Insertion-ordered record mapping keyed by device address.

use chrono::Utc;
use std::collections::HashMap;

use crate::types::{normalize_address, DeviceRecord, Observation};

/// What merging one observation did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First sighting of the address.
    Inserted,
    /// Known address, name or rssi changed.
    Updated,
    /// Known address, nothing new.
    Unchanged,
    /// Address could not be parsed.
    Rejected,
}

/// Discovered devices of one session.
///
/// Holds at most one record per normalized address; records stay in the
/// order their address was first observed.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    records: Vec<DeviceRecord>,
    index: HashMap<String, usize>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a raw observation.
    ///
    /// A present name or rssi replaces the stored one; an absent field keeps
    /// what was seen earlier.
    pub fn merge(&mut self, observation: Observation) -> MergeOutcome {
        let Some(address) = normalize_address(&observation.address) else {
            return MergeOutcome::Rejected;
        };
        let name = observation.name.filter(|n| !n.trim().is_empty());
        let now = Utc::now();

        if let Some(&pos) = self.index.get(&address) {
            let record = &mut self.records[pos];
            let mut changed = false;

            if name.is_some() && record.name != name {
                record.name = name;
                changed = true;
            }
            if observation.rssi.is_some() && record.rssi != observation.rssi {
                record.rssi = observation.rssi;
                changed = true;
            }
            record.last_seen = now;
            record.observations = record.observations.saturating_add(1);

            return if changed {
                MergeOutcome::Updated
            } else {
                MergeOutcome::Unchanged
            };
        }

        self.index.insert(address.clone(), self.records.len());
        self.records.push(DeviceRecord {
            address,
            name,
            rssi: observation.rssi,
            last_seen: now,
            observations: 1,
        });
        MergeOutcome::Inserted
    }

    /// Look up a record by address in any accepted spelling.
    pub fn get(&self, address: &str) -> Option<&DeviceRecord> {
        let key = normalize_address(address)?;
        self.index.get(&key).map(|&pos| &self.records[pos])
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DeviceRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const A: &str = "AA:AA:AA:AA:AA:01";
    const B: &str = "BB:BB:BB:BB:BB:02";
    const C: &str = "CC:CC:CC:CC:CC:03";

    fn obs(address: &str, name: Option<&str>, rssi: Option<i16>) -> Observation {
        Observation::new(address, name, rssi)
    }

    fn addresses(registry: &DeviceRegistry) -> Vec<&str> {
        registry.records().iter().map(|r| r.address.as_str()).collect()
    }

    #[test]
    fn test_scenario_phone_reobserved() {
        let mut registry = DeviceRegistry::new();
        registry.merge(obs(A, Some("Phone"), Some(-40)));
        registry.merge(obs(B, None, Some(-70)));
        registry.merge(obs(A, Some("Phone"), Some(-38)));

        let records = registry.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, A);
        assert_eq!(records[0].name.as_deref(), Some("Phone"));
        assert_eq!(records[0].rssi, Some(-38));
        assert_eq!(records[0].observations, 2);
        assert_eq!(records[1].address, B);
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].rssi, Some(-70));
    }

    #[test]
    fn test_no_duplicates_and_first_seen_order() {
        // Deterministic pseudo-random sequences over a small address pool
        let pool = [A, B, C, "DD:DD:DD:DD:DD:04", "ee:ee:ee:ee:ee:05"];
        let mut seed: u32 = 0x2545_f491;

        for _ in 0..50 {
            let mut registry = DeviceRegistry::new();
            let mut expected_order: Vec<String> = Vec::new();

            for _ in 0..40 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let address = pool[(seed % pool.len() as u32) as usize];
                let key = normalize_address(address).unwrap();
                if !expected_order.contains(&key) {
                    expected_order.push(key);
                }
                registry.merge(obs(address, None, Some(-((seed % 90) as i16))));
            }

            let seen: HashSet<&str> = addresses(&registry).into_iter().collect();
            assert_eq!(seen.len(), registry.len());
            assert_eq!(addresses(&registry), expected_order);
        }
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut registry = DeviceRegistry::new();
        registry.merge(obs(A, Some("Old"), None));
        registry.merge(obs(B, Some("Other"), None));
        let outcome = registry.merge(obs(A, Some("New"), None));

        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(addresses(&registry), vec![A, B]);
        assert_eq!(registry.records()[0].name.as_deref(), Some("New"));
    }

    #[test]
    fn test_missing_fields_do_not_erase() {
        let mut registry = DeviceRegistry::new();
        registry.merge(obs(A, Some("Headset"), Some(-55)));
        let outcome = registry.merge(obs(A, None, None));

        assert_eq!(outcome, MergeOutcome::Unchanged);
        let record = registry.get(A).unwrap();
        assert_eq!(record.name.as_deref(), Some("Headset"));
        assert_eq!(record.rssi, Some(-55));
        assert_eq!(record.observations, 2);
    }

    #[test]
    fn test_blank_name_treated_as_absent() {
        let mut registry = DeviceRegistry::new();
        registry.merge(obs(A, Some("Speaker"), None));
        registry.merge(obs(A, Some("  "), None));
        assert_eq!(registry.get(A).unwrap().name.as_deref(), Some("Speaker"));
    }

    #[test]
    fn test_case_insensitive_identity() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.merge(obs("aa:aa:aa:aa:aa:01", None, None)), MergeOutcome::Inserted);
        assert_eq!(registry.merge(obs(A, Some("Watch"), None)), MergeOutcome::Updated);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.records()[0].address, A);
    }

    #[test]
    fn test_rejects_bad_address() {
        let mut registry = DeviceRegistry::new();
        assert_eq!(registry.merge(obs("", Some("Ghost"), None)), MergeOutcome::Rejected);
        assert_eq!(registry.merge(obs("zz:zz", None, None)), MergeOutcome::Rejected);
        assert!(registry.is_empty());
    }
}
