//! Loading recorded scans for replay.
//!
//! A replay file is either a JSON array of entries, or an object recording
//! the scan mode next to them: `{"mode": "classic", "steps": [..]}`. Entries
//! are plain observations (`{"address": "..", "name": "..", "rssi": -40}`) or
//! script steps tagged with `"step"` (`observe`, `wait`, `fail`).

use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::adapter::{ScriptStep, ScriptedAdapter};
use crate::error::ReplayError;
use crate::types::{Observation, ScanMode};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptEntry {
    Step(ScriptStep),
    Observation(Observation),
}

impl From<ScriptEntry> for ScriptStep {
    fn from(entry: ScriptEntry) -> Self {
        match entry {
            ScriptEntry::Step(step) => step,
            ScriptEntry::Observation(observation) => ScriptStep::Observe(observation),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayFile {
    Entries(Vec<ScriptEntry>),
    Recorded {
        mode: Option<ScanMode>,
        steps: Vec<ScriptEntry>,
    },
}

/// A recorded scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayScript {
    /// Procedure the scan was recorded with, when the file says so.
    pub mode: Option<ScanMode>,
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    /// Adapter replaying this script.
    pub fn adapter(&self) -> ScriptedAdapter {
        let adapter = ScriptedAdapter::new(self.steps.clone());
        match self.mode {
            Some(mode) => adapter.with_mode(mode),
            None => adapter,
        }
    }
}

/// Parse replay JSON.
pub fn parse_script(content: &str) -> Result<ReplayScript, serde_json::Error> {
    let (mode, entries) = match serde_json::from_str(content)? {
        ReplayFile::Entries(entries) => (None, entries),
        ReplayFile::Recorded { mode, steps } => (mode, steps),
    };

    Ok(ReplayScript {
        mode,
        steps: entries.into_iter().map(ScriptStep::from).collect(),
    })
}

/// Read a replay file.
pub async fn load_script(path: impl AsRef<Path>) -> Result<ReplayScript, ReplayError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ReplayError::Read {
            path: path.display().to_string(),
            source,
        })?;

    parse_script(&content).map_err(|source| ReplayError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Build an adapter replaying the file at `path`.
pub async fn load_adapter(path: impl AsRef<Path>) -> Result<ScriptedAdapter, ReplayError> {
    Ok(load_script(path).await?.adapter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ScanAdapter;
    use crate::error::ErrorKind;
    use crate::session::discover;

    #[test]
    fn test_parse_mixed_entries() {
        let script = parse_script(
            r#"[
                {"address": "AA:AA:AA:AA:AA:01", "name": "Phone", "rssi": -40},
                {"step": "wait", "millis": 100},
                {"address": "BB:BB:BB:BB:BB:02"},
                {"step": "fail", "kind": "Timeout", "message": "radio reset"}
            ]"#,
        )
        .unwrap();
        let steps = &script.steps;

        assert_eq!(script.mode, None);
        assert_eq!(steps.len(), 4);
        assert_eq!(
            steps[0],
            ScriptStep::Observe(Observation::new("AA:AA:AA:AA:AA:01", Some("Phone"), Some(-40)))
        );
        assert_eq!(steps[1], ScriptStep::Wait { millis: 100 });
        assert!(matches!(steps[3], ScriptStep::Fail { kind: ErrorKind::Timeout, .. }));
    }

    #[test]
    fn test_parse_recorded_mode() {
        let script = parse_script(
            r#"{
                "mode": "classic",
                "steps": [{"address": "AA:AA:AA:AA:AA:01", "name": "Headset"}]
            }"#,
        )
        .unwrap();

        assert_eq!(script.mode, Some(ScanMode::Classic));
        assert_eq!(script.steps.len(), 1);
        assert_eq!(script.adapter().mode(), Some(ScanMode::Classic));
    }

    #[test]
    fn test_parse_rejects_single_observation() {
        assert!(parse_script(r#"{"address": "AA:AA:AA:AA:AA:01"}"#).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_script(dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, ReplayError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_script(&path).await.unwrap_err();
        assert!(matches!(err, ReplayError::Parse { .. }));
        assert!(err.to_string().contains("scan.json"));
    }

    #[tokio::test]
    async fn test_replayed_scan_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(
            &path,
            r#"[
                {"address": "aa:aa:aa:aa:aa:01", "name": "Phone", "rssi": -40},
                {"address": "BB:BB:BB:BB:BB:02", "rssi": -70},
                {"address": "AA:AA:AA:AA:AA:01", "name": "Phone", "rssi": -38}
            ]"#,
        )
        .unwrap();

        let mut adapter = load_adapter(&path).await.unwrap();
        let records = discover(&mut adapter, 2.0, true).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, "AA:AA:AA:AA:AA:01");
        assert_eq!(records[0].rssi, Some(-38));
        assert_eq!(records[1].name, None);
    }
}
