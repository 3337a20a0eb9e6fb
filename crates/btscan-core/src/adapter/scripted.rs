//! Adapter that replays a scripted sequence of observations.
//!
//! Used by tests and by replay runs without a radio.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use super::ScanAdapter;
use crate::error::{DiscoveryError, ErrorKind, Result};
use crate::types::{Observation, ScanMode};

/// One step of a scan script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Report an observation.
    Observe(Observation),
    /// Stay silent for a while.
    Wait { millis: u64 },
    /// Fail the scan with a platform error.
    Fail { kind: ErrorKind, message: String },
}

/// Fake adapter replaying a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedAdapter {
    steps: VecDeque<ScriptStep>,
    open_error: Option<DiscoveryError>,
    start_error: Option<DiscoveryError>,
    mode: Option<ScanMode>,
    hold_when_done: bool,
    resolve_names: bool,
    is_open: bool,
    scanning: bool,
    open_calls: usize,
    close_calls: usize,
    stop_calls: usize,
}

impl ScriptedAdapter {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            resolve_names: true,
            ..Self::default()
        }
    }

    /// Script made only of observations.
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self::new(observations.into_iter().map(ScriptStep::Observe))
    }

    /// Adapter whose `open` fails with `error`.
    pub fn failing_open(error: DiscoveryError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::new(Vec::<ScriptStep>::new())
        }
    }

    /// Adapter that opens but whose `start_scan` fails with `error`.
    pub fn failing_start(error: DiscoveryError) -> Self {
        Self {
            start_error: Some(error),
            ..Self::new(Vec::<ScriptStep>::new())
        }
    }

    /// Report `mode` as the procedure this script was recorded with.
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Keep the scan running silently after the script is exhausted instead
    /// of ending it, like a radio that simply finds nothing more.
    pub fn hold_when_done(mut self) -> Self {
        self.hold_when_done = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls
    }

    /// Steps not yet replayed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl ScanAdapter for ScriptedAdapter {
    fn open(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.open_calls += 1;
            if let Some(err) = self.open_error.clone() {
                return Err(err);
            }
            if self.is_open {
                return Err(DiscoveryError::InvalidArgument(
                    "adapter already open".to_string(),
                ));
            }
            self.is_open = true;
            Ok(())
        })
    }

    fn start_scan(&mut self, resolve_names: bool) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if !self.is_open {
                return Err(DiscoveryError::AdapterUnavailable(
                    "adapter not open".to_string(),
                ));
            }
            if let Some(err) = self.start_error.clone() {
                return Err(err);
            }
            self.resolve_names = resolve_names;
            self.scanning = true;
            Ok(())
        })
    }

    fn next_observation(&mut self) -> BoxFuture<'_, Result<Option<Observation>>> {
        Box::pin(async move {
            loop {
                match self.steps.pop_front() {
                    Some(ScriptStep::Observe(mut observation)) => {
                        if !self.resolve_names {
                            observation.name = None;
                        }
                        return Ok(Some(observation));
                    }
                    Some(ScriptStep::Wait { millis }) => {
                        tokio::time::sleep(Duration::from_millis(millis)).await;
                    }
                    Some(ScriptStep::Fail { kind, message }) => {
                        return Err(kind.into_error(message));
                    }
                    None if self.hold_when_done => {
                        std::future::pending::<()>().await;
                    }
                    None => return Ok(None),
                }
            }
        })
    }

    fn stop_scan(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.stop_calls += 1;
            self.scanning = false;
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.close_calls += 1;
            self.scanning = false;
            self.is_open = false;
        })
    }

    fn mode(&self) -> Option<ScanMode> {
        self.mode
    }
}
