//! Shared data types for discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default scan window for classic inquiry.
pub const DEFAULT_CLASSIC_TIMEOUT: Duration = Duration::from_secs(8);

/// Default scan window for BLE discovery.
pub const DEFAULT_LE_TIMEOUT: Duration = Duration::from_secs(2);

/// Which discovery procedure a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// BR/EDR inquiry
    Classic,
    /// BLE advertisement scan
    LowEnergy,
}

impl ScanMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            ScanMode::Classic => "Classic",
            ScanMode::LowEnergy => "BLE",
        }
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            ScanMode::Classic => DEFAULT_CLASSIC_TIMEOUT,
            ScanMode::LowEnergy => DEFAULT_LE_TIMEOUT,
        }
    }
}

/// One raw result reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rssi: Option<i16>,
}

impl Observation {
    pub fn new(address: impl Into<String>, name: Option<&str>, rssi: Option<i16>) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            rssi,
        }
    }
}

/// A discovered device. Identity is the address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub address: String,
    pub name: Option<String>,
    pub rssi: Option<i16>,
    pub last_seen: DateTime<Utc>,
    pub observations: u32,
}

impl DeviceRecord {
    /// Name for display, with a placeholder when it was never resolved.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unknown)")
    }
}

/// Parameters of one discovery call.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryOptions {
    pub mode: ScanMode,
    pub timeout: Duration,
    pub resolve_names: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            mode: ScanMode::LowEnergy,
            timeout: Duration::from_secs(8),
            resolve_names: true,
        }
    }
}

impl DiscoveryOptions {
    /// Options for `mode` using that mode's default window.
    pub fn for_mode(mode: ScanMode) -> Self {
        Self {
            mode,
            timeout: mode.default_timeout(),
            resolve_names: true,
        }
    }

    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout from fractional seconds.
    ///
    /// Values that cannot form a duration (zero, negative, NaN) become a zero
    /// timeout, which the session then rejects.
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        self
    }

    pub fn resolve_names(mut self, resolve: bool) -> Self {
        self.resolve_names = resolve;
        self
    }
}

/// Normalize a hardware address for use as a registry key.
///
/// Returns `None` for addresses that are not colon or dash separated hex
/// octets.
pub fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let octets: Vec<&str> = trimmed.split([':', '-']).collect();
    if octets.len() < 2 {
        return None;
    }

    let valid = octets
        .iter()
        .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return None;
    }

    Some(
        octets
            .iter()
            .map(|o| o.to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(":"),
    )
}
